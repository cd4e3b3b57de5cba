// ABOUTME: Workflow executor orchestrating a single run end to end
// ABOUTME: Drives the ready-set loop with semaphore-bounded concurrent task dispatch

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::error::{ExecutionError, Result};
use super::graph::TaskGraph;
use super::registry::{DependencyResults, ExecutorRegistry};
use crate::model::{Task, TaskStatus, Workflow};
use crate::store::WorkflowStore;

/// Default bound on concurrently in-flight tasks per workflow run.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Orchestrates one workflow execution: validates the dependency graph,
/// dispatches runnable tasks under a concurrency bound, records state
/// transitions through the store, and aggregates the final result.
pub struct WorkflowExecutor {
    store: Arc<dyn WorkflowStore>,
    registry: Arc<ExecutorRegistry>,
    max_concurrency: usize,
}

/// Completion signals sent from in-flight workers back to the coordinator.
enum TaskEvent {
    /// The worker holds a semaphore permit and has begun executing.
    Started { task_id: String },
    /// The worker finished; the permit is released after this is sent.
    Finished {
        task_id: String,
        outcome: Result<Value>,
    },
}

impl WorkflowExecutor {
    pub fn new(store: Arc<dyn WorkflowStore>, registry: Arc<ExecutorRegistry>) -> Self {
        Self::with_max_concurrency(store, registry, DEFAULT_MAX_CONCURRENCY)
    }

    pub fn with_max_concurrency(
        store: Arc<dyn WorkflowStore>,
        registry: Arc<ExecutorRegistry>,
        max_concurrency: usize,
    ) -> Self {
        assert!(max_concurrency > 0, "concurrency bound must be at least 1");
        Self {
            store,
            registry,
            max_concurrency,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Execute a workflow to a terminal state and return its aggregate result.
    pub async fn execute(&self, workflow_id: &str) -> Result<Value> {
        self.execute_with_cancellation(workflow_id, CancellationToken::new())
            .await
    }

    /// Execute a workflow, observing the given cancellation token.
    ///
    /// On cancellation, in-flight tasks are allowed to finish (their
    /// executor calls may not be interruptible) but nothing new is
    /// dispatched, and the workflow fails with a cancellation error.
    #[instrument(skip(self, cancel), fields(workflow_id = %workflow_id))]
    pub async fn execute_with_cancellation(
        &self,
        workflow_id: &str,
        cancel: CancellationToken,
    ) -> Result<Value> {
        let mut workflow = self
            .store
            .load_workflow(workflow_id)
            .await?
            .ok_or_else(|| ExecutionError::WorkflowNotFound {
                workflow_id: workflow_id.to_string(),
            })?;

        info!(tasks = workflow.tasks.len(), "starting workflow execution");

        workflow.mark_running();
        self.store.save_workflow(&workflow).await?;

        // Validate the graph before anything is dispatched. A cycle or an
        // unknown dependency fails the whole workflow with no task leaving
        // Pending.
        let validated = TaskGraph::from_workflow(&workflow).and_then(|graph| {
            let ranks = graph.ranks()?;
            Ok((graph, ranks))
        });
        let (graph, ranks) = match validated {
            Ok(pair) => pair,
            Err(err) => {
                error!(%err, "dependency graph validation failed");
                workflow.mark_failed(err.to_string());
                self.store.save_workflow(&workflow).await?;
                return Err(err);
            }
        };

        let order = {
            let mut order: Vec<String> = ranks.keys().cloned().collect();
            order.sort_by_key(|id| ranks[id]);
            order
        };

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let (events_tx, mut events_rx) = mpsc::unbounded_channel::<TaskEvent>();

        let mut dispatched: HashSet<String> = HashSet::new();
        let mut dispatch_order: Vec<String> = Vec::new();
        let mut in_flight = 0usize;
        let mut cancelled = false;

        loop {
            if !cancelled && cancel.is_cancelled() {
                warn!("cancellation observed, no further tasks will be dispatched");
                cancelled = true;
            }

            if !cancelled {
                for task_id in ready_tasks(&workflow, &ranks, &dispatched) {
                    self.dispatch_task(&workflow, &task_id, &semaphore, &events_tx)?;
                    dispatched.insert(task_id.clone());
                    dispatch_order.push(task_id);
                    in_flight += 1;
                }
            }

            if in_flight == 0 {
                // No task is running and nothing further is ready: either
                // the run is finished or blocked tasks remain.
                break;
            }

            let event = if cancelled {
                events_rx.recv().await
            } else {
                tokio::select! {
                    event = events_rx.recv() => event,
                    _ = cancel.cancelled() => continue,
                }
            };

            // Workers hold a sender each, so the channel cannot close while
            // any task is in flight.
            let Some(event) = event else { break };

            match event {
                TaskEvent::Started { task_id } => {
                    let task = workflow
                        .get_task_mut(&task_id)
                        .ok_or_else(|| ExecutionError::TaskNotFound {
                            task_id: task_id.clone(),
                        })?;
                    task.mark_running();
                    let snapshot = task.clone();
                    self.store.save_task(&workflow.id, &snapshot).await?;
                }
                TaskEvent::Finished { task_id, outcome } => {
                    in_flight -= 1;
                    let task = workflow
                        .get_task_mut(&task_id)
                        .ok_or_else(|| ExecutionError::TaskNotFound {
                            task_id: task_id.clone(),
                        })?;
                    match outcome {
                        Ok(result) => {
                            debug!(task_id = %task_id, "task completed");
                            task.mark_completed(result);
                        }
                        Err(err) => {
                            error!(task_id = %task_id, %err, "task failed");
                            task.mark_failed(err.to_string());
                        }
                    }
                    let snapshot = task.clone();
                    self.store.save_task(&workflow.id, &snapshot).await?;
                }
            }
        }

        self.finish(workflow, &graph, &order, &dispatch_order, cancelled)
            .await
    }

    /// Spawn one ready task as an independent unit of concurrent work.
    ///
    /// The worker acquires a semaphore permit before reporting Started, so
    /// at most `max_concurrency` tasks are ever Running at once. The task
    /// itself is mutated only by the coordinator, in response to events.
    fn dispatch_task(
        &self,
        workflow: &Workflow,
        task_id: &str,
        semaphore: &Arc<Semaphore>,
        events_tx: &mpsc::UnboundedSender<TaskEvent>,
    ) -> Result<()> {
        let task = workflow
            .get_task(task_id)
            .ok_or_else(|| ExecutionError::TaskNotFound {
                task_id: task_id.to_string(),
            })?
            .clone();

        let deps = dependency_results(workflow, &task)?;
        let registry = Arc::clone(&self.registry);
        let semaphore = Arc::clone(semaphore);
        let events_tx = events_tx.clone();

        debug!(task_id = %task.id, kind = %task.kind, "dispatching task");

        tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore closed");

            if events_tx
                .send(TaskEvent::Started {
                    task_id: task.id.clone(),
                })
                .is_err()
            {
                return;
            }

            let outcome = registry.execute(&task, &deps).await;

            let _ = events_tx.send(TaskEvent::Finished {
                task_id: task.id,
                outcome,
            });
        });

        Ok(())
    }

    /// Resolve the terminal workflow state once no further progress is
    /// possible: propagate upstream failures, pick the workflow-level error,
    /// or aggregate the final result.
    async fn finish(
        &self,
        mut workflow: Workflow,
        graph: &TaskGraph,
        order: &[String],
        dispatch_order: &[String],
        cancelled: bool,
    ) -> Result<Value> {
        if cancelled && !workflow.all_tasks_terminal() {
            let err = ExecutionError::Cancelled {
                workflow_id: workflow.id.clone(),
            };
            workflow.mark_failed(err.to_string());
            self.store.save_workflow(&workflow).await?;
            return Err(err);
        }

        // Any task still Pending can never become ready: some ancestor
        // failed. Walk in topological order so failures propagate down
        // chains in a single pass.
        for task_id in order {
            let blocked = workflow
                .get_task(task_id)
                .is_some_and(|t| t.status == TaskStatus::Pending);
            if !blocked {
                continue;
            }

            let failed_dep = graph
                .dependencies(task_id)
                .into_iter()
                .find(|dep| workflow.task_status(dep) == Some(TaskStatus::Failed))
                .unwrap_or_else(|| "unknown".to_string());

            let err = ExecutionError::UpstreamFailure {
                task_id: task_id.clone(),
                dependency: failed_dep,
            };
            warn!(task_id = %task_id, %err, "marking blocked task as failed");

            let task = workflow
                .get_task_mut(task_id)
                .ok_or_else(|| ExecutionError::TaskNotFound {
                    task_id: task_id.clone(),
                })?;
            task.mark_blocked(err.to_string());
            let snapshot = task.clone();
            self.store.save_task(&workflow.id, &snapshot).await?;
        }

        // First failure by dispatch order decides the workflow error.
        let first_failure = dispatch_order
            .iter()
            .filter_map(|id| workflow.get_task(id))
            .find(|t| t.status == TaskStatus::Failed);

        if let Some(failed) = first_failure {
            let err = ExecutionError::TaskFailed {
                task_id: failed.id.clone(),
                kind: failed.kind,
                message: failed
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
            };
            error!(%err, "workflow failed");
            workflow.mark_failed(err.to_string());
            self.store.save_workflow(&workflow).await?;
            return Err(err);
        }

        let result = aggregate_result(&workflow, order);
        workflow.mark_completed();
        self.store.save_workflow(&workflow).await?;
        info!(progress = workflow.progress(), "workflow completed");

        Ok(result)
    }
}

/// Tasks that are Pending, undispatched, and have all dependencies
/// Completed, in deterministic dispatch order (topological rank).
fn ready_tasks(
    workflow: &Workflow,
    ranks: &HashMap<String, usize>,
    dispatched: &HashSet<String>,
) -> Vec<String> {
    let mut ready: Vec<String> = workflow
        .tasks
        .values()
        .filter(|task| {
            !dispatched.contains(&task.id) && task.can_run(|dep| workflow.task_status(dep))
        })
        .map(|task| task.id.clone())
        .collect();

    ready.sort_by_key(|id| ranks.get(id).copied().unwrap_or(usize::MAX));
    ready
}

/// Snapshot the results of a task's completed dependencies, keyed by kind.
fn dependency_results(workflow: &Workflow, task: &Task) -> Result<DependencyResults> {
    let mut deps = DependencyResults::new();
    for dep_id in &task.depends_on {
        let dep = workflow
            .get_task(dep_id)
            .ok_or_else(|| ExecutionError::TaskNotFound {
                task_id: dep_id.clone(),
            })?;
        if let Some(result) = &dep.result {
            deps.insert(dep.kind, result.clone());
        }
    }
    Ok(deps)
}

/// The workflow result is the designated terminal task's result: the
/// postprocess stage when present, otherwise the last task in topological
/// order.
fn aggregate_result(workflow: &Workflow, order: &[String]) -> Value {
    use crate::model::TaskKind;

    let terminal = workflow
        .task_of_kind(TaskKind::Postprocess)
        .or_else(|| order.last().and_then(|id| workflow.get_task(id)));

    terminal
        .and_then(|t| t.result.clone())
        .unwrap_or(Value::Null)
}
