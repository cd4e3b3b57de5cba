// ABOUTME: Workflow service assembling the standard document pipeline topology
// ABOUTME: Creates workflows, runs them through the executor, and answers status queries

use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::engine::{
    workflow_status, ExecutionError, ExecutorRegistry, Result, WorkflowExecutor,
    WorkflowStatusReport, DEFAULT_MAX_CONCURRENCY,
};
use crate::model::{Task, TaskKind, Workflow};
use crate::store::WorkflowStore;

/// High-level entry point for document processing workflows.
///
/// Owns the standard eight-stage topology; callers hand in a document and get
/// back a workflow id they can execute and poll.
pub struct WorkflowService {
    store: Arc<dyn WorkflowStore>,
    executor: WorkflowExecutor,
}

impl WorkflowService {
    pub fn new(store: Arc<dyn WorkflowStore>, registry: Arc<ExecutorRegistry>) -> Self {
        Self::with_max_concurrency(store, registry, DEFAULT_MAX_CONCURRENCY)
    }

    pub fn with_max_concurrency(
        store: Arc<dyn WorkflowStore>,
        registry: Arc<ExecutorRegistry>,
        max_concurrency: usize,
    ) -> Self {
        let executor =
            WorkflowExecutor::with_max_concurrency(Arc::clone(&store), registry, max_concurrency);
        Self { store, executor }
    }

    /// Create and persist a workflow for one document.
    ///
    /// The topology is the fixed document pipeline: a linear prefix through
    /// document understanding, a parallel fan-out into field and table
    /// extraction, and a join through validation into postprocessing.
    #[instrument(skip(self, document_path, template_id))]
    pub async fn create_workflow(
        &self,
        document_id: &str,
        document_path: &str,
        template_id: Option<&str>,
    ) -> Result<Workflow> {
        let workflow_id = format!("wf_{}", &Uuid::new_v4().simple().to_string()[..10]);
        let mut workflow = Workflow::new(&workflow_id, document_id);

        let tid = |kind: TaskKind| format!("{workflow_id}_{kind}");

        workflow.add_task(
            Task::new(tid(TaskKind::Preprocess), TaskKind::Preprocess)
                .with_param("document_path", json!(document_path)),
        );
        workflow.add_task(
            Task::new(tid(TaskKind::ExtractText), TaskKind::ExtractText)
                .with_dependency(tid(TaskKind::Preprocess)),
        );
        workflow.add_task(
            Task::new(tid(TaskKind::AnalyzeLayout), TaskKind::AnalyzeLayout)
                .with_dependency(tid(TaskKind::ExtractText)),
        );

        let mut understand = Task::new(tid(TaskKind::UnderstandDocument), TaskKind::UnderstandDocument)
            .with_dependency(tid(TaskKind::AnalyzeLayout));
        if let Some(template) = template_id {
            understand = understand.with_param("template_id", json!(template));
        }
        workflow.add_task(understand);

        workflow.add_task(
            Task::new(tid(TaskKind::ExtractFields), TaskKind::ExtractFields)
                .with_dependency(tid(TaskKind::UnderstandDocument)),
        );
        workflow.add_task(
            Task::new(tid(TaskKind::ExtractTables), TaskKind::ExtractTables)
                .with_dependency(tid(TaskKind::UnderstandDocument)),
        );
        workflow.add_task(
            Task::new(tid(TaskKind::ValidateResults), TaskKind::ValidateResults)
                .with_dependency(tid(TaskKind::ExtractFields))
                .with_dependency(tid(TaskKind::ExtractTables)),
        );
        workflow.add_task(
            Task::new(tid(TaskKind::Postprocess), TaskKind::Postprocess)
                .with_dependency(tid(TaskKind::ValidateResults)),
        );

        self.store.save_workflow(&workflow).await?;
        info!(workflow_id = %workflow.id, document_id, "created workflow");

        Ok(workflow)
    }

    /// Run a previously created workflow to a terminal state.
    pub async fn execute_workflow(&self, workflow_id: &str) -> Result<Value> {
        self.executor.execute(workflow_id).await
    }

    pub async fn execute_workflow_with_cancellation(
        &self,
        workflow_id: &str,
        cancel: CancellationToken,
    ) -> Result<Value> {
        self.executor
            .execute_with_cancellation(workflow_id, cancel)
            .await
    }

    /// Summarize a workflow's current state. Safe to call at any time.
    pub async fn status(&self, workflow_id: &str) -> Result<WorkflowStatusReport> {
        workflow_status(self.store.as_ref(), workflow_id).await
    }

    /// Create and execute in one call, returning the workflow id alongside
    /// the aggregate result so the caller can still query status afterwards.
    pub async fn process_document(
        &self,
        document_id: &str,
        document_path: &str,
        template_id: Option<&str>,
    ) -> Result<(String, Value)> {
        let workflow = self
            .create_workflow(document_id, document_path, template_id)
            .await?;
        let result = self.execute_workflow(&workflow.id).await?;
        Ok((workflow.id, result))
    }

    pub async fn delete_workflow(&self, workflow_id: &str) -> Result<()> {
        self.store
            .delete_workflow(workflow_id)
            .await
            .map_err(ExecutionError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskStatus;
    use crate::store::MemoryStore;

    fn service() -> WorkflowService {
        let store: Arc<dyn WorkflowStore> = Arc::new(MemoryStore::new());
        WorkflowService::new(store, Arc::new(ExecutorRegistry::new()))
    }

    #[tokio::test]
    async fn test_create_workflow_builds_standard_topology() {
        let svc = service();
        let workflow = svc
            .create_workflow("doc_1", "/tmp/doc.txt", Some("invoice"))
            .await
            .unwrap();

        assert!(workflow.id.starts_with("wf_"));
        assert_eq!(workflow.id.len(), 13);
        assert_eq!(workflow.tasks.len(), 8);

        for kind in TaskKind::all() {
            let task = workflow.task_of_kind(kind).unwrap();
            assert_eq!(task.id, format!("{}_{}", workflow.id, kind));
            assert_eq!(task.status, TaskStatus::Pending);
        }

        let validate = workflow.task_of_kind(TaskKind::ValidateResults).unwrap();
        assert_eq!(validate.depends_on.len(), 2);

        let preprocess = workflow.task_of_kind(TaskKind::Preprocess).unwrap();
        assert_eq!(preprocess.param_str("document_path"), Some("/tmp/doc.txt"));
        assert!(preprocess.depends_on.is_empty());

        let understand = workflow.task_of_kind(TaskKind::UnderstandDocument).unwrap();
        assert_eq!(understand.param_str("template_id"), Some("invoice"));
    }

    #[tokio::test]
    async fn test_created_workflow_is_persisted() {
        let svc = service();
        let workflow = svc
            .create_workflow("doc_2", "/tmp/doc.txt", None)
            .await
            .unwrap();

        let report = svc.status(&workflow.id).await.unwrap();
        assert_eq!(report.task_counts.total, 8);
        assert_eq!(report.task_counts.pending, 8);
        assert_eq!(report.progress, 0.0);
    }

    #[tokio::test]
    async fn test_status_for_unknown_workflow() {
        let svc = service();
        let err = svc.status("wf_missing").await.unwrap_err();
        assert!(matches!(err, ExecutionError::WorkflowNotFound { .. }));
    }
}
