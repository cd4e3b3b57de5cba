// ABOUTME: Task executor registry and dependency-result lookup protocol
// ABOUTME: Maps task kinds to the collaborators that perform each stage's work

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::error::{ExecutionError, Result};
use crate::model::{Task, TaskKind};

/// Read access to the results of a task's completed dependencies, keyed by
/// kind. This is how a stage like field extraction reads the output of
/// document understanding without the engine knowing what either stage does.
#[derive(Debug, Clone, Default)]
pub struct DependencyResults {
    by_kind: HashMap<TaskKind, Value>,
}

impl DependencyResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: TaskKind, result: Value) {
        self.by_kind.insert(kind, result);
    }

    /// Result of the completed dependency of the given kind, if any.
    pub fn get(&self, kind: TaskKind) -> Option<&Value> {
        self.by_kind.get(&kind)
    }

    /// Like `get`, but a missing dependency is an error the executor can
    /// propagate directly.
    pub fn require(&self, kind: TaskKind) -> Result<&Value> {
        self.get(kind)
            .ok_or(ExecutionError::MissingDependencyResult { kind })
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }
}

/// A stage collaborator invoked by the engine for one task kind.
///
/// Implementations must be idempotent-safe to re-invoke: the engine performs
/// no automatic retries, but the contract does not assume exactly-once
/// external side effects.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    fn kind(&self) -> TaskKind;

    /// Check a task's parameter bag before dispatch. The default accepts
    /// anything; executors with required keys override this.
    fn validate_params(&self, _task: &Task) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, task: &Task, deps: &DependencyResults) -> Result<Value>;
}

/// Registry mapping task kind to its executor. Supplied by the surrounding
/// application; the engine only performs lookups.
#[derive(Default)]
pub struct ExecutorRegistry {
    executors: HashMap<TaskKind, Arc<dyn TaskExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, executor: Arc<dyn TaskExecutor>) {
        self.executors.insert(executor.kind(), executor);
    }

    pub fn get(&self, kind: TaskKind) -> Option<Arc<dyn TaskExecutor>> {
        self.executors.get(&kind).cloned()
    }

    pub fn registered_kinds(&self) -> Vec<TaskKind> {
        self.executors.keys().copied().collect()
    }

    /// Dispatch a task to its registered executor.
    pub async fn execute(&self, task: &Task, deps: &DependencyResults) -> Result<Value> {
        let executor = self
            .get(task.kind)
            .ok_or(ExecutionError::ExecutorMissing { kind: task.kind })?;

        executor.validate_params(task)?;
        executor.execute(task, deps).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoExecutor;

    #[async_trait]
    impl TaskExecutor for EchoExecutor {
        fn kind(&self) -> TaskKind {
            TaskKind::Preprocess
        }

        async fn execute(&self, task: &Task, _deps: &DependencyResults) -> Result<Value> {
            Ok(json!({"task_id": task.id}))
        }
    }

    #[tokio::test]
    async fn test_registry_dispatch() {
        let mut registry = ExecutorRegistry::new();
        registry.register(Arc::new(EchoExecutor));

        let task = Task::new("t1", TaskKind::Preprocess);
        let result = registry
            .execute(&task, &DependencyResults::new())
            .await
            .unwrap();
        assert_eq!(result["task_id"], "t1");
    }

    #[tokio::test]
    async fn test_unregistered_kind_is_an_error() {
        let registry = ExecutorRegistry::new();
        let task = Task::new("t1", TaskKind::Postprocess);

        let err = registry
            .execute(&task, &DependencyResults::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::ExecutorMissing {
                kind: TaskKind::Postprocess
            }
        ));
    }

    #[test]
    fn test_dependency_results_lookup() {
        let mut deps = DependencyResults::new();
        deps.insert(TaskKind::ExtractText, json!({"text": "hello"}));

        assert_eq!(deps.get(TaskKind::ExtractText).unwrap()["text"], "hello");
        assert!(deps.get(TaskKind::AnalyzeLayout).is_none());
        assert!(matches!(
            deps.require(TaskKind::AnalyzeLayout),
            Err(ExecutionError::MissingDependencyResult {
                kind: TaskKind::AnalyzeLayout
            })
        ));
    }
}
