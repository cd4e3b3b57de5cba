// ABOUTME: In-memory workflow store used by the CLI and tests
// ABOUTME: Keeps workflows in a RwLock-guarded map with per-call atomicity

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{Result, StoreError, WorkflowStore};
use crate::model::{Task, Workflow};

/// Process-local store backing a single-node deployment.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    workflows: Arc<RwLock<HashMap<String, Workflow>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.workflows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.workflows.read().await.is_empty()
    }
}

#[async_trait]
impl WorkflowStore for MemoryStore {
    async fn load_workflow(&self, workflow_id: &str) -> Result<Option<Workflow>> {
        let workflows = self.workflows.read().await;
        Ok(workflows.get(workflow_id).cloned())
    }

    async fn save_workflow(&self, workflow: &Workflow) -> Result<()> {
        let mut workflows = self.workflows.write().await;
        workflows.insert(workflow.id.clone(), workflow.clone());
        Ok(())
    }

    async fn save_task(&self, workflow_id: &str, task: &Task) -> Result<()> {
        let mut workflows = self.workflows.write().await;
        let workflow =
            workflows
                .get_mut(workflow_id)
                .ok_or_else(|| StoreError::WorkflowMissing {
                    workflow_id: workflow_id.to_string(),
                })?;

        let slot = workflow
            .tasks
            .get_mut(&task.id)
            .ok_or_else(|| StoreError::TaskMissing {
                workflow_id: workflow_id.to_string(),
                task_id: task.id.clone(),
            })?;
        *slot = task.clone();
        workflow.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn delete_workflow(&self, workflow_id: &str) -> Result<()> {
        let mut workflows = self.workflows.write().await;
        workflows
            .remove(workflow_id)
            .ok_or_else(|| StoreError::WorkflowMissing {
                workflow_id: workflow_id.to_string(),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TaskKind, TaskStatus};
    use serde_json::json;

    fn sample_workflow() -> Workflow {
        let mut workflow = Workflow::new("wf_abc", "doc_1");
        workflow.add_task(Task::new("wf_abc_preprocess", TaskKind::Preprocess));
        workflow
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let store = MemoryStore::new();
        let workflow = sample_workflow();

        store.save_workflow(&workflow).await.unwrap();
        let loaded = store.load_workflow("wf_abc").await.unwrap().unwrap();

        assert_eq!(loaded.id, "wf_abc");
        assert_eq!(loaded.tasks.len(), 1);
        assert!(store.load_workflow("wf_missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_task_updates_stored_state() {
        let store = MemoryStore::new();
        let workflow = sample_workflow();
        store.save_workflow(&workflow).await.unwrap();

        let mut task = workflow.get_task("wf_abc_preprocess").unwrap().clone();
        task.mark_running();
        task.mark_completed(json!({"text": "ok"}));
        store.save_task("wf_abc", &task).await.unwrap();

        let loaded = store.load_workflow("wf_abc").await.unwrap().unwrap();
        let stored = loaded.get_task("wf_abc_preprocess").unwrap();
        assert_eq!(stored.status, TaskStatus::Completed);
        assert!(stored.result.is_some());
    }

    #[tokio::test]
    async fn test_save_task_unknown_workflow_errors() {
        let store = MemoryStore::new();
        let task = Task::new("t", TaskKind::Preprocess);

        let err = store.save_task("nope", &task).await.unwrap_err();
        assert!(matches!(err, StoreError::WorkflowMissing { .. }));
    }

    #[tokio::test]
    async fn test_delete_workflow_destroys_tasks() {
        let store = MemoryStore::new();
        store.save_workflow(&sample_workflow()).await.unwrap();
        assert_eq!(store.len().await, 1);

        store.delete_workflow("wf_abc").await.unwrap();
        assert!(store.is_empty().await);
    }
}
