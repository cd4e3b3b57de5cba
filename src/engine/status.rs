// ABOUTME: Workflow status reporting for queries from the CLI and callers
// ABOUTME: Summarizes task counts and progress without touching execution state

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::{ExecutionError, Result};
use crate::model::{TaskCounts, Workflow, WorkflowStatus};
use crate::store::WorkflowStore;

/// Point-in-time summary of a workflow, safe to request at any time
/// including mid-execution. Reading status never mutates anything.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowStatusReport {
    pub workflow_id: String,
    pub document_id: String,
    pub status: WorkflowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub task_counts: TaskCounts,
    pub progress: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowStatusReport {
    pub fn from_workflow(workflow: &Workflow) -> Self {
        Self {
            workflow_id: workflow.id.clone(),
            document_id: workflow.document_id.clone(),
            status: workflow.status,
            error: workflow.error.clone(),
            task_counts: workflow.task_counts(),
            progress: workflow.progress(),
            created_at: workflow.created_at,
            updated_at: workflow.updated_at,
            completed_at: workflow.completed_at,
        }
    }
}

/// Look up a workflow and summarize it.
pub async fn workflow_status(
    store: &dyn WorkflowStore,
    workflow_id: &str,
) -> Result<WorkflowStatusReport> {
    let workflow = store
        .load_workflow(workflow_id)
        .await?
        .ok_or_else(|| ExecutionError::WorkflowNotFound {
            workflow_id: workflow_id.to_string(),
        })?;

    Ok(WorkflowStatusReport::from_workflow(&workflow))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Task, TaskKind};
    use crate::store::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_status_counts_and_progress() {
        let mut workflow = Workflow::new("wf_status", "doc_9");
        workflow.add_task(Task::new("a", TaskKind::Preprocess));
        workflow.add_task(Task::new("b", TaskKind::ExtractText).with_dependency("a"));
        workflow.add_task(Task::new("c", TaskKind::Postprocess).with_dependency("b"));

        workflow.get_task_mut("a").unwrap().mark_running();
        workflow
            .get_task_mut("a")
            .unwrap()
            .mark_completed(json!({}));
        workflow.get_task_mut("b").unwrap().mark_running();

        let store = MemoryStore::new();
        store.save_workflow(&workflow).await.unwrap();

        let report = workflow_status(&store, "wf_status").await.unwrap();
        assert_eq!(report.task_counts.total, 3);
        assert_eq!(report.task_counts.completed, 1);
        assert_eq!(report.task_counts.running, 1);
        assert_eq!(report.task_counts.pending, 1);
        assert!((report.progress - 100.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_status_missing_workflow() {
        let store = MemoryStore::new();
        let err = workflow_status(&store, "wf_nope").await.unwrap_err();
        assert!(matches!(err, ExecutionError::WorkflowNotFound { .. }));
    }

    #[tokio::test]
    async fn test_status_query_is_read_only() {
        let mut workflow = Workflow::new("wf_ro", "doc");
        workflow.add_task(Task::new("a", TaskKind::Preprocess));
        let store = MemoryStore::new();
        store.save_workflow(&workflow).await.unwrap();

        let first = workflow_status(&store, "wf_ro").await.unwrap();
        let second = workflow_status(&store, "wf_ro").await.unwrap();
        assert_eq!(first.updated_at, second.updated_at);
        assert_eq!(first.task_counts.pending, second.task_counts.pending);
    }
}
