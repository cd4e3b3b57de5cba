// ABOUTME: Persistence boundary for workflow and task state
// ABOUTME: Defines the store trait consumed by the executor and an in-memory implementation

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Task, Workflow};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("workflow '{workflow_id}' does not exist in the store")]
    WorkflowMissing { workflow_id: String },

    #[error("task '{task_id}' does not exist in workflow '{workflow_id}'")]
    TaskMissing { workflow_id: String, task_id: String },

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistence collaborator for workflow state.
///
/// Each call is atomic on its own; the engine never spans a transaction
/// across multiple entities. During a run the store is write-through only:
/// the executor's in-memory workflow is the source of truth, and every
/// status transition is persisted before the scheduling loop proceeds so a
/// concurrent status query observes a consistent (if stale) snapshot.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Load a workflow with its tasks, or None if the id is unknown.
    async fn load_workflow(&self, workflow_id: &str) -> Result<Option<Workflow>>;

    /// Persist the workflow record, including all of its tasks.
    async fn save_workflow(&self, workflow: &Workflow) -> Result<()>;

    /// Persist a single task's state within an existing workflow.
    async fn save_task(&self, workflow_id: &str, task: &Task) -> Result<()>;

    /// Remove a workflow and its tasks. Tasks are owned exclusively by
    /// their workflow, so they are destroyed with it.
    async fn delete_workflow(&self, workflow_id: &str) -> Result<()>;
}
