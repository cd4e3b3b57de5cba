// ABOUTME: Error types for workflow execution engine operations
// ABOUTME: Defines the failure taxonomy for scheduling, dispatch, and propagation

use thiserror::Error;

use crate::model::TaskKind;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("circular dependency detected involving tasks: {tasks:?}")]
    CircularDependency { tasks: Vec<String> },

    #[error("task '{task}' depends on unknown task '{dependency}'")]
    UnknownDependency { task: String, dependency: String },

    #[error("workflow not found: {workflow_id}")]
    WorkflowNotFound { workflow_id: String },

    #[error("task not found: {task_id}")]
    TaskNotFound { task_id: String },

    #[error("no executor registered for task kind '{kind}'")]
    ExecutorMissing { kind: TaskKind },

    #[error("task '{task_id}' ({kind}) failed: {message}")]
    TaskFailed {
        task_id: String,
        kind: TaskKind,
        message: String,
    },

    #[error("task '{task_id}' blocked: upstream dependency '{dependency}' failed")]
    UpstreamFailure { task_id: String, dependency: String },

    #[error("no completed dependency of kind '{kind}' provides a result")]
    MissingDependencyResult { kind: TaskKind },

    #[error("invalid parameters for task '{task_id}': {reason}")]
    InvalidParams { task_id: String, reason: String },

    #[error("workflow '{workflow_id}' cancelled before completion")]
    Cancelled { workflow_id: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ExecutionError>;
