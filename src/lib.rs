// ABOUTME: Main library module for the docflow document workflow engine
// ABOUTME: Exports all core modules and provides the public API

pub mod cli;
pub mod engine;
pub mod model;
pub mod pipeline;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use cli::{App, Args, Config};
pub use engine::{ExecutionError, ExecutorRegistry, TaskExecutor, WorkflowExecutor};
pub use model::{Task, TaskKind, TaskStatus, Workflow, WorkflowStatus};
pub use service::WorkflowService;
pub use store::{MemoryStore, WorkflowStore};

// Error handling
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
