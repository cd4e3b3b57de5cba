// ABOUTME: Workflow execution engine module
// ABOUTME: Graph validation, executor registry, concurrent dispatch, status reporting

pub mod error;
pub mod executor;
pub mod graph;
pub mod registry;
pub mod status;

pub use error::{ExecutionError, Result};
pub use executor::{WorkflowExecutor, DEFAULT_MAX_CONCURRENCY};
pub use graph::TaskGraph;
pub use registry::{DependencyResults, ExecutorRegistry, TaskExecutor};
pub use status::{workflow_status, WorkflowStatusReport};
