// ABOUTME: Core data model for document processing workflows
// ABOUTME: Defines tasks, workflows, and their status state machines

pub mod task;
pub mod workflow;

pub use task::{Task, TaskKind, TaskStatus};
pub use workflow::{TaskCounts, Workflow, WorkflowStatus};
