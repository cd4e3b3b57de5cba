// ABOUTME: Workflow aggregate owning a fixed set of tasks and overall status
// ABOUTME: Tracks workflow-level lifecycle, error state, and task count summaries

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::task::{Task, TaskKind, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// A document processing workflow: the aggregate root owning its tasks.
///
/// The task topology is fixed at creation time and never grows during
/// execution; only task and workflow statuses are mutated, and only by the
/// executor driving a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub document_id: String,
    pub status: WorkflowStatus,
    pub error: Option<String>,
    pub tasks: IndexMap<String, Task>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Task tallies by status, reported by the status query interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounts {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

impl Workflow {
    pub fn new(id: impl Into<String>, document_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            document_id: document_id.into(),
            status: WorkflowStatus::Pending,
            error: None,
            tasks: IndexMap::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn add_task(&mut self, task: Task) {
        self.tasks.insert(task.id.clone(), task);
    }

    pub fn get_task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.get(task_id)
    }

    pub fn get_task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.get_mut(task_id)
    }

    /// First task of the given kind, if any.
    pub fn task_of_kind(&self, kind: TaskKind) -> Option<&Task> {
        self.tasks.values().find(|t| t.kind == kind)
    }

    pub fn task_status(&self, task_id: &str) -> Option<TaskStatus> {
        self.tasks.get(task_id).map(|t| t.status)
    }

    /// Transition Pending -> Running. Terminal states are absorbing, so a
    /// workflow never re-enters Running within an execution.
    pub fn mark_running(&mut self) {
        assert_eq!(
            self.status,
            WorkflowStatus::Pending,
            "illegal workflow transition to Running from {:?} for '{}'",
            self.status,
            self.id
        );
        self.status = WorkflowStatus::Running;
        self.updated_at = Utc::now();
    }

    pub fn mark_completed(&mut self) {
        assert_eq!(
            self.status,
            WorkflowStatus::Running,
            "illegal workflow transition to Completed from {:?} for '{}'",
            self.status,
            self.id
        );
        self.status = WorkflowStatus::Completed;
        let now = Utc::now();
        self.updated_at = now;
        self.completed_at = Some(now);
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        assert!(
            matches!(self.status, WorkflowStatus::Pending | WorkflowStatus::Running),
            "illegal workflow transition to Failed from {:?} for '{}'",
            self.status,
            self.id
        );
        self.status = WorkflowStatus::Failed;
        self.error = Some(error.into());
        let now = Utc::now();
        self.updated_at = now;
        self.completed_at = Some(now);
    }

    pub fn task_counts(&self) -> TaskCounts {
        let mut counts = TaskCounts {
            total: self.tasks.len(),
            pending: 0,
            running: 0,
            completed: 0,
            failed: 0,
        };
        for task in self.tasks.values() {
            match task.status {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::Running => counts.running += 1,
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }

    /// Completed tasks as a percentage of all tasks, computed at call time.
    pub fn progress(&self) -> f64 {
        let counts = self.task_counts();
        if counts.total == 0 {
            return 0.0;
        }
        (counts.completed as f64 / counts.total as f64) * 100.0
    }

    pub fn all_tasks_terminal(&self) -> bool {
        self.tasks.values().all(Task::is_terminal)
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowStatus::Pending => write!(f, "pending"),
            WorkflowStatus::Running => write!(f, "running"),
            WorkflowStatus::Completed => write!(f, "completed"),
            WorkflowStatus::Failed => write!(f, "failed"),
        }
    }
}
