// ABOUTME: Task data structure and status state machine
// ABOUTME: Defines the eight pipeline stage kinds and legal status transitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The stage a task performs within a document processing workflow.
///
/// The engine itself is agnostic to what each kind does; the kinds only
/// identify which registered executor to invoke and let downstream stages
/// look up the results of their upstream dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Preprocess,
    ExtractText,
    AnalyzeLayout,
    UnderstandDocument,
    ExtractFields,
    ExtractTables,
    ValidateResults,
    Postprocess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// A unit of work owned by a single workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub kind: TaskKind,
    #[serde(default)]
    pub params: serde_json::Map<String, Value>,
    pub status: TaskStatus,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, kind: TaskKind) -> Self {
        Self {
            id: id.into(),
            kind,
            params: serde_json::Map::new(),
            status: TaskStatus::Pending,
            result: None,
            error: None,
            started_at: None,
            completed_at: None,
            depends_on: Vec::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn with_dependency(mut self, task_id: impl Into<String>) -> Self {
        self.depends_on.push(task_id.into());
        self
    }

    /// True iff this task is Pending and every dependency has Completed.
    ///
    /// `dep_status` resolves a dependency task id to its current status; a
    /// missing dependency makes the task not runnable. A task whose
    /// dependency has Failed never becomes runnable — the executor detects
    /// and surfaces that as an upstream failure rather than hanging.
    pub fn can_run(&self, dep_status: impl Fn(&str) -> Option<TaskStatus>) -> bool {
        if self.status != TaskStatus::Pending {
            return false;
        }
        self.depends_on
            .iter()
            .all(|dep| dep_status(dep) == Some(TaskStatus::Completed))
    }

    /// Transition Pending -> Running.
    ///
    /// Panics on any other source state: tasks are mutated only by the
    /// coordinating executor, so an illegal transition is a programming
    /// error, not a recoverable condition.
    pub fn mark_running(&mut self) {
        assert_eq!(
            self.status,
            TaskStatus::Pending,
            "illegal transition to Running from {:?} for task '{}'",
            self.status,
            self.id
        );
        self.status = TaskStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Transition Running -> Completed, recording the result payload.
    pub fn mark_completed(&mut self, result: Value) {
        assert_eq!(
            self.status,
            TaskStatus::Running,
            "illegal transition to Completed from {:?} for task '{}'",
            self.status,
            self.id
        );
        self.status = TaskStatus::Completed;
        self.result = Some(result);
        self.completed_at = Some(Utc::now());
    }

    /// Transition Running -> Failed, recording the error message.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        assert_eq!(
            self.status,
            TaskStatus::Running,
            "illegal transition to Failed from {:?} for task '{}'",
            self.status,
            self.id
        );
        self.status = TaskStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
    }

    /// Fail a task that never ran because an upstream dependency failed.
    ///
    /// This is the one terminal transition that skips Running: the task was
    /// never dispatched, so it has no start time.
    pub fn mark_blocked(&mut self, error: impl Into<String>) {
        assert_eq!(
            self.status,
            TaskStatus::Pending,
            "illegal blocked transition from {:?} for task '{}'",
            self.status,
            self.id
        );
        self.status = TaskStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Preprocess => "preprocess",
            TaskKind::ExtractText => "extract_text",
            TaskKind::AnalyzeLayout => "analyze_layout",
            TaskKind::UnderstandDocument => "understand_document",
            TaskKind::ExtractFields => "extract_fields",
            TaskKind::ExtractTables => "extract_tables",
            TaskKind::ValidateResults => "validate_results",
            TaskKind::Postprocess => "postprocess",
        }
    }

    /// All kinds in pipeline order.
    pub fn all() -> [TaskKind; 8] {
        [
            TaskKind::Preprocess,
            TaskKind::ExtractText,
            TaskKind::AnalyzeLayout,
            TaskKind::UnderstandDocument,
            TaskKind::ExtractFields,
            TaskKind::ExtractTables,
            TaskKind::ValidateResults,
            TaskKind::Postprocess,
        ]
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_lifecycle() {
        let mut task = Task::new("wf_1_preprocess", TaskKind::Preprocess);
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(!task.is_terminal());

        task.mark_running();
        assert_eq!(task.status, TaskStatus::Running);
        assert!(task.started_at.is_some());

        task.mark_completed(json!({"text": "hello"}));
        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.is_terminal());
        assert!(task.completed_at.is_some());
        assert!(task.error.is_none());
    }

    #[test]
    fn test_task_failure() {
        let mut task = Task::new("wf_1_extract_fields", TaskKind::ExtractFields);
        task.mark_running();
        task.mark_failed("model unavailable");

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some("model unavailable"));
        assert!(task.result.is_none());
    }

    #[test]
    #[should_panic(expected = "illegal transition")]
    fn test_completed_task_cannot_rerun() {
        let mut task = Task::new("t", TaskKind::Preprocess);
        task.mark_running();
        task.mark_completed(json!({}));
        task.mark_running();
    }

    #[test]
    #[should_panic(expected = "illegal transition")]
    fn test_pending_task_cannot_complete() {
        let mut task = Task::new("t", TaskKind::Preprocess);
        task.mark_completed(json!({}));
    }

    #[test]
    fn test_can_run_requires_completed_dependencies() {
        let task = Task::new("b", TaskKind::ExtractText).with_dependency("a");

        assert!(!task.can_run(|_| Some(TaskStatus::Pending)));
        assert!(!task.can_run(|_| Some(TaskStatus::Running)));
        assert!(!task.can_run(|_| Some(TaskStatus::Failed)));
        assert!(!task.can_run(|_| None));
        assert!(task.can_run(|_| Some(TaskStatus::Completed)));
    }

    #[test]
    fn test_can_run_false_once_dispatched() {
        let mut task = Task::new("a", TaskKind::Preprocess);
        assert!(task.can_run(|_| None));

        task.mark_running();
        assert!(!task.can_run(|_| None));
    }

    #[test]
    fn test_kind_serialization() {
        let kind = TaskKind::UnderstandDocument;
        let serialized = serde_json::to_string(&kind).unwrap();
        assert_eq!(serialized, "\"understand_document\"");
        assert_eq!(kind.to_string(), "understand_document");
    }
}
