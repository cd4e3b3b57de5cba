// ABOUTME: Shared test helpers for integration tests
// ABOUTME: Stub executors, concurrency probes, and service builders

// Not every test binary uses every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use docflow::engine::{
    DependencyResults, ExecutionError, ExecutorRegistry, Result, TaskExecutor,
};
use docflow::model::{Task, TaskKind};
use docflow::service::WorkflowService;
use docflow::store::{MemoryStore, WorkflowStore};

/// Tracks how many stub executions overlap, for concurrency-bound assertions.
#[derive(Default)]
pub struct ConcurrencyProbe {
    current: AtomicUsize,
    max: AtomicUsize,
}

impl ConcurrencyProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn max_observed(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }
}

/// Deterministic stand-in for a pipeline stage.
pub struct StubExecutor {
    kind: TaskKind,
    delay: Option<Duration>,
    failure: Option<String>,
    probe: Option<Arc<ConcurrencyProbe>>,
}

impl StubExecutor {
    pub fn new(kind: TaskKind) -> Self {
        Self {
            kind,
            delay: None,
            failure: None,
            probe: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn with_probe(mut self, probe: Arc<ConcurrencyProbe>) -> Self {
        self.probe = Some(probe);
        self
    }
}

#[async_trait]
impl TaskExecutor for StubExecutor {
    fn kind(&self) -> TaskKind {
        self.kind
    }

    async fn execute(&self, task: &Task, _deps: &DependencyResults) -> Result<Value> {
        if let Some(probe) = &self.probe {
            probe.enter();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(probe) = &self.probe {
            probe.exit();
        }

        match &self.failure {
            Some(message) => Err(ExecutionError::InvalidParams {
                task_id: task.id.clone(),
                reason: message.clone(),
            }),
            None => Ok(json!({"stage": self.kind.as_str(), "task_id": task.id})),
        }
    }
}

/// Registry with a successful stub for every stage kind.
pub fn stub_registry() -> ExecutorRegistry {
    let mut registry = ExecutorRegistry::new();
    for kind in TaskKind::all() {
        registry.register(Arc::new(StubExecutor::new(kind)));
    }
    registry
}

/// Registry of stubs where the given kinds fail with the given message.
pub fn stub_registry_failing(failing: &[TaskKind], message: &str) -> ExecutorRegistry {
    let mut registry = ExecutorRegistry::new();
    for kind in TaskKind::all() {
        let stub = if failing.contains(&kind) {
            StubExecutor::new(kind).failing(message)
        } else {
            StubExecutor::new(kind)
        };
        registry.register(Arc::new(stub));
    }
    registry
}

pub fn memory_store() -> (Arc<MemoryStore>, Arc<dyn WorkflowStore>) {
    let store = Arc::new(MemoryStore::new());
    let dyn_store: Arc<dyn WorkflowStore> = store.clone();
    (store, dyn_store)
}

/// Service wired to a fresh in-memory store, returned alongside it so tests
/// can inspect persisted task state directly.
pub fn service_with(
    registry: ExecutorRegistry,
    max_concurrency: usize,
) -> (WorkflowService, Arc<MemoryStore>) {
    let (store, dyn_store) = memory_store();
    let service =
        WorkflowService::with_max_concurrency(dyn_store, Arc::new(registry), max_concurrency);
    (service, store)
}
