// ABOUTME: Command implementations for the docflow CLI
// ABOUTME: Handles execution of the process and plan commands

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use super::config::Config;
use crate::engine::{ExecutorRegistry, TaskGraph};
use crate::pipeline::default_registry;
use crate::service::WorkflowService;
use crate::store::{MemoryStore, WorkflowStore};

fn document_id(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string()
}

fn build_service(config: &Config, max_concurrent: Option<usize>) -> Result<WorkflowService> {
    let max_concurrent = max_concurrent.unwrap_or(config.max_concurrent_tasks);
    if max_concurrent == 0 {
        return Err(anyhow::anyhow!(
            "max concurrent tasks must be at least 1, got 0"
        ));
    }

    let store: Arc<dyn WorkflowStore> = Arc::new(MemoryStore::new());
    let registry = Arc::new(default_registry(config.pipeline_config()));
    Ok(WorkflowService::with_max_concurrency(
        store,
        registry,
        max_concurrent,
    ))
}

/// Run a document through the full pipeline and report the result
pub async fn process_document(
    document: PathBuf,
    template: Option<String>,
    max_concurrent: Option<usize>,
    output: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    info!("Processing document: {}", document.display());

    let document_path = document
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Document path is not valid UTF-8"))?;

    let service = build_service(config, max_concurrent)?;
    let workflow = service
        .create_workflow(&document_id(&document), document_path, template.as_deref())
        .await?;
    info!("Created workflow: {}", workflow.id);

    let execution = service.execute_workflow(&workflow.id).await;
    let report = service.status(&workflow.id).await?;

    println!(
        "Workflow '{}' finished with status: {}",
        report.workflow_id, report.status
    );
    println!(
        "  Tasks: {} total, {} completed, {} failed",
        report.task_counts.total, report.task_counts.completed, report.task_counts.failed
    );
    println!("  Progress: {:.1}%", report.progress);

    let result = match execution {
        Ok(result) => result,
        Err(err) => {
            return Err(anyhow::anyhow!("Document processing failed: {}", err));
        }
    };

    let json_content = serde_json::to_string_pretty(&result)?;
    if let Some(output_path) = output {
        std::fs::write(&output_path, json_content)?;
        info!("Results written to: {}", output_path.display());
    } else {
        println!("{json_content}");
    }

    Ok(())
}

/// Print the task plan for a document without executing anything
pub async fn plan_workflow(
    document: PathBuf,
    template: Option<String>,
    config: &Config,
) -> Result<()> {
    let document_path = document
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Document path is not valid UTF-8"))?;

    // An empty registry is fine here: planning never dispatches.
    let store: Arc<dyn WorkflowStore> = Arc::new(MemoryStore::new());
    let service = WorkflowService::with_max_concurrency(
        store,
        Arc::new(ExecutorRegistry::new()),
        config.max_concurrent_tasks,
    );

    let workflow = service
        .create_workflow(&document_id(&document), document_path, template.as_deref())
        .await?;

    let graph = TaskGraph::from_workflow(&workflow)?;
    let order = graph.execution_order()?;

    println!("Plan for '{}' ({} tasks):", document.display(), order.len());
    for (rank, task_id) in order.iter().enumerate() {
        let task = workflow
            .get_task(task_id)
            .ok_or_else(|| anyhow::anyhow!("Task not found in workflow: {}", task_id))?;
        if task.depends_on.is_empty() {
            println!("  {}. {} ({})", rank + 1, task_id, task.kind);
        } else {
            println!(
                "  {}. {} ({}) <- {}",
                rank + 1,
                task_id,
                task.kind,
                task.depends_on.join(", ")
            );
        }
    }

    Ok(())
}
