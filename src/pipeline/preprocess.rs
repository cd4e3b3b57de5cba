// ABOUTME: Preprocess stage executor, the pipeline entry point
// ABOUTME: Loads the document from disk and normalizes it into raw text

use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;
use tracing::debug;

use crate::engine::{DependencyResults, ExecutionError, Result, TaskExecutor};
use crate::model::{Task, TaskKind};

/// Reads the source document and produces the normalized text every later
/// stage works from.
pub struct PreprocessExecutor;

fn document_format(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("pdf") => "pdf",
        Some("png" | "jpg" | "jpeg" | "tiff" | "bmp" | "gif") => "image",
        Some("md" | "markdown") => "markdown",
        Some("txt" | "text") => "text",
        _ => "unknown",
    }
}

#[async_trait]
impl TaskExecutor for PreprocessExecutor {
    fn kind(&self) -> TaskKind {
        TaskKind::Preprocess
    }

    fn validate_params(&self, task: &Task) -> Result<()> {
        if task.param_str("document_path").is_none() {
            return Err(ExecutionError::InvalidParams {
                task_id: task.id.clone(),
                reason: "missing 'document_path'".to_string(),
            });
        }
        Ok(())
    }

    async fn execute(&self, task: &Task, _deps: &DependencyResults) -> Result<Value> {
        let path = task
            .param_str("document_path")
            .ok_or_else(|| ExecutionError::InvalidParams {
                task_id: task.id.clone(),
                reason: "missing 'document_path'".to_string(),
            })?;

        let raw = tokio::fs::read_to_string(path).await?;
        // Normalize line endings so downstream line math is stable.
        let text = raw.replace("\r\n", "\n");

        debug!(path, chars = text.len(), "preprocessed document");

        Ok(json!({
            "text": text,
            "char_count": text.chars().count(),
            "line_count": text.lines().count(),
            "document_format": document_format(path),
        }))
    }
}
