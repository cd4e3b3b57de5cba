// ABOUTME: Text extraction stage executor
// ABOUTME: Splits preprocessed text into pages on form-feed boundaries

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::engine::{DependencyResults, Result, TaskExecutor};
use crate::model::{Task, TaskKind};

pub struct ExtractTextExecutor;

#[async_trait]
impl TaskExecutor for ExtractTextExecutor {
    fn kind(&self) -> TaskKind {
        TaskKind::ExtractText
    }

    async fn execute(&self, _task: &Task, deps: &DependencyResults) -> Result<Value> {
        let preprocess = deps.require(TaskKind::Preprocess)?;
        let text = preprocess["text"].as_str().unwrap_or_default();

        let pages: Vec<Value> = text
            .split('\u{c}')
            .enumerate()
            .map(|(i, page_text)| json!({"page": i + 1, "text": page_text}))
            .collect();

        Ok(json!({
            "text": text,
            "pages": pages,
        }))
    }
}
