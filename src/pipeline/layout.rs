// ABOUTME: Layout analysis stage executor
// ABOUTME: Groups contiguous non-empty lines into text blocks

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::engine::{DependencyResults, Result, TaskExecutor};
use crate::model::{Task, TaskKind};

pub struct AnalyzeLayoutExecutor;

/// Blank-line separated runs of text, the only structure a plain-text
/// layout pass can recover.
fn text_blocks(text: &str) -> Vec<Value> {
    let mut blocks = Vec::new();
    let mut start: Option<usize> = None;
    let mut buffer: Vec<&str> = Vec::new();

    let lines: Vec<&str> = text.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            if let Some(start_line) = start.take() {
                blocks.push(json!({
                    "index": blocks.len(),
                    "start_line": start_line,
                    "end_line": i - 1,
                    "text": buffer.join("\n"),
                }));
                buffer.clear();
            }
        } else {
            if start.is_none() {
                start = Some(i);
            }
            buffer.push(line);
        }
    }
    if let Some(start_line) = start {
        blocks.push(json!({
            "index": blocks.len(),
            "start_line": start_line,
            "end_line": lines.len().saturating_sub(1),
            "text": buffer.join("\n"),
        }));
    }

    blocks
}

#[async_trait]
impl TaskExecutor for AnalyzeLayoutExecutor {
    fn kind(&self) -> TaskKind {
        TaskKind::AnalyzeLayout
    }

    async fn execute(&self, _task: &Task, deps: &DependencyResults) -> Result<Value> {
        let text_result = deps.require(TaskKind::ExtractText)?;
        let text = text_result["text"].as_str().unwrap_or_default();

        let blocks = text_blocks(text);
        // The text rides along so downstream stages can reach it through
        // their direct dependency instead of re-reading the document.
        Ok(json!({
            "block_count": blocks.len(),
            "blocks": blocks,
            "line_count": text.lines().count(),
            "text": text,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_split_on_blank_lines() {
        let blocks = text_blocks("INVOICE\nACME Corp\n\nTotal: $10.00\n");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0]["text"], "INVOICE\nACME Corp");
        assert_eq!(blocks[0]["start_line"], 0);
        assert_eq!(blocks[0]["end_line"], 1);
        assert_eq!(blocks[1]["text"], "Total: $10.00");
        assert_eq!(blocks[1]["start_line"], 3);
    }

    #[test]
    fn test_empty_text_has_no_blocks() {
        assert!(text_blocks("").is_empty());
        assert!(text_blocks("\n\n  \n").is_empty());
    }

    #[tokio::test]
    async fn test_layout_result_shape() {
        let mut deps = DependencyResults::new();
        deps.insert(TaskKind::ExtractText, json!({"text": "a\n\nb"}));

        let task = Task::new("t", TaskKind::AnalyzeLayout);
        let result = AnalyzeLayoutExecutor.execute(&task, &deps).await.unwrap();

        assert_eq!(result["block_count"], 2);
        assert_eq!(result["line_count"], 3);
    }
}
