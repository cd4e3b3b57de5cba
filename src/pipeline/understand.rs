// ABOUTME: Document understanding stage executor
// ABOUTME: Classifies the document type from its text content

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::schema::DocumentType;
use crate::engine::{DependencyResults, Result, TaskExecutor};
use crate::model::{Task, TaskKind};

pub struct UnderstandDocumentExecutor;

#[async_trait]
impl TaskExecutor for UnderstandDocumentExecutor {
    fn kind(&self) -> TaskKind {
        TaskKind::UnderstandDocument
    }

    async fn execute(&self, task: &Task, deps: &DependencyResults) -> Result<Value> {
        let layout = deps.require(TaskKind::AnalyzeLayout)?;
        let text = layout["text"].as_str().unwrap_or_default();
        let document_type = DocumentType::detect(text);

        debug!(%document_type, "classified document");

        let mut result = json!({
            "document_type": document_type.as_str(),
            "block_count": layout["block_count"],
            "text": text,
        });
        if let Some(template) = task.param_str("template_id") {
            result["template_id"] = json!(template);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps_with_text(text: &str) -> DependencyResults {
        let mut deps = DependencyResults::new();
        deps.insert(TaskKind::AnalyzeLayout, json!({"block_count": 1, "text": text}));
        deps
    }

    #[tokio::test]
    async fn test_invoice_classification() {
        let task = Task::new("t", TaskKind::UnderstandDocument);
        let result = UnderstandDocumentExecutor
            .execute(&task, &deps_with_text("INVOICE #1001"))
            .await
            .unwrap();

        assert_eq!(result["document_type"], "invoice");
        assert!(result.get("template_id").is_none());
    }

    #[tokio::test]
    async fn test_template_id_carried_through() {
        let task = Task::new("t", TaskKind::UnderstandDocument)
            .with_param("template_id", json!("tmpl_7"));
        let result = UnderstandDocumentExecutor
            .execute(&task, &deps_with_text("notes"))
            .await
            .unwrap();

        assert_eq!(result["document_type"], "general");
        assert_eq!(result["template_id"], "tmpl_7");
    }
}
