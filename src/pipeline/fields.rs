// ABOUTME: Field extraction stage executor
// ABOUTME: Pulls labeled values out of the text per the document type's field specs

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::schema::{fields_for, DocumentType};
use super::PipelineConfig;
use crate::engine::{DependencyResults, Result, TaskExecutor};
use crate::model::{Task, TaskKind};

pub struct ExtractFieldsExecutor {
    config: PipelineConfig,
}

impl ExtractFieldsExecutor {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }
}

/// Normalize a label like "Invoice Number" or "invoice-number:" into the
/// snake_case key its field spec uses.
fn normalize_label(label: &str) -> String {
    label
        .trim()
        .trim_start_matches('#')
        .trim()
        .to_lowercase()
        .replace([' ', '-'], "_")
}

/// Scan `label: value` lines for the named field.
fn find_labeled_value(text: &str, field_name: &str) -> Option<String> {
    for line in text.lines() {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        if normalize_label(label) == field_name {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

#[async_trait]
impl TaskExecutor for ExtractFieldsExecutor {
    fn kind(&self) -> TaskKind {
        TaskKind::ExtractFields
    }

    async fn execute(&self, _task: &Task, deps: &DependencyResults) -> Result<Value> {
        let understanding = deps.require(TaskKind::UnderstandDocument)?;
        let document_type =
            DocumentType::parse(understanding["document_type"].as_str().unwrap_or_default());
        let text = understanding["text"].as_str().unwrap_or_default();

        let mut fields = Map::new();
        for spec in fields_for(document_type) {
            if let Some(value) = find_labeled_value(text, spec.name) {
                fields.insert(
                    spec.name.to_string(),
                    json!({
                        "value": value,
                        "confidence": self.config.field_confidence,
                    }),
                );
            }
        }

        debug!(%document_type, found = fields.len(), "extracted fields");

        Ok(json!({
            "document_type": document_type.as_str(),
            "fields": fields,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVOICE_TEXT: &str = "\
INVOICE
Invoice Number: INV-1001
Date: 2026-01-15
Total Amount: $250.00
Vendor Name: ACME Corp
Customer Name: Widgets Inc
";

    fn deps_for(document_type: &str, text: &str) -> DependencyResults {
        let mut deps = DependencyResults::new();
        deps.insert(
            TaskKind::UnderstandDocument,
            json!({"document_type": document_type, "text": text}),
        );
        deps
    }

    #[test]
    fn test_label_normalization() {
        assert_eq!(normalize_label("Invoice Number"), "invoice_number");
        assert_eq!(normalize_label("# Due-Date "), "due_date");
    }

    #[tokio::test]
    async fn test_extracts_labeled_invoice_fields() {
        let executor = ExtractFieldsExecutor::new(PipelineConfig::default());
        let task = Task::new("t", TaskKind::ExtractFields);
        let result = executor
            .execute(&task, &deps_for("invoice", INVOICE_TEXT))
            .await
            .unwrap();

        let fields = result["fields"].as_object().unwrap();
        assert_eq!(fields["invoice_number"]["value"], "INV-1001");
        assert_eq!(fields["date"]["value"], "2026-01-15");
        assert_eq!(fields["total_amount"]["value"], "$250.00");
        assert!(!fields.contains_key("due_date"));
        assert_eq!(result["document_type"], "invoice");
    }

    #[tokio::test]
    async fn test_unlabeled_text_yields_no_fields() {
        let executor = ExtractFieldsExecutor::new(PipelineConfig::default());
        let task = Task::new("t", TaskKind::ExtractFields);
        let result = executor
            .execute(&task, &deps_for("general", "free prose without labels"))
            .await
            .unwrap();

        assert!(result["fields"].as_object().unwrap().is_empty());
    }
}
