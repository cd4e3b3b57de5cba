// ABOUTME: Result validation stage executor
// ABOUTME: Checks required fields and tables, value formats, and overall confidence

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::schema::{fields_for, matches_kind, tables_for, DocumentType};
use crate::engine::{DependencyResults, Result, TaskExecutor};
use crate::model::{Task, TaskKind};

/// Validates extraction quality without failing the task: a document with
/// missing required fields still completes, carrying `valid: false` so the
/// caller can decide what to do with it. Only executor errors fail a task.
pub struct ValidateResultsExecutor;

fn field_value<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    fields
        .get(name)
        .and_then(|f| f["value"].as_str())
        .filter(|v| !v.is_empty())
}

fn validate(
    document_type: DocumentType,
    fields: &Map<String, Value>,
    tables: &Map<String, Value>,
) -> Value {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    for spec in fields_for(document_type) {
        if spec.required && field_value(fields, spec.name).is_none() {
            errors.push(format!(
                "Required field '{}' is missing or empty",
                spec.name
            ));
        }
    }

    for spec in tables_for(document_type) {
        let has_rows = tables
            .get(spec.name)
            .and_then(|t| t["rows"].as_array())
            .is_some_and(|rows| !rows.is_empty());
        if spec.required && !has_rows {
            errors.push(format!(
                "Required table '{}' is missing or empty",
                spec.name
            ));
        }
    }

    for spec in fields_for(document_type) {
        if let Some(value) = field_value(fields, spec.name) {
            if !matches_kind(spec.kind, value) {
                warnings.push(format!(
                    "Field '{}' has invalid {} format: {}",
                    spec.name,
                    kind_name(spec.kind),
                    value
                ));
            }
        }
    }

    json!({
        "valid": errors.is_empty(),
        "errors": errors,
        "warnings": warnings,
    })
}

fn kind_name(kind: super::schema::FieldKind) -> &'static str {
    use super::schema::FieldKind;
    match kind {
        FieldKind::Text => "text",
        FieldKind::Date => "date",
        FieldKind::Currency => "currency",
        FieldKind::Number => "number",
    }
}

/// Mean of every field and table confidence, 0.0 when nothing was extracted.
fn overall_confidence(fields: &Map<String, Value>, tables: &Map<String, Value>) -> f64 {
    let confidences: Vec<f64> = fields
        .values()
        .chain(tables.values())
        .map(|v| v["confidence"].as_f64().unwrap_or(0.0))
        .collect();

    if confidences.is_empty() {
        return 0.0;
    }
    confidences.iter().sum::<f64>() / confidences.len() as f64
}

#[async_trait]
impl TaskExecutor for ValidateResultsExecutor {
    fn kind(&self) -> TaskKind {
        TaskKind::ValidateResults
    }

    async fn execute(&self, _task: &Task, deps: &DependencyResults) -> Result<Value> {
        let fields_result = deps.require(TaskKind::ExtractFields)?;
        let tables_result = deps.require(TaskKind::ExtractTables)?;

        let document_type =
            DocumentType::parse(fields_result["document_type"].as_str().unwrap_or_default());
        let empty = Map::new();
        let fields = fields_result["fields"].as_object().unwrap_or(&empty);
        let tables = tables_result["tables"].as_object().unwrap_or(&empty);

        let validation = validate(document_type, fields, tables);
        let confidence = overall_confidence(fields, tables);

        debug!(
            %document_type,
            valid = validation["valid"].as_bool().unwrap_or(false),
            confidence,
            "validated extraction results"
        );

        Ok(json!({
            "document_type": document_type.as_str(),
            "fields": fields,
            "tables": tables,
            "validation": validation,
            "confidence": confidence,
        }))
    }
}
