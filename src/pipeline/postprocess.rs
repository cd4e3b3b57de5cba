// ABOUTME: Postprocess stage executor, the pipeline's terminal task
// ABOUTME: Shapes the validated extraction into the workflow's aggregate result

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::engine::{DependencyResults, Result, TaskExecutor};
use crate::model::{Task, TaskKind};

/// Produces the final result document the workflow reports: normalized
/// fields, tables, validation outcome, and overall confidence.
pub struct PostprocessExecutor;

fn format_fields(fields: &Map<String, Value>) -> Value {
    let mut formatted = Map::new();
    for (name, data) in fields {
        let mut entry = json!({
            "value": data["value"].clone(),
            "confidence": data["confidence"].as_f64().unwrap_or(0.0),
        });
        if let Some(bbox) = data.get("bounding_box") {
            entry["bounding_box"] = bbox.clone();
        }
        formatted.insert(name.clone(), entry);
    }
    Value::Object(formatted)
}

fn format_tables(tables: &Map<String, Value>) -> Value {
    let mut formatted = Map::new();
    for (name, data) in tables {
        formatted.insert(
            name.clone(),
            json!({
                "headers": data.get("headers").cloned().unwrap_or_else(|| json!([])),
                "rows": data.get("rows").cloned().unwrap_or_else(|| json!([])),
                "confidence": data["confidence"].as_f64().unwrap_or(0.0),
            }),
        );
    }
    Value::Object(formatted)
}

#[async_trait]
impl TaskExecutor for PostprocessExecutor {
    fn kind(&self) -> TaskKind {
        TaskKind::Postprocess
    }

    async fn execute(&self, _task: &Task, deps: &DependencyResults) -> Result<Value> {
        let validated = deps.require(TaskKind::ValidateResults)?;

        let empty = Map::new();
        let fields = validated["fields"].as_object().unwrap_or(&empty);
        let tables = validated["tables"].as_object().unwrap_or(&empty);
        let validation = &validated["validation"];

        Ok(json!({
            "document_type": validated["document_type"].as_str().unwrap_or("unknown"),
            "fields": format_fields(fields),
            "tables": format_tables(tables),
            "validation": {
                "valid": validation["valid"].as_bool().unwrap_or(true),
                "errors": validation.get("errors").cloned().unwrap_or_else(|| json!([])),
                "warnings": validation.get("warnings").cloned().unwrap_or_else(|| json!([])),
            },
            "confidence": validated["confidence"].as_f64().unwrap_or(0.0),
        }))
    }
}
