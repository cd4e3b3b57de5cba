// ABOUTME: Table extraction stage executor
// ABOUTME: Recovers column-aligned tables from text for the document type's table specs

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::LazyLock;
use tracing::debug;

use super::schema::{tables_for, DocumentType, TableSpec};
use super::PipelineConfig;
use crate::engine::{DependencyResults, Result, TaskExecutor};
use crate::model::{Task, TaskKind};

pub struct ExtractTablesExecutor {
    config: PipelineConfig,
}

impl ExtractTablesExecutor {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }
}

static COLUMN_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("column split regex"));

fn split_columns(line: &str) -> Vec<String> {
    COLUMN_SPLIT_RE
        .split(line.trim())
        .map(|cell| cell.to_string())
        .collect()
}

fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase().replace([' ', '-'], "_")
}

/// A header row matches a spec when every spec column appears among its
/// cells. Rows follow until a blank line or a width mismatch.
fn find_table(text: &str, spec: &TableSpec) -> Option<Value> {
    let lines: Vec<&str> = text.lines().collect();

    for (i, line) in lines.iter().enumerate() {
        let cells = split_columns(line);
        if cells.len() < 2 {
            continue;
        }

        let normalized: Vec<String> = cells.iter().map(|c| normalize_header(c)).collect();
        let is_header = spec
            .columns
            .iter()
            .all(|col| normalized.iter().any(|cell| cell == col.name));
        if !is_header {
            continue;
        }

        let mut rows = Vec::new();
        for row_line in &lines[i + 1..] {
            if row_line.trim().is_empty() {
                break;
            }
            let row_cells = split_columns(row_line);
            if row_cells.len() != cells.len() {
                break;
            }
            rows.push(json!(row_cells));
        }

        if rows.is_empty() {
            continue;
        }

        return Some(json!({
            "headers": cells,
            "rows": rows,
        }));
    }

    None
}

#[async_trait]
impl TaskExecutor for ExtractTablesExecutor {
    fn kind(&self) -> TaskKind {
        TaskKind::ExtractTables
    }

    async fn execute(&self, _task: &Task, deps: &DependencyResults) -> Result<Value> {
        let understanding = deps.require(TaskKind::UnderstandDocument)?;
        let document_type =
            DocumentType::parse(understanding["document_type"].as_str().unwrap_or_default());
        let text = understanding["text"].as_str().unwrap_or_default();

        let mut tables = Map::new();
        for spec in tables_for(document_type) {
            if let Some(mut table) = find_table(text, spec) {
                table["confidence"] = json!(self.config.table_confidence);
                tables.insert(spec.name.to_string(), table);
            }
        }

        debug!(%document_type, found = tables.len(), "extracted tables");

        Ok(json!({
            "document_type": document_type.as_str(),
            "tables": tables,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVOICE_TEXT: &str = "\
INVOICE

Description      Quantity  Unit Price  Total
Widget           2         $10.00      $20.00
Gadget           1         $5.00       $5.00

Total Amount: $25.00
";

    fn deps_for(document_type: &str, text: &str) -> DependencyResults {
        let mut deps = DependencyResults::new();
        deps.insert(
            TaskKind::UnderstandDocument,
            json!({"document_type": document_type, "text": text}),
        );
        deps
    }

    #[tokio::test]
    async fn test_extracts_invoice_line_items() {
        let executor = ExtractTablesExecutor::new(PipelineConfig::default());
        let task = Task::new("t", TaskKind::ExtractTables);
        let result = executor
            .execute(&task, &deps_for("invoice", INVOICE_TEXT))
            .await
            .unwrap();

        let table = &result["tables"]["line_items"];
        assert_eq!(table["headers"].as_array().unwrap().len(), 4);
        let rows = table["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "Widget");
        assert_eq!(rows[1][3], "$5.00");
    }

    #[tokio::test]
    async fn test_general_documents_have_no_table_specs() {
        let executor = ExtractTablesExecutor::new(PipelineConfig::default());
        let task = Task::new("t", TaskKind::ExtractTables);
        let result = executor
            .execute(&task, &deps_for("general", INVOICE_TEXT))
            .await
            .unwrap();

        assert!(result["tables"].as_object().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_table_is_omitted() {
        let executor = ExtractTablesExecutor::new(PipelineConfig::default());
        let task = Task::new("t", TaskKind::ExtractTables);
        let result = executor
            .execute(&task, &deps_for("invoice", "INVOICE\nno table here"))
            .await
            .unwrap();

        assert!(result["tables"].as_object().unwrap().is_empty());
    }
}
