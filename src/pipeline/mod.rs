// ABOUTME: Built-in document pipeline stage executors
// ABOUTME: Wires the eight stage implementations into an executor registry

pub mod extract_text;
pub mod fields;
pub mod layout;
pub mod postprocess;
pub mod preprocess;
pub mod schema;
pub mod tables;
pub mod understand;
pub mod validate;

use std::sync::Arc;

use crate::engine::ExecutorRegistry;

pub use extract_text::ExtractTextExecutor;
pub use fields::ExtractFieldsExecutor;
pub use layout::AnalyzeLayoutExecutor;
pub use postprocess::PostprocessExecutor;
pub use preprocess::PreprocessExecutor;
pub use schema::DocumentType;
pub use tables::ExtractTablesExecutor;
pub use understand::UnderstandDocumentExecutor;
pub use validate::ValidateResultsExecutor;

/// Tunables for the built-in stages, passed explicitly to the executors
/// that need them rather than read from ambient state.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Confidence assigned to a field found by exact label match.
    pub field_confidence: f64,
    /// Confidence assigned to a table recovered from aligned columns.
    pub table_confidence: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            field_confidence: 0.9,
            table_confidence: 0.8,
        }
    }
}

/// Registry with every built-in stage registered.
pub fn default_registry(config: PipelineConfig) -> ExecutorRegistry {
    let mut registry = ExecutorRegistry::new();
    registry.register(Arc::new(PreprocessExecutor));
    registry.register(Arc::new(ExtractTextExecutor));
    registry.register(Arc::new(AnalyzeLayoutExecutor));
    registry.register(Arc::new(UnderstandDocumentExecutor));
    registry.register(Arc::new(ExtractFieldsExecutor::new(config)));
    registry.register(Arc::new(ExtractTablesExecutor::new(config)));
    registry.register(Arc::new(ValidateResultsExecutor));
    registry.register(Arc::new(PostprocessExecutor));
    registry
}
