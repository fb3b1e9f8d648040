//! Error types for the fdr-planner library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid p-value {value} for test {key}: must be in [0, 1]")]
    InvalidPValue { key: String, value: f64 },

    #[error("Duplicate test record: {key} submitted more than once")]
    DuplicateTestRecord { key: String },

    #[error("Cyclic nesting: model '{model}' participates in a refinement cycle")]
    CyclicNesting { model: String },

    #[error("Unresolved dependency between {a} and {b}: {reason}")]
    UnresolvedDependency { a: String, b: String, reason: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Missing column '{0}' in input table")]
    MissingColumn(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, PlanError>;
