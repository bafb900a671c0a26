//! Error types for surveyrec operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for surveyrec operations
pub type Result<T> = std::result::Result<T, SurveyrecError>;

/// Main error type for all surveyrec operations
#[derive(Error, Debug)]
pub enum SurveyrecError {
    /// A required input dataset does not resolve to a readable source
    #[error("Source not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// A single table violates its own schema (inconsistent column sets,
    /// duplicate column names, ragged rows)
    #[error("Schema error: {message}")]
    SchemaError { message: String },

    /// The two tables' column sets differ and strict schema checking is on
    #[error(
        "Schema mismatch: {} column(s) missing in new, {} extra in new",
        missing_in_new.len(),
        extra_in_new.len()
    )]
    SchemaMismatch {
        missing_in_new: Vec<String>,
        extra_in_new: Vec<String>,
    },

    /// Invalid input provided by the caller
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl SurveyrecError {
    pub fn source_not_found(path: impl Into<PathBuf>) -> Self {
        Self::SourceNotFound { path: path.into() }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaError {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
