//! Error types for stockrecon operations

use crate::data::{Key, Side};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReconError>;

#[derive(Error, Debug)]
pub enum ReconError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing key column '{column}' in {side} dataset")]
    MissingKeyColumn { side: Side, column: String },

    #[error("Duplicate key {key} in {side} dataset")]
    DuplicateKey { side: Side, key: Key },

    #[error("Schema mismatch: {message}")]
    SchemaMismatch { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl ReconError {
    pub fn missing_key_column(side: Side, column: impl Into<String>) -> Self {
        Self::MissingKeyColumn {
            side,
            column: column.into(),
        }
    }

    pub fn duplicate_key(side: Side, key: Key) -> Self {
        Self::DuplicateKey { side, key }
    }

    pub fn schema_mismatch(msg: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    /// True for errors raised by the reconciler before any comparison starts
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Self::MissingKeyColumn { .. } | Self::SchemaMismatch { .. })
    }
}
