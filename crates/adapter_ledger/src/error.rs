//! Error types for ledger and reference ingestion.

use indicator_core::CoreError;
use thiserror::Error;

/// Errors raised while reading or writing tabular files.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Filesystem failure
    #[error("i/o error on '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Malformed CSV content
    #[error("csv error in '{path}': {message}")]
    Csv { path: String, message: String },

    /// The extract lacks required columns; all of them are reported
    #[error("ledger extract is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// Tabular shape error
    #[error(transparent)]
    Frame(#[from] CoreError),
}

impl AdapterError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn csv(path: &std::path::Path, err: csv::Error) -> Self {
        Self::Csv {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
