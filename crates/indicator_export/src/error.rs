//! Error types for archive packaging and reconciliation.

use indicator_core::CoreError;
use indicator_engine::EngineError;
use thiserror::Error;

/// Errors raised while writing the archive or reconciling its contents.
#[derive(Debug, Error)]
pub enum ExportError {
    /// An archive entry was written twice; entries are write-once
    #[error("archive entry '{0}' already written")]
    DuplicateEntry(String),

    /// Underlying archive I/O failure
    #[error("archive i/o: {0}")]
    Io(#[from] std::io::Error),

    /// Tabular serialisation failure
    #[error("csv serialisation: {0}")]
    Csv(String),

    /// A structural marker expected by the occurrence summary is absent
    #[error("hierarchy marker '{0}' not found")]
    MarkerNotFound(String),

    /// Result table shape error
    #[error(transparent)]
    Frame(#[from] CoreError),

    /// Pipeline result access error
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_entry_names_path() {
        let err = ExportError::DuplicateEntry("RUN_X/EUR/report.csv".to_string());
        assert!(err.to_string().contains("RUN_X/EUR/report.csv"));
    }
}
