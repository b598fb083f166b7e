//! Error types for the indicator engine.

use indicator_core::CoreError;
use thiserror::Error;

/// Errors raised while building reference data, partitioning the ledger
/// or running an indicator pipeline.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    /// Invalid run parameters; fatal before any pipeline runs
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A pipeline stage found a required column absent; fatal to that
    /// pipeline invocation only
    #[error("stage '{stage}': column '{column}' is missing")]
    MissingColumn {
        stage: &'static str,
        column: String,
    },

    /// Reference table normalisation failed
    #[error("reference data error: {0}")]
    Reference(String),

    /// Unexpected tabular shape error
    #[error(transparent)]
    Frame(#[from] CoreError),
}

impl EngineError {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a reference data error
    pub fn reference(msg: impl Into<String>) -> Self {
        Self::Reference(msg.into())
    }

    /// Tag a core missing-column error with the stage that hit it.
    pub fn at_stage(stage: &'static str, err: CoreError) -> Self {
        match err {
            CoreError::MissingColumn(column) => Self::MissingColumn { stage, column },
            other => Self::Frame(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_names_stage() {
        let err = EngineError::at_stage("pivot", CoreError::missing(">1Y"));
        let msg = err.to_string();
        assert!(msg.contains("pivot"));
        assert!(msg.contains(">1Y"));
    }

    #[test]
    fn test_other_core_errors_pass_through() {
        let err = EngineError::at_stage("aggregation", CoreError::DuplicateColumn("x".into()));
        assert!(matches!(err, EngineError::Frame(_)));
    }
}
