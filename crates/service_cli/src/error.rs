//! CLI error type.

use thiserror::Error;

/// Errors surfaced by the orchestrator binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration problems
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Invalid command-line arguments
    #[error("Invalid argument: {0}")]
    Invalid(String),

    /// Data loading error
    #[error("Data loading error: {0}")]
    Adapter(#[from] adapter_ledger::AdapterError),

    /// Engine error fatal to the whole run
    #[error("Engine error: {0}")]
    Engine(#[from] indicator_engine::EngineError),

    /// Archive or reconciliation error
    #[error("Export error: {0}")]
    Export(#[from] indicator_export::ExportError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Create an invalid-argument error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Result alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
