//! # Service CLI
//!
//! Run orchestrator of the reporting engine: configuration, the export
//! run command wiring partitioner, pipelines, archive and reconciler
//! together, and the input check command.

pub mod commands;
pub mod config;
pub mod error;

pub use config::RunConfig;
pub use error::{CliError, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::commands::run::{IndicatorOutcome, RunOptions, RunReport};
    pub use crate::config::RunConfig;
    pub use crate::error::CliError;
}
