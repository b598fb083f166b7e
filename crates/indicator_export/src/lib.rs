//! # Indicator Export
//!
//! The hierarchical export and reconciliation engine: a mutex-owned
//! tar.gz [`Archive`](archive::Archive) shared by all pipelines, the
//! deterministic [`ExportTreeWriter`](tree::ExportTreeWriter) placing
//! results into it, and the reconciler that rebuilds the folder
//! structure from the archive's own entry list to derive the hierarchy
//! listing and the occurrence KPI summary.

pub mod archive;
pub mod error;
pub mod hierarchy;
pub mod occurrence;
pub mod render;
pub mod tree;

pub use archive::Archive;
pub use error::ExportError;
pub use hierarchy::{HierarchySnapshot, PathTree};
pub use occurrence::{granular_summary, reconcile, OccurrenceSummary};
pub use tree::ExportTreeWriter;
