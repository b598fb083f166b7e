//! # Adapter Ledger
//!
//! Input adapter of the reporting engine: CSV ingestion of the ledger
//! extract and reference tables, and the filesystem-backed
//! [`CsvSliceStore`](store::CsvSliceStore) that persists and verifies
//! intermediate currency slices for the partitioner.

pub mod error;
pub mod loader;
pub mod store;

pub use error::AdapterError;
pub use loader::{load_ledger, load_reference, read_csv, write_csv};
pub use store::CsvSliceStore;
