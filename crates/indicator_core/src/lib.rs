//! # Indicator Core
//!
//! Leaf types of the regulatory indicator reporting engine: the tabular
//! [`Frame`](frame::Frame) every pipeline stage operates on, column
//! coercion schemas, the canonical ledger column set, and the shared
//! value types for currencies, run modes and indicator families.
//!
//! This crate has no I/O; loading and persistence live in the adapter
//! layer, orchestration in the service layer.

pub mod error;
pub mod frame;
pub mod ledger;
pub mod schema;
pub mod types;

pub use error::CoreError;
pub use frame::{Cell, Frame};
pub use schema::{ColumnKind, Schema};
pub use types::{
    Currency, CurrencyScope, EntityScope, ExportType, IndicatorKind, Segment,
};
