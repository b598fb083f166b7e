//! Error types for core tabular operations.

use thiserror::Error;

/// Errors raised by `Frame` operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A named column is absent from the frame
    #[error("column '{0}' is missing")]
    MissingColumn(String),

    /// A column name occurs more than once
    #[error("column '{0}' is duplicated")]
    DuplicateColumn(String),

    /// A row does not match the frame width
    #[error("row width {found} does not match frame width {expected}")]
    RowWidth { expected: usize, found: usize },

    /// A column of values does not match the frame height
    #[error("column '{column}' has {found} values, frame has {expected} rows")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },

    /// Join key lists differ in length
    #[error("left join keys ({left}) and right join keys ({right}) differ in length")]
    KeyArity { left: usize, right: usize },
}

impl CoreError {
    /// Create a missing-column error
    pub fn missing(column: impl Into<String>) -> Self {
        Self::MissingColumn(column.into())
    }
}
