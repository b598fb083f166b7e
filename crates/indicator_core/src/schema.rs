//! Column typing schemas and cell coercion.
//!
//! Extracts arrive as untyped text; a [`Schema`] describes the target
//! type of each known column so loaders can coerce cells the same way
//! on every read. Unparseable numeric cells become null rather than
//! failing the load, matching the tolerant ingestion behaviour of the
//! upstream reporting chain.

use crate::frame::{Cell, Frame};

/// Target type of a column.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// Free text
    Text,
    /// Integer-valued amounts
    Int,
    /// Floating-point coefficients
    Float,
}

/// Ordered list of (column, kind) pairs.
///
/// Columns absent from the frame are ignored; frame columns absent from
/// the schema keep their cells untouched.
#[derive(Clone, Debug)]
pub struct Schema {
    entries: Vec<(String, ColumnKind)>,
}

impl Schema {
    /// Build a schema from (column, kind) pairs.
    pub fn new<I, S>(entries: I) -> Schema
    where
        I: IntoIterator<Item = (S, ColumnKind)>,
        S: Into<String>,
    {
        Schema {
            entries: entries.into_iter().map(|(n, k)| (n.into(), k)).collect(),
        }
    }

    /// Kind of a named column, if the schema knows it.
    pub fn kind(&self, column: &str) -> Option<ColumnKind> {
        self.entries
            .iter()
            .find(|(n, _)| n == column)
            .map(|(_, k)| *k)
    }

    /// Iterate over (column, kind) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnKind)> {
        self.entries.iter().map(|(n, k)| (n.as_str(), *k))
    }
}

/// Coerce a single cell to a column kind.
pub fn coerce_cell(cell: &Cell, kind: ColumnKind) -> Cell {
    match kind {
        ColumnKind::Text => match cell {
            Cell::Null => Cell::Null,
            Cell::Text(s) if s.trim().is_empty() => Cell::Null,
            other => Cell::Text(other.to_string()),
        },
        ColumnKind::Int => match cell {
            Cell::Int(v) => Cell::Int(*v),
            Cell::Float(v) if v.fract() == 0.0 => Cell::Int(*v as i64),
            Cell::Text(s) => parse_int(s),
            _ => Cell::Null,
        },
        ColumnKind::Float => match cell {
            Cell::Float(v) => Cell::Float(*v),
            Cell::Int(v) => Cell::Float(*v as f64),
            Cell::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(Cell::Float)
                .unwrap_or(Cell::Null),
            _ => Cell::Null,
        },
    }
}

fn parse_int(s: &str) -> Cell {
    let trimmed = s.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Cell::Int(v);
    }
    // Integral floats ("150.0") are accepted, anything else is null.
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Cell::Int(v as i64),
        _ => Cell::Null,
    }
}

/// Apply a schema to every known column of a frame.
pub fn coerce_frame(frame: &Frame, schema: &Schema) -> Frame {
    let mut out = frame.clone();
    for (name, kind) in schema.iter() {
        let Ok(idx) = frame.column_index(name) else {
            continue;
        };
        let values: Vec<Cell> = frame
            .rows()
            .map(|row| coerce_cell(&row[idx], kind))
            .collect();
        out = replace_column(&out, idx, values);
    }
    out
}

fn replace_column(frame: &Frame, idx: usize, values: Vec<Cell>) -> Frame {
    let rows = frame
        .rows()
        .zip(values)
        .map(|(row, value)| {
            let mut row = row.to_vec();
            row[idx] = value;
            row
        })
        .collect();
    Frame::from_rows(frame.columns().to_vec(), rows)
        .expect("replacing a column preserves the frame shape")
}
