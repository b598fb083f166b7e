//! In-memory tabular dataset.
//!
//! Every pipeline stage consumes and produces a [`Frame`]: an ordered
//! set of named columns over rows of loosely typed cells. The operation
//! set mirrors what the indicator pipelines need — row filtering,
//! multi-key left joins, group-and-sum, and pivoting a label column
//! into a fixed set of value columns.
//!
//! Join and grouping semantics follow the reporting conventions of the
//! source extracts: null keys never match and never form groups, and
//! sums skip null cells.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::CoreError;

/// A single tabular value.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    /// Absent value
    Null,
    /// Text value
    Text(String),
    /// Integer value (the monetary amount domain)
    Int(i64),
    /// Floating-point value (percentages and adjusted amounts)
    Float(f64),
}

impl Cell {
    /// Whether this cell is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Text content, if this is a text cell.
    pub fn text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value, promoting integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(v) => Some(*v as f64),
            Cell::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The key representation used for joins and grouping.
    ///
    /// Null cells yield `None`: a null key never matches and never
    /// forms a group.
    pub fn key(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Int(v) => write!(f, "{}", v),
            Cell::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Int(v)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Float(v)
    }
}

/// Running sum that stays in the integer domain until a float joins in.
#[derive(Clone, Copy, Debug)]
enum SumAcc {
    Int(i64),
    Float(f64),
}

impl SumAcc {
    fn zero() -> Self {
        SumAcc::Int(0)
    }

    fn add(self, cell: &Cell) -> Self {
        match (self, cell) {
            (acc, Cell::Null) => acc,
            (SumAcc::Int(a), Cell::Int(v)) => SumAcc::Int(a + v),
            (SumAcc::Int(a), Cell::Float(v)) => SumAcc::Float(a as f64 + v),
            (SumAcc::Float(a), Cell::Int(v)) => SumAcc::Float(a + *v as f64),
            (SumAcc::Float(a), Cell::Float(v)) => SumAcc::Float(a + v),
            (acc, Cell::Text(_)) => acc,
        }
    }

    fn into_cell(self) -> Cell {
        match self {
            SumAcc::Int(v) => Cell::Int(v),
            SumAcc::Float(v) => Cell::Float(v),
        }
    }
}

/// Ordered named columns over rows of [`Cell`] values.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Frame {
    /// Create an empty frame with the given column names.
    pub fn new<I, S>(columns: I) -> Result<Frame, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        for (i, name) in columns.iter().enumerate() {
            if columns[..i].contains(name) {
                return Err(CoreError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Frame {
            columns,
            rows: Vec::new(),
        })
    }

    /// Create a frame from column names and rows.
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Cell>>) -> Result<Frame, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut frame = Frame::new(columns)?;
        for row in rows {
            frame.push_row(row)?;
        }
        Ok(frame)
    }

    /// Column names, in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Whether the frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row cells by index.
    pub fn row(&self, idx: usize) -> &[Cell] {
        &self.rows[idx]
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Resolve a column name to its index.
    pub fn column_index(&self, name: &str) -> Result<usize, CoreError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| CoreError::missing(name))
    }

    /// Whether a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Cell at (row, column name).
    pub fn cell(&self, row: usize, column: &str) -> Result<&Cell, CoreError> {
        let idx = self.column_index(column)?;
        Ok(&self.rows[row][idx])
    }

    /// Append a row.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), CoreError> {
        if row.len() != self.columns.len() {
            return Err(CoreError::RowWidth {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append a column of values, one per existing row.
    pub fn add_column(&mut self, name: impl Into<String>, values: Vec<Cell>) -> Result<(), CoreError> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(CoreError::DuplicateColumn(name));
        }
        if values.len() != self.rows.len() {
            return Err(CoreError::ColumnLength {
                column: name,
                expected: self.rows.len(),
                found: values.len(),
            });
        }
        self.columns.push(name);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    /// New frame keeping only rows matching the predicate.
    pub fn filter_rows(&self, mut pred: impl FnMut(&[Cell]) -> bool) -> Frame {
        Frame {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| pred(r)).cloned().collect(),
        }
    }

    /// New frame keeping only rows where the named column is non-null.
    pub fn drop_null_rows(&self, column: &str) -> Result<Frame, CoreError> {
        let idx = self.column_index(column)?;
        Ok(self.filter_rows(|row| !row[idx].is_null()))
    }

    /// New frame with rows whose cells are all null removed.
    ///
    /// Cells holding only whitespace text count as blank too.
    pub fn drop_blank_rows(&self) -> Frame {
        self.filter_rows(|row| {
            row.iter().any(|cell| match cell {
                Cell::Null => false,
                Cell::Text(s) => !s.trim().is_empty(),
                _ => true,
            })
        })
    }

    /// New frame with the named columns, in the given order.
    pub fn select(&self, names: &[&str]) -> Result<Frame, CoreError> {
        let indices: Vec<usize> = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<Result<_, _>>()?;
        let columns = names.iter().map(|n| n.to_string()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(Frame { columns, rows })
    }

    /// New frame without the named columns; absent names are ignored.
    pub fn drop_columns(&self, names: &[&str]) -> Frame {
        let keep: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !names.contains(&c.as_str()))
            .map(|(i, _)| i)
            .collect();
        Frame {
            columns: keep.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }

    /// Left join against `right` on one or more key column pairs.
    ///
    /// Every left row is kept. Rows with a null key never match; an
    /// unmatched left row is padded with nulls for the right columns.
    /// A key matching several right rows produces one output row per
    /// match.
    pub fn left_join(
        &self,
        right: &Frame,
        left_keys: &[&str],
        right_keys: &[&str],
    ) -> Result<Frame, CoreError> {
        if left_keys.len() != right_keys.len() {
            return Err(CoreError::KeyArity {
                left: left_keys.len(),
                right: right_keys.len(),
            });
        }
        let left_idx: Vec<usize> = left_keys
            .iter()
            .map(|k| self.column_index(k))
            .collect::<Result<_, _>>()?;
        let right_idx: Vec<usize> = right_keys
            .iter()
            .map(|k| right.column_index(k))
            .collect::<Result<_, _>>()?;

        let mut columns = self.columns.clone();
        for name in &right.columns {
            if columns.contains(name) {
                return Err(CoreError::DuplicateColumn(name.clone()));
            }
            columns.push(name.clone());
        }

        let mut lookup: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
        for (i, row) in right.rows.iter().enumerate() {
            let key: Option<Vec<String>> = right_idx.iter().map(|&k| row[k].key()).collect();
            if let Some(key) = key {
                lookup.entry(key).or_default().push(i);
            }
        }

        let mut rows = Vec::with_capacity(self.rows.len());
        let null_pad = vec![Cell::Null; right.columns.len()];
        for row in &self.rows {
            let key: Option<Vec<String>> = left_idx.iter().map(|&k| row[k].key()).collect();
            let matches = key.and_then(|k| lookup.get(&k));
            match matches {
                Some(indices) => {
                    for &i in indices {
                        let mut out = row.clone();
                        out.extend(right.rows[i].iter().cloned());
                        rows.push(out);
                    }
                }
                None => {
                    let mut out = row.clone();
                    out.extend(null_pad.iter().cloned());
                    rows.push(out);
                }
            }
        }
        Ok(Frame { columns, rows })
    }

    /// Group by the key columns and sum the value column into `out`.
    ///
    /// Rows with a null grouping key are dropped. Null values are
    /// skipped; a group of only nulls sums to zero. The sum stays in
    /// the integer domain unless a float contributes. Groups come out
    /// ordered by their key representation.
    pub fn group_sum(
        &self,
        keys: &[&str],
        value: &str,
        out: &str,
    ) -> Result<Frame, CoreError> {
        let key_idx: Vec<usize> = keys
            .iter()
            .map(|k| self.column_index(k))
            .collect::<Result<_, _>>()?;
        let value_idx = self.column_index(value)?;

        let mut groups: BTreeMap<Vec<String>, (Vec<Cell>, SumAcc)> = BTreeMap::new();
        for row in &self.rows {
            let key: Option<Vec<String>> = key_idx.iter().map(|&k| row[k].key()).collect();
            let Some(key) = key else { continue };
            let entry = groups.entry(key).or_insert_with(|| {
                let cells = key_idx.iter().map(|&k| row[k].clone()).collect();
                (cells, SumAcc::zero())
            });
            entry.1 = entry.1.add(&row[value_idx]);
        }

        let mut columns: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        columns.push(out.to_string());
        let rows = groups
            .into_values()
            .map(|(mut cells, acc)| {
                cells.push(acc.into_cell());
                cells
            })
            .collect();
        Ok(Frame { columns, rows })
    }

    /// Pivot a label column into one value column per label.
    ///
    /// Rows are grouped by the index columns; for each group the value
    /// column is summed per label. Rows with a null index key or a null
    /// label are dropped. The output carries the index columns followed
    /// by `ordered` labels; a label absent from the entire input is a
    /// [`CoreError::MissingColumn`], while a label merely absent from a
    /// group fills with zero.
    pub fn pivot(
        &self,
        index: &[&str],
        column: &str,
        value: &str,
        ordered: &[&str],
    ) -> Result<Frame, CoreError> {
        let index_idx: Vec<usize> = index
            .iter()
            .map(|k| self.column_index(k))
            .collect::<Result<_, _>>()?;
        let column_idx = self.column_index(column)?;
        let value_idx = self.column_index(value)?;

        let mut groups: BTreeMap<Vec<String>, (Vec<Cell>, HashMap<String, SumAcc>)> =
            BTreeMap::new();
        let mut seen_labels: Vec<String> = Vec::new();
        for row in &self.rows {
            let key: Option<Vec<String>> = index_idx.iter().map(|&k| row[k].key()).collect();
            let (Some(key), Some(label)) = (key, row[column_idx].key()) else {
                continue;
            };
            if !seen_labels.contains(&label) {
                seen_labels.push(label.clone());
            }
            let entry = groups.entry(key).or_insert_with(|| {
                let cells = index_idx.iter().map(|&k| row[k].clone()).collect();
                (cells, HashMap::new())
            });
            let acc = entry.1.entry(label).or_insert_with(SumAcc::zero);
            *acc = acc.add(&row[value_idx]);
        }

        if !groups.is_empty() {
            for label in ordered {
                if !seen_labels.iter().any(|l| l == label) {
                    return Err(CoreError::missing(*label));
                }
            }
        }

        let mut columns: Vec<String> = index.iter().map(|k| k.to_string()).collect();
        columns.extend(ordered.iter().map(|l| l.to_string()));
        let rows = groups
            .into_values()
            .map(|(mut cells, sums)| {
                for label in ordered {
                    let cell = sums
                        .get(*label)
                        .map(|acc| acc.into_cell())
                        .unwrap_or(Cell::Int(0));
                    cells.push(cell);
                }
                cells
            })
            .collect();
        Ok(Frame { columns, rows })
    }

    /// Sum of the named column over non-null cells, as a float.
    pub fn column_sum(&self, column: &str) -> Result<f64, CoreError> {
        let idx = self.column_index(column)?;
        Ok(self
            .rows
            .iter()
            .filter_map(|row| row[idx].as_f64())
            .sum())
    }
}
