//! CSV ingestion of the ledger extract and reference tables.
//!
//! Files are read as raw text frames (empty fields become null), then
//! the ledger extract additionally gets its blank rows dropped and the
//! canonical column coercion applied. Reference tables are returned
//! raw; their normalisation rules live with the reference store.

use std::path::Path;

use indicator_core::frame::{Cell, Frame};
use indicator_core::ledger::{ledger_schema, REQUIRED_COLUMNS};
use indicator_core::schema::coerce_frame;
use tracing::info;

use crate::error::AdapterError;

/// Read a CSV file into a raw text frame.
pub fn read_csv(path: impl AsRef<Path>) -> Result<Frame, AdapterError> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(false)
        .from_path(path)
        .map_err(|e| AdapterError::Csv {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AdapterError::csv(path, e))?
        .iter()
        .map(str::to_string)
        .collect();
    let mut frame = Frame::new(headers)?;
    for record in reader.records() {
        let record = record.map_err(|e| AdapterError::csv(path, e))?;
        let row: Vec<Cell> = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Cell::Null
                } else {
                    Cell::Text(field.to_string())
                }
            })
            .collect();
        frame.push_row(row)?;
    }
    Ok(frame)
}

/// Write a frame as CSV; null cells become empty fields.
pub fn write_csv(path: impl AsRef<Path>, frame: &Frame) -> Result<(), AdapterError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| AdapterError::io(path, e))?;
    }
    let mut writer = csv::Writer::from_path(path).map_err(|e| AdapterError::Csv {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    writer
        .write_record(frame.columns())
        .map_err(|e| AdapterError::csv(path, e))?;
    for row in frame.rows() {
        let record: Vec<String> = row.iter().map(Cell::to_string).collect();
        writer
            .write_record(&record)
            .map_err(|e| AdapterError::csv(path, e))?;
    }
    writer
        .flush()
        .map_err(|e| AdapterError::io(path, e))?;
    Ok(())
}

/// Load and clean the ledger extract.
///
/// Checks the required column set up front (all missing columns are
/// reported together), drops all-blank rows and applies the canonical
/// coercion schema.
pub fn load_ledger(path: impl AsRef<Path>) -> Result<Frame, AdapterError> {
    let path = path.as_ref();
    let raw = read_csv(path)?;

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !raw.has_column(c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AdapterError::MissingColumns(missing));
    }

    let cleaned = raw.drop_blank_rows();
    let coerced = coerce_frame(&cleaned, &ledger_schema());
    info!(
        path = %path.display(),
        rows = coerced.n_rows(),
        dropped = raw.n_rows() - cleaned.n_rows(),
        "ledger extract loaded"
    );
    Ok(coerced)
}

/// Load a raw reference table; normalisation happens in the reference
/// store.
pub fn load_reference(path: impl AsRef<Path>) -> Result<Frame, AdapterError> {
    read_csv(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_ledger_coerces_and_drops_blank_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "ledger.csv",
            "entity_code,account,currency,zone,flow_type,intra_group,amount\n\
             RU1,A1,EUR,E01,F10,INTER,150\n\
             ,,,,,,\n\
             RU2,A2,USD,Z02,F10,EXT,not-a-number\n",
        );

        let ledger = load_ledger(&path).unwrap();
        assert_eq!(ledger.n_rows(), 2);
        assert_eq!(ledger.cell(0, "amount").unwrap(), &Cell::Int(150));
        // Unparseable amounts coerce to null rather than failing.
        assert!(ledger.cell(1, "amount").unwrap().is_null());
    }

    #[test]
    fn test_load_ledger_reports_all_missing_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "ledger.csv", "entity_code,account\nRU1,A1\n");

        let err = load_ledger(&path).unwrap_err();
        match err {
            AdapterError::MissingColumns(missing) => {
                assert!(missing.contains(&"currency".to_string()));
                assert!(missing.contains(&"amount".to_string()));
                assert_eq!(missing.len(), 5);
            }
            other => panic!("unexpected: {}", other),
        }
    }

    #[test]
    fn test_csv_roundtrip_preserves_frame() {
        let dir = tempfile::tempdir().unwrap();
        let frame = Frame::from_rows(
            ["account", "note"],
            vec![
                vec!["A1".into(), Cell::Null],
                vec!["A2".into(), "hello".into()],
            ],
        )
        .unwrap();

        let path = dir.path().join("out.csv");
        write_csv(&path, &frame).unwrap();
        let read_back = read_csv(&path).unwrap();
        assert_eq!(read_back, frame);
    }

    #[test]
    fn test_read_missing_file_is_error() {
        assert!(read_csv("/nonexistent/ledger.csv").is_err());
    }
}
