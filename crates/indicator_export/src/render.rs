//! Tabular rendering of frames into archive entry bytes.

use indicator_core::Frame;

use crate::error::ExportError;

/// Serialise a frame as CSV: header row, then one record per row, null
/// cells as empty fields.
pub fn frame_csv_bytes(frame: &Frame) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(frame.columns())
        .map_err(|e| ExportError::Csv(e.to_string()))?;
    for row in frame.rows() {
        let record: Vec<String> = row.iter().map(|cell| cell.to_string()).collect();
        writer
            .write_record(&record)
            .map_err(|e| ExportError::Csv(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicator_core::frame::Cell;

    #[test]
    fn test_csv_rendering() {
        let frame = Frame::from_rows(
            ["entity", "amount", "factor"],
            vec![vec!["E1".into(), Cell::Int(100), Cell::Null]],
        )
        .unwrap();
        let bytes = frame_csv_bytes(&frame).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "entity,amount,factor\nE1,100,\n");
    }
}
