//! Intermediate slice persistence with write/reread verification.
//!
//! Each currency slice is written to the imports directory, read back
//! and compared against what was written. A mismatch marks the artifact
//! corrupted: the file is removed and the currency dropped from the
//! partition. The verified re-read copy is what the pipelines consume.

use std::path::{Path, PathBuf};

use indicator_core::frame::Frame;
use indicator_core::ledger::ledger_schema;
use indicator_core::schema::coerce_frame;
use indicator_engine::{SliceStore, SliceStoreError};
use tracing::{info, warn};

use crate::loader::{read_csv, write_csv};

/// Filesystem-backed slice store writing CSV artifacts.
pub struct CsvSliceStore {
    dir: PathBuf,
}

impl CsvSliceStore {
    /// Create the store, making the directory as needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<CsvSliceStore, std::io::Error> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(CsvSliceStore { dir })
    }

    /// Where artifacts are written.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SliceStore for CsvSliceStore {
    fn persist(&self, name: &str, frame: &Frame) -> Result<(PathBuf, Frame), SliceStoreError> {
        let path = self.dir.join(format!("{}.csv", name));
        write_csv(&path, frame).map_err(|e| SliceStoreError::Io(e.to_string()))?;

        let raw = match read_csv(&path) {
            Ok(raw) => raw,
            Err(err) => {
                let _ = std::fs::remove_file(&path);
                return Err(SliceStoreError::Io(err.to_string()));
            }
        };
        let verified = coerce_frame(&raw, &ledger_schema());
        if &verified != frame {
            warn!(path = %path.display(), "slice artifact corrupted, removing");
            let _ = std::fs::remove_file(&path);
            return Err(SliceStoreError::Corrupted {
                path: path.display().to_string(),
            });
        }

        info!(path = %path.display(), rows = verified.n_rows(), "slice artifact verified");
        Ok((path, verified))
    }
}
