//! The run archive: a gzip-compressed tar written incrementally.
//!
//! The archive is the one resource shared by all concurrently running
//! pipelines. Appends go through a single mutex-owned builder, making
//! open-append-close a critical section per entry; workers never hold
//! independent handles on the underlying file. Entries are write-once:
//! a duplicate path is rejected rather than silently shadowed.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::info;

use crate::error::ExportError;

struct ArchiveInner {
    builder: tar::Builder<GzEncoder<BufWriter<File>>>,
    entries: Vec<String>,
}

/// A run's output archive.
pub struct Archive {
    path: PathBuf,
    inner: Mutex<ArchiveInner>,
}

impl Archive {
    /// Create the archive file; parent directories are created as
    /// needed.
    pub fn create(path: impl AsRef<Path>) -> Result<Archive, ExportError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&path)?;
        let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        Ok(Archive {
            path,
            inner: Mutex::new(ArchiveInner {
                builder: tar::Builder::new(encoder),
                entries: Vec::new(),
            }),
        })
    }

    /// Where the archive is being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry; the whole write happens under the lock.
    pub fn append_bytes(&self, entry: &str, bytes: &[u8]) -> Result<(), ExportError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.entries.iter().any(|e| e == entry) {
            return Err(ExportError::DuplicateEntry(entry.to_string()));
        }
        let mut header = tar::Header::new_gnu();
        header.set_size(bytes.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        inner.builder.append_data(&mut header, entry, bytes)?;
        inner.entries.push(entry.to_string());
        Ok(())
    }

    /// Snapshot of the entry names, in append order.
    pub fn entries(&self) -> Vec<String> {
        self.inner.lock().unwrap().entries.clone()
    }

    /// Number of entries written so far.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flush everything and close the archive.
    pub fn finish(self) -> Result<PathBuf, ExportError> {
        let inner = self.inner.into_inner().unwrap();
        let encoder = inner.builder.into_inner()?;
        let mut writer = encoder.finish()?;
        use std::io::Write;
        writer.flush()?;
        info!(path = %self.path.display(), entries = inner.entries.len(), "archive finished");
        Ok(self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;

    fn read_entry_names(path: &Path) -> Vec<String> {
        let file = File::open(path).unwrap();
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_append_and_finish_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = Archive::create(dir.path().join("run.tar.gz")).unwrap();

        archive.append_bytes("RUN_X/EUR/a.csv", b"col\n1\n").unwrap();
        archive.append_bytes("RUN_X/EUR/b.csv", b"col\n2\n").unwrap();
        assert_eq!(archive.len(), 2);

        let path = archive.finish().unwrap();
        assert_eq!(
            read_entry_names(&path),
            vec!["RUN_X/EUR/a.csv", "RUN_X/EUR/b.csv"]
        );
    }

    #[test]
    fn test_duplicate_entry_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let archive = Archive::create(dir.path().join("run.tar.gz")).unwrap();

        archive.append_bytes("RUN_X/a.csv", b"x").unwrap();
        let err = archive.append_bytes("RUN_X/a.csv", b"y").unwrap_err();
        assert!(matches!(err, ExportError::DuplicateEntry(_)));
        // The first write survives.
        assert_eq!(archive.entries(), vec!["RUN_X/a.csv"]);
    }

    #[test]
    fn test_concurrent_appends_serialise() {
        let dir = tempfile::tempdir().unwrap();
        let archive =
            std::sync::Arc::new(Archive::create(dir.path().join("run.tar.gz")).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let archive = archive.clone();
                std::thread::spawn(move || {
                    archive
                        .append_bytes(&format!("RUN_X/file_{}.csv", i), b"data")
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(archive.len(), 8);
        let archive = std::sync::Arc::into_inner(archive).unwrap();
        let path = archive.finish().unwrap();
        assert_eq!(read_entry_names(&path).len(), 8);
    }

    #[test]
    fn test_long_entry_paths_survive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = Archive::create(dir.path().join("run.tar.gz")).unwrap();

        let entry = format!(
            "RUN_2026_01_01_00_00_00_BILAN/EUR/Reports_by_entity/{}/LCR_BILAN_EUR_{}.csv",
            "SG EQUIPMENT FINANCE CZECH REPUBLIC", "SG EQUIPMENT FINANCE CZECH REPUBLIC"
        );
        archive.append_bytes(&entry, b"x").unwrap();
        let path = archive.finish().unwrap();
        assert_eq!(read_entry_names(&path), vec![entry]);
    }
}
