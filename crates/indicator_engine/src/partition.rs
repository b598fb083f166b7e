//! Currency/segment partitioning of the cleaned ledger.
//!
//! Non-granular exports split the ledger by the intra-group marker and
//! then by currency; each currency slice is persisted through a
//! [`SliceStore`] which round-trips the artifact (write, re-read,
//! compare) before the slice is accepted. A slice that fails the
//! round-trip is discarded and its currency dropped from the partition,
//! the run continues.
//!
//! The granular mode bypasses slicing entirely: it filters to one
//! required currency, applies the same intra-group predicate as an
//! "indicator view", and persists nothing.

use std::path::PathBuf;

use indicator_core::frame::Frame;
use indicator_core::ledger::{CURRENCY, INTRA_GROUP, INTRA_GROUP_MARKER};
use indicator_core::{Currency, CurrencyScope, ExportType, Segment};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::EngineError;

/// Persistence seam for intermediate currency slices.
///
/// Implementations write the slice, read it back and compare; the
/// returned frame is the re-read copy, so pipelines consume exactly
/// what was persisted.
pub trait SliceStore: Send + Sync {
    /// Persist and verify one slice under the given artifact name.
    fn persist(&self, name: &str, frame: &Frame) -> Result<(PathBuf, Frame), SliceStoreError>;
}

/// Errors surfaced by a [`SliceStore`].
#[derive(Debug, Error)]
pub enum SliceStoreError {
    /// The re-read artifact did not match what was written
    #[error("artifact '{path}' failed write/read verification")]
    Corrupted { path: String },

    /// Underlying I/O failure
    #[error("slice store i/o: {0}")]
    Io(String),
}

/// One partitioned ledger slice, ready for the pipelines.
#[derive(Debug, Clone)]
pub struct LedgerSlice {
    /// Intra-group segment the slice belongs to
    pub segment: Segment,
    /// Currency scope of the slice
    pub currency: CurrencyScope,
    /// The slice rows
    pub frame: Frame,
    /// Path of the verified intermediate artifact, when persisted
    pub artifact: Option<PathBuf>,
}

/// Splits a cleaned ledger into the slices an export type requires.
pub struct Partitioner<'a> {
    ledger: &'a Frame,
    intra_idx: usize,
    currency_idx: usize,
}

impl<'a> Partitioner<'a> {
    /// Wrap a cleaned ledger; the intra-group and currency columns must
    /// be present.
    pub fn new(ledger: &'a Frame) -> Result<Partitioner<'a>, EngineError> {
        let intra_idx = ledger
            .column_index(INTRA_GROUP)
            .map_err(|e| EngineError::at_stage("partition", e))?;
        let currency_idx = ledger
            .column_index(CURRENCY)
            .map_err(|e| EngineError::at_stage("partition", e))?;
        Ok(Partitioner {
            ledger,
            intra_idx,
            currency_idx,
        })
    }

    /// The segments an export type materialises.
    ///
    /// The coarsest mode produces both intra-group partitions as
    /// intermediates in addition to the full set.
    pub fn segments_for(export: ExportType) -> Vec<Segment> {
        match export {
            ExportType::All => vec![Segment::Bilan, Segment::Conso, Segment::All],
            ExportType::Bilan => vec![Segment::Bilan],
            ExportType::Conso => vec![Segment::Conso],
            ExportType::Gran => Vec::new(),
        }
    }

    fn segment_frame(&self, segment: Segment) -> Frame {
        let idx = self.intra_idx;
        match segment {
            Segment::All => self.ledger.clone(),
            Segment::Bilan => self
                .ledger
                .filter_rows(|row| row[idx].text() == Some(INTRA_GROUP_MARKER)),
            Segment::Conso => self
                .ledger
                .filter_rows(|row| row[idx].text() != Some(INTRA_GROUP_MARKER)),
        }
    }

    fn currency_frame(&self, frame: &Frame, scope: CurrencyScope) -> Frame {
        match scope {
            CurrencyScope::All => frame.clone(),
            CurrencyScope::One(currency) => {
                let idx = self.currency_idx;
                frame.filter_rows(|row| row[idx].text() == Some(currency.code()))
            }
        }
    }

    /// Partition for a non-granular export, persisting every currency
    /// slice as a verified intermediate artifact.
    pub fn partition(
        &self,
        export: ExportType,
        store: &dyn SliceStore,
    ) -> Result<Vec<LedgerSlice>, EngineError> {
        if export == ExportType::Gran {
            return Err(EngineError::configuration(
                "granular exports partition through Partitioner::granular",
            ));
        }

        let mut slices = Vec::new();
        for segment in Self::segments_for(export) {
            let segment_frame = self.segment_frame(segment);
            for scope in CurrencyScope::report_order() {
                let frame = self.currency_frame(&segment_frame, scope);
                if frame.is_empty() {
                    info!(segment = %segment, currency = %scope, "no rows, slice dropped");
                    continue;
                }
                let name = format!("LEDGER_{}_{}", segment.label(), scope.label());
                match store.persist(&name, &frame) {
                    Ok((path, verified)) => slices.push(LedgerSlice {
                        segment,
                        currency: scope,
                        frame: verified,
                        artifact: Some(path),
                    }),
                    Err(err) => {
                        warn!(
                            segment = %segment,
                            currency = %scope,
                            error = %err,
                            "slice artifact rejected, currency dropped"
                        );
                    }
                }
            }
        }
        Ok(slices)
    }

    /// Partition for a granular export: one slice, one currency, the
    /// indicator view applied, nothing persisted.
    pub fn granular(
        &self,
        currency: Option<Currency>,
        view: Segment,
    ) -> Result<LedgerSlice, EngineError> {
        let currency = currency.ok_or_else(|| {
            EngineError::configuration("a granular export requires a specific currency")
        })?;
        let scope = CurrencyScope::One(currency);
        let by_currency = self.currency_frame(self.ledger, scope);
        let frame = match view {
            Segment::All => by_currency,
            Segment::Bilan => {
                let idx = self.intra_idx;
                by_currency.filter_rows(|row| row[idx].text() == Some(INTRA_GROUP_MARKER))
            }
            Segment::Conso => {
                let idx = self.intra_idx;
                by_currency.filter_rows(|row| row[idx].text() != Some(INTRA_GROUP_MARKER))
            }
        };
        Ok(LedgerSlice {
            segment: view,
            currency: scope,
            frame,
            artifact: None,
        })
    }
}
