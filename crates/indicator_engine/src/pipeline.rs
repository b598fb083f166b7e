//! The staged indicator computation pipeline.
//!
//! One skeleton serves all five families: filter and enrich the ledger
//! slice with reference tables, aggregate, optionally pivot the time
//! buckets, then apply adjustment factors. An [`IndicatorSpec`] toggles
//! and parametrises the stages.
//!
//! Any stage that finds a required column absent fails the whole
//! invocation with a stage-tagged [`EngineError::MissingColumn`]; no
//! partial result is emitted. An empty frame after one of the filtering
//! stages is not an error and short-circuits to an empty result, which
//! the export layer skips silently.

use indicator_core::frame::{Cell, Frame};
use indicator_core::ledger::{
    ACCOUNT, AMOUNT, ENTITY_CODE, FLOW_TYPE, FLOW_ZONE, TECHNICAL_FLOW_TYPE, ZONE,
};
use indicator_core::IndicatorKind;
use tracing::debug;

use crate::error::EngineError;
use crate::refs::{
    ReferenceStore, ENTITY_KEY_COL, ENTITY_NAME_COL, TRANSFO_KEY_COL, ZONE_BUCKET_COL,
    ZONE_KEY_COL,
};
use crate::spec::{IndicatorSpec, ADJUSTED_COL, BUCKETS, UNADJUSTED_COL};

const STAGE_ENTITY: &str = "entity_filter_join";
const STAGE_TRANSFO: &str = "transformation_join";
const STAGE_ZONE: &str = "zone_bucket_join";
const STAGE_LINE: &str = "line_join";
const STAGE_WEIGHTING: &str = "amount_weighting";
const STAGE_AGGREGATION: &str = "aggregation";
const STAGE_PIVOT: &str = "pivot";
const STAGE_ADJUSTMENT: &str = "adjustment";

/// Finished table of one indicator family over one ledger slice.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    kind: IndicatorKind,
    frame: Frame,
}

impl PipelineResult {
    /// Wrap a finished frame.
    pub fn new(kind: IndicatorKind, frame: Frame) -> PipelineResult {
        PipelineResult { kind, frame }
    }

    /// The empty result produced when filtering leaves no rows.
    pub fn empty(kind: IndicatorKind) -> PipelineResult {
        let frame = Frame::new(Vec::<String>::new()).expect("no columns, no duplicates");
        PipelineResult { kind, frame }
    }

    /// The family that produced this result.
    pub fn kind(&self) -> IndicatorKind {
        self.kind
    }

    /// The result table.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Whether the result carries no rows.
    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }

    /// Distinct entity names present, in row order.
    pub fn entity_values(&self) -> Result<Vec<String>, EngineError> {
        let idx = self
            .frame
            .column_index(ENTITY_NAME_COL)
            .map_err(EngineError::Frame)?;
        let mut seen = Vec::new();
        for row in self.frame.rows() {
            if let Some(name) = row[idx].text() {
                if !seen.iter().any(|s| s == name) {
                    seen.push(name.to_string());
                }
            }
        }
        Ok(seen)
    }

    /// The subset of rows belonging to one entity.
    pub fn subset_for_entity(&self, entity: &str) -> Result<Frame, EngineError> {
        let idx = self
            .frame
            .column_index(ENTITY_NAME_COL)
            .map_err(EngineError::Frame)?;
        Ok(self.frame.filter_rows(|row| row[idx].text() == Some(entity)))
    }
}

/// Run one indicator family over one ledger slice.
pub fn run(
    slice: &Frame,
    spec: &IndicatorSpec,
    refs: &ReferenceStore,
) -> Result<PipelineResult, EngineError> {
    let frame = entity_filter_join(slice, refs)?;
    if frame.is_empty() {
        debug!(indicator = %spec.kind(), "empty after entity filter");
        return Ok(PipelineResult::empty(spec.kind()));
    }

    let frame = transformation_join(&frame, refs)?;
    if frame.is_empty() {
        debug!(indicator = %spec.kind(), "empty after transformation join");
        return Ok(PipelineResult::empty(spec.kind()));
    }

    let frame = if spec.bucketed() {
        zone_bucket_join(&frame, refs)?
    } else {
        frame
    };

    let frame = line_join(&frame, spec, refs)?;
    if frame.is_empty() {
        debug!(indicator = %spec.kind(), "empty after line join");
        return Ok(PipelineResult::empty(spec.kind()));
    }

    let frame = weighted_amounts(&frame, spec)?;
    let frame = aggregate(&frame, spec)?;
    let frame = if spec.bucketed() {
        pivot_buckets(&frame, spec)?
    } else {
        frame
    };
    let frame = apply_adjustments(&frame, spec, refs)?;

    debug!(indicator = %spec.kind(), rows = frame.n_rows(), "pipeline complete");
    Ok(PipelineResult::new(spec.kind(), frame))
}

/// Stage 1: drop technical flows and unset zones, join the entity map.
fn entity_filter_join(slice: &Frame, refs: &ReferenceStore) -> Result<Frame, EngineError> {
    let flow_idx = slice
        .column_index(FLOW_TYPE)
        .map_err(|e| EngineError::at_stage(STAGE_ENTITY, e))?;
    let zone_idx = slice
        .column_index(ZONE)
        .map_err(|e| EngineError::at_stage(STAGE_ENTITY, e))?;

    let filtered = slice.filter_rows(|row| {
        row[flow_idx].text() != Some(TECHNICAL_FLOW_TYPE) && !row[zone_idx].is_null()
    });
    filtered
        .left_join(refs.entities(), &[ENTITY_CODE], &[ENTITY_KEY_COL])
        .map_err(|e| EngineError::at_stage(STAGE_ENTITY, e))
}

/// Stage 2: join the transformation map, then drop unmatched rows.
///
/// Join first, filter second: later stages see the joined column set.
fn transformation_join(frame: &Frame, refs: &ReferenceStore) -> Result<Frame, EngineError> {
    let joined = frame
        .left_join(refs.transformations(), &[ACCOUNT], &[TRANSFO_KEY_COL])
        .map_err(|e| EngineError::at_stage(STAGE_TRANSFO, e))?;
    joined
        .drop_null_rows(TRANSFO_KEY_COL)
        .map_err(|e| EngineError::at_stage(STAGE_TRANSFO, e))
}

/// Stage 3 (bucketed families): join the zone-to-bucket map.
fn zone_bucket_join(frame: &Frame, refs: &ReferenceStore) -> Result<Frame, EngineError> {
    frame
        .left_join(refs.zone_buckets()?, &[ZONE], &[ZONE_KEY_COL])
        .map_err(|e| EngineError::at_stage(STAGE_ZONE, e))
}

/// Stage 4: join the family line table; LCR and AER additionally drop
/// unmatched rows, the bucketed families leave them for the pivot to
/// discard.
fn line_join(
    frame: &Frame,
    spec: &IndicatorSpec,
    refs: &ReferenceStore,
) -> Result<Frame, EngineError> {
    let lines = refs.lines(spec.kind())?;
    let joined = frame
        .left_join(lines, &[ACCOUNT], &[spec.account_col()])
        .map_err(|e| EngineError::at_stage(STAGE_LINE, e))?;
    if spec.drop_unmatched_lines() {
        joined
            .drop_null_rows(spec.line_col())
            .map_err(|e| EngineError::at_stage(STAGE_LINE, e))
    } else {
        Ok(joined)
    }
}

/// Stage 5: derive the unadjusted amount per row.
///
/// LCR weights the amount with the flow percentage in the designated
/// flow zone and the stock percentage elsewhere; every other family
/// carries the raw amount forward.
fn weighted_amounts(frame: &Frame, spec: &IndicatorSpec) -> Result<Frame, EngineError> {
    let amount_idx = frame
        .column_index(AMOUNT)
        .map_err(|e| EngineError::at_stage(STAGE_WEIGHTING, e))?;

    let values: Vec<Cell> = if spec.flow_stock_weighting() {
        let zone_idx = frame
            .column_index(ZONE)
            .map_err(|e| EngineError::at_stage(STAGE_WEIGHTING, e))?;
        let flow_idx = frame
            .column_index(spec.flow_pct_col())
            .map_err(|e| EngineError::at_stage(STAGE_WEIGHTING, e))?;
        let stock_idx = frame
            .column_index(spec.stock_pct_col())
            .map_err(|e| EngineError::at_stage(STAGE_WEIGHTING, e))?;
        frame
            .rows()
            .map(|row| {
                let pct = if row[zone_idx].text() == Some(FLOW_ZONE) {
                    &row[flow_idx]
                } else {
                    &row[stock_idx]
                };
                mul_cells(&row[amount_idx], pct)
            })
            .collect()
    } else {
        frame.rows().map(|row| row[amount_idx].clone()).collect()
    };

    let mut out = frame.clone();
    out.add_column(UNADJUSTED_COL, values)
        .map_err(EngineError::Frame)?;
    Ok(out)
}

/// Stage 6: group and sum into the unadjusted amount column.
fn aggregate(frame: &Frame, spec: &IndicatorSpec) -> Result<Frame, EngineError> {
    let keys: Vec<&str> = if spec.bucketed() {
        vec![ENTITY_NAME_COL, ACCOUNT, ZONE_BUCKET_COL, spec.line_col()]
    } else {
        vec![ENTITY_NAME_COL, ACCOUNT, spec.line_col()]
    };
    frame
        .group_sum(&keys, UNADJUSTED_COL, UNADJUSTED_COL)
        .map_err(|e| EngineError::at_stage(STAGE_AGGREGATION, e))
}

/// Stage 7 (bucketed families): one column per time bucket, absent
/// combinations filled with zero, canonical column order.
fn pivot_buckets(frame: &Frame, spec: &IndicatorSpec) -> Result<Frame, EngineError> {
    frame
        .pivot(
            &[ENTITY_NAME_COL, ACCOUNT, spec.line_col()],
            ZONE_BUCKET_COL,
            UNADJUSTED_COL,
            &BUCKETS,
        )
        .map_err(|e| EngineError::at_stage(STAGE_PIVOT, e))
}

/// Stage 8: join the adjustment table and multiply the factors in.
///
/// An unmatched factor leaves the adjusted amount null, never zero and
/// never the unadjusted value.
fn apply_adjustments(
    frame: &Frame,
    spec: &IndicatorSpec,
    refs: &ReferenceStore,
) -> Result<Frame, EngineError> {
    let adf = refs.adjustments(spec.kind())?;
    let joined = frame
        .left_join(
            adf,
            &[ACCOUNT, spec.line_col()],
            &[spec.adf_account_col(), spec.adf_line_col()],
        )
        .map_err(|e| EngineError::at_stage(STAGE_ADJUSTMENT, e))?;

    if spec.bucketed() {
        let mut out = joined;
        for bucket in BUCKETS {
            let factor_col = spec.bucket_factor_col(bucket);
            let bucket_idx = out
                .column_index(bucket)
                .map_err(|e| EngineError::at_stage(STAGE_ADJUSTMENT, e))?;
            let factor_idx = out
                .column_index(&factor_col)
                .map_err(|e| EngineError::at_stage(STAGE_ADJUSTMENT, e))?;
            let values: Vec<Cell> = out
                .rows()
                .map(|row| mul_cells(&row[bucket_idx], &row[factor_idx]))
                .collect();
            out.add_column(spec.adjusted_bucket_col(bucket), values)
                .map_err(EngineError::Frame)?;
        }
        // The adjustment table's key and single-factor columns are
        // bookkeeping; only the per-bucket factors stay in the result.
        Ok(out.drop_columns(&[
            spec.adf_entity_col(),
            spec.adf_account_col(),
            spec.adf_line_col(),
            spec.factor_col(),
        ]))
    } else {
        let unadjusted_idx = joined
            .column_index(UNADJUSTED_COL)
            .map_err(|e| EngineError::at_stage(STAGE_ADJUSTMENT, e))?;
        let factor_idx = joined
            .column_index(spec.factor_col())
            .map_err(|e| EngineError::at_stage(STAGE_ADJUSTMENT, e))?;
        let values: Vec<Cell> = joined
            .rows()
            .map(|row| mul_cells(&row[unadjusted_idx], &row[factor_idx]))
            .collect();
        let mut out = joined;
        out.add_column(ADJUSTED_COL, values)
            .map_err(EngineError::Frame)?;
        Ok(out)
    }
}

/// Multiply two cells, propagating null.
fn mul_cells(a: &Cell, b: &Cell) -> Cell {
    match (a, b) {
        (Cell::Int(x), Cell::Int(y)) => Cell::Int(x * y),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Cell::Float(x * y),
            _ => Cell::Null,
        },
    }
}
