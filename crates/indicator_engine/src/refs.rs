//! Reference store: normalised lookup tables shared by all pipelines.
//!
//! Each table is normalised once per run and namespaced with a
//! table-specific column prefix, so that columns joined into the same
//! pipeline never collide. The store is read-only after construction
//! and shared by every concurrent pipeline invocation without locking.

use std::collections::BTreeMap;

use indicator_core::frame::{Cell, Frame};
use indicator_core::schema::{coerce_frame, ColumnKind, Schema};
use indicator_core::IndicatorKind;

use crate::error::EngineError;
use crate::spec::BUCKETS;

/// Entity map join key, after prefixing.
pub const ENTITY_KEY_COL: &str = "ref_entity.entity_code";
/// Entity display name carried into every result.
pub const ENTITY_NAME_COL: &str = "ref_entity.entity_name";
/// Transformation map join key, after prefixing.
pub const TRANSFO_KEY_COL: &str = "ref_transfo.aggregate";
/// Zone map join key, after prefixing.
pub const ZONE_KEY_COL: &str = "ref_zone.zone";
/// Time bucket assigned by the zone map.
pub const ZONE_BUCKET_COL: &str = "ref_zone.bucket";

/// Unprefixed logical column names of the raw reference tables.
mod raw {
    pub const ENTITY_CODE: &str = "entity_code";
    pub const AGGREGATE: &str = "aggregate";
    pub const ACCOUNT: &str = "account";
    pub const LINE: &str = "line";
    pub const FLOW_PCT: &str = "flow_pct";
    pub const STOCK_PCT: &str = "stock_pct";
    pub const FACTOR: &str = "factor";
}

/// Prefix every column of a frame with `<prefix>.`.
fn apply_prefix(frame: &Frame, prefix: &str) -> Frame {
    let columns: Vec<String> = frame
        .columns()
        .iter()
        .map(|c| format!("{}.{}", prefix, c))
        .collect();
    let rows = frame.rows().map(|r| r.to_vec()).collect();
    Frame::from_rows(columns, rows).expect("prefixing preserves column uniqueness")
}

/// Normalised reference tables for one run.
#[derive(Debug, Clone)]
pub struct ReferenceStore {
    entities: Frame,
    transformations: Frame,
    zone_buckets: Option<Frame>,
    lines: BTreeMap<IndicatorKind, Frame>,
    adjustments: BTreeMap<IndicatorKind, Frame>,
}

impl ReferenceStore {
    /// Start building a store from raw (unprefixed) tables.
    pub fn builder() -> ReferenceStoreBuilder {
        ReferenceStoreBuilder::default()
    }

    /// The prefixed entity map.
    pub fn entities(&self) -> &Frame {
        &self.entities
    }

    /// The prefixed transformation map.
    pub fn transformations(&self) -> &Frame {
        &self.transformations
    }

    /// The prefixed zone-to-bucket map; required by bucketed families.
    pub fn zone_buckets(&self) -> Result<&Frame, EngineError> {
        self.zone_buckets
            .as_ref()
            .ok_or_else(|| EngineError::reference("zone-to-bucket map was not loaded"))
    }

    /// The prefixed line table of an indicator family.
    pub fn lines(&self, kind: IndicatorKind) -> Result<&Frame, EngineError> {
        self.lines.get(&kind).ok_or_else(|| {
            EngineError::reference(format!("line table for {} was not loaded", kind))
        })
    }

    /// The prefixed adjustment-factor table of an indicator family.
    pub fn adjustments(&self, kind: IndicatorKind) -> Result<&Frame, EngineError> {
        self.adjustments.get(&kind).ok_or_else(|| {
            EngineError::reference(format!("adjustment table for {} was not loaded", kind))
        })
    }
}

/// Builder applying the per-table normalisation rules.
#[derive(Debug, Default)]
pub struct ReferenceStoreBuilder {
    entities: Option<Frame>,
    transformations: Option<Frame>,
    zone_buckets: Option<Frame>,
    lines: BTreeMap<IndicatorKind, Frame>,
    adjustments: BTreeMap<IndicatorKind, Frame>,
}

impl ReferenceStoreBuilder {
    /// Entity map: rows with a null entity key are dropped.
    pub fn entities(mut self, raw: Frame) -> Result<Self, EngineError> {
        let cleaned = raw
            .drop_null_rows(raw::ENTITY_CODE)
            .map_err(|e| EngineError::reference(format!("entity map: {}", e)))?;
        self.entities = Some(apply_prefix(&cleaned, "ref_entity"));
        Ok(self)
    }

    /// Transformation map: the key is coerced to text and deduplicated,
    /// keeping the first occurrence.
    pub fn transformations(mut self, raw: Frame) -> Result<Self, EngineError> {
        let coerced = coerce_frame(&raw, &Schema::new([(raw::AGGREGATE, ColumnKind::Text)]));
        let key_idx = coerced
            .column_index(raw::AGGREGATE)
            .map_err(|e| EngineError::reference(format!("transformation map: {}", e)))?;
        let mut seen: Vec<String> = Vec::new();
        let deduped = coerced.filter_rows(|row| match row[key_idx].key() {
            Some(key) if seen.contains(&key) => false,
            Some(key) => {
                seen.push(key);
                true
            }
            None => false,
        });
        self.transformations = Some(apply_prefix(&deduped, "ref_transfo"));
        Ok(self)
    }

    /// Zone-to-bucket map: the first two columns are renamed to
    /// (zone, bucket) and the first data row is skipped; the source
    /// sheet repeats its header there.
    pub fn zone_buckets(mut self, raw: Frame) -> Result<Self, EngineError> {
        if raw.columns().len() < 2 {
            return Err(EngineError::reference(
                "zone-to-bucket map needs at least two columns",
            ));
        }
        let mut columns: Vec<String> = raw.columns().to_vec();
        columns[0] = "zone".to_string();
        columns[1] = "bucket".to_string();
        let rows: Vec<Vec<Cell>> = raw.rows().skip(1).map(|r| r.to_vec()).collect();
        let renamed = Frame::from_rows(columns, rows)
            .map_err(|e| EngineError::reference(format!("zone-to-bucket map: {}", e)))?;
        let coerced = coerce_frame(
            &renamed,
            &Schema::new([("zone", ColumnKind::Text), ("bucket", ColumnKind::Text)]),
        );
        self.zone_buckets = Some(apply_prefix(&coerced, "ref_zone"));
        Ok(self)
    }

    /// Indicator line table: rows with a null line label are dropped,
    /// the LCR weighting percentages are coerced to floats.
    pub fn lines(mut self, kind: IndicatorKind, raw: Frame) -> Result<Self, EngineError> {
        let coerced = coerce_frame(
            &raw,
            &Schema::new([
                (raw::ACCOUNT, ColumnKind::Text),
                (raw::LINE, ColumnKind::Text),
                (raw::FLOW_PCT, ColumnKind::Float),
                (raw::STOCK_PCT, ColumnKind::Float),
            ]),
        );
        let cleaned = coerced
            .drop_null_rows(raw::LINE)
            .map_err(|e| EngineError::reference(format!("{} line table: {}", kind, e)))?;
        let prefix = format!("ref_{}", kind.name().to_lowercase());
        self.lines.insert(kind, apply_prefix(&cleaned, &prefix));
        Ok(self)
    }

    /// Adjustment-factor table: factor columns are coerced to numbers,
    /// the literal `NOT APPLICABLE` becoming null.
    pub fn adjustments(mut self, kind: IndicatorKind, raw: Frame) -> Result<Self, EngineError> {
        let mut schema = vec![
            (raw::ENTITY_CODE.to_string(), ColumnKind::Text),
            (raw::ACCOUNT.to_string(), ColumnKind::Text),
            (raw::LINE.to_string(), ColumnKind::Text),
            (raw::FACTOR.to_string(), ColumnKind::Int),
        ];
        for bucket in BUCKETS {
            schema.push((format!("factor_{}", bucket), ColumnKind::Float));
        }
        let coerced = coerce_frame(&raw, &Schema::new(schema));
        let prefix = format!("ref_adf_{}", kind.name().to_lowercase());
        self.adjustments.insert(kind, apply_prefix(&coerced, &prefix));
        Ok(self)
    }

    /// Finalise the store; the entity and transformation maps are
    /// mandatory for every family.
    pub fn build(self) -> Result<ReferenceStore, EngineError> {
        let entities = self
            .entities
            .ok_or_else(|| EngineError::reference("entity map was not loaded"))?;
        let transformations = self
            .transformations
            .ok_or_else(|| EngineError::reference("transformation map was not loaded"))?;
        Ok(ReferenceStore {
            entities,
            transformations,
            zone_buckets: self.zone_buckets,
            lines: self.lines,
            adjustments: self.adjustments,
        })
    }
}
