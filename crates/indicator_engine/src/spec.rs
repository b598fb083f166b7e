//! Declarative indicator family descriptions.
//!
//! The five regulatory families run through one pipeline skeleton; an
//! [`IndicatorSpec`] captures everything that varies between them as
//! data — column prefixes, the bucket dimension, the flow/stock
//! weighting and the unmatched-line policy.

use indicator_core::IndicatorKind;

/// Time-horizon buckets of the bucketed families, in canonical column
/// order.
pub const BUCKETS: [&str; 3] = ["0-6M", "6-12M", ">1Y"];

/// Name of the summed amount column before adjustment.
pub const UNADJUSTED_COL: &str = "unadjusted_amount";
/// Name of the adjusted amount column of single-factor families.
pub const ADJUSTED_COL: &str = "adjusted_amount";

/// Everything that distinguishes one indicator family from another.
#[derive(Debug, Clone)]
pub struct IndicatorSpec {
    kind: IndicatorKind,
    bucketed: bool,
    flow_stock_weighting: bool,
    drop_unmatched_lines: bool,
    account_col: String,
    line_col: String,
    flow_pct_col: String,
    stock_pct_col: String,
    adf_entity_col: String,
    adf_account_col: String,
    adf_line_col: String,
    factor_col: String,
}

impl IndicatorSpec {
    /// The spec for one indicator family.
    pub fn for_kind(kind: IndicatorKind) -> IndicatorSpec {
        let (bucketed, flow_stock_weighting, drop_unmatched_lines) = match kind {
            IndicatorKind::Lcr => (false, true, true),
            IndicatorKind::Nsfr => (true, false, false),
            IndicatorKind::Almm => (true, false, false),
            IndicatorKind::Qis => (true, false, false),
            IndicatorKind::Aer => (false, false, true),
        };
        let prefix = format!("ref_{}", kind.name().to_lowercase());
        let adf_prefix = format!("ref_adf_{}", kind.name().to_lowercase());
        IndicatorSpec {
            kind,
            bucketed,
            flow_stock_weighting,
            drop_unmatched_lines,
            account_col: format!("{}.account", prefix),
            line_col: format!("{}.line", prefix),
            flow_pct_col: format!("{}.flow_pct", prefix),
            stock_pct_col: format!("{}.stock_pct", prefix),
            adf_entity_col: format!("{}.entity_code", adf_prefix),
            adf_account_col: format!("{}.account", adf_prefix),
            adf_line_col: format!("{}.line", adf_prefix),
            factor_col: format!("{}.factor", adf_prefix),
        }
    }

    /// Specs for every family, in reporting order.
    pub fn all() -> Vec<IndicatorSpec> {
        IndicatorKind::ALL.iter().map(|k| Self::for_kind(*k)).collect()
    }

    /// The family this spec describes.
    pub fn kind(&self) -> IndicatorKind {
        self.kind
    }

    /// Whether amounts split over time buckets and pivot.
    pub fn bucketed(&self) -> bool {
        self.bucketed
    }

    /// Whether amounts are weighted by flow/stock percentages per zone.
    pub fn flow_stock_weighting(&self) -> bool {
        self.flow_stock_weighting
    }

    /// Whether rows without a recognised line are dropped at the
    /// line-table join.
    pub fn drop_unmatched_lines(&self) -> bool {
        self.drop_unmatched_lines
    }

    /// Join key of the family's line table.
    pub fn account_col(&self) -> &str {
        &self.account_col
    }

    /// Line label assigned by the family's line table.
    pub fn line_col(&self) -> &str {
        &self.line_col
    }

    /// Flow weighting percentage (LCR only).
    pub fn flow_pct_col(&self) -> &str {
        &self.flow_pct_col
    }

    /// Stock weighting percentage (LCR only).
    pub fn stock_pct_col(&self) -> &str {
        &self.stock_pct_col
    }

    /// Entity bookkeeping column of the adjustment table.
    pub fn adf_entity_col(&self) -> &str {
        &self.adf_entity_col
    }

    /// Account join key of the adjustment table.
    pub fn adf_account_col(&self) -> &str {
        &self.adf_account_col
    }

    /// Line join key of the adjustment table.
    pub fn adf_line_col(&self) -> &str {
        &self.adf_line_col
    }

    /// Single adjustment factor column.
    pub fn factor_col(&self) -> &str {
        &self.factor_col
    }

    /// Per-bucket adjustment factor column.
    pub fn bucket_factor_col(&self, bucket: &str) -> String {
        format!("{}_{}", self.factor_col, bucket)
    }

    /// Per-bucket adjusted amount column.
    pub fn adjusted_bucket_col(&self, bucket: &str) -> String {
        format!("adjusted_{}", bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcr_spec_shape() {
        let spec = IndicatorSpec::for_kind(IndicatorKind::Lcr);
        assert!(!spec.bucketed());
        assert!(spec.flow_stock_weighting());
        assert!(spec.drop_unmatched_lines());
        assert_eq!(spec.line_col(), "ref_lcr.line");
        assert_eq!(spec.factor_col(), "ref_adf_lcr.factor");
    }

    #[test]
    fn test_bucketed_families() {
        for kind in [IndicatorKind::Nsfr, IndicatorKind::Almm, IndicatorKind::Qis] {
            let spec = IndicatorSpec::for_kind(kind);
            assert!(spec.bucketed());
            assert!(!spec.flow_stock_weighting());
            assert!(!spec.drop_unmatched_lines());
        }
    }

    #[test]
    fn test_aer_single_factor() {
        let spec = IndicatorSpec::for_kind(IndicatorKind::Aer);
        assert!(!spec.bucketed());
        assert!(spec.drop_unmatched_lines());
        assert_eq!(spec.bucket_factor_col("0-6M"), "ref_adf_aer.factor_0-6M");
        assert_eq!(spec.adjusted_bucket_col(">1Y"), "adjusted_>1Y");
    }

    #[test]
    fn test_all_covers_five_families() {
        assert_eq!(IndicatorSpec::all().len(), 5);
    }
}
