//! Canonical ledger extract schema.
//!
//! Column names and sentinel values of the consolidation extract the
//! indicator pipelines consume. The descriptive columns travel through
//! the intermediate slices untouched; only the columns named here are
//! read by the core.

use crate::schema::{ColumnKind, Schema};

/// Reporting-unit key of the booking entity.
pub const ENTITY_CODE: &str = "entity_code";
/// Transformation account code.
pub const ACCOUNT: &str = "account";
/// ISO currency code of the position.
pub const CURRENCY: &str = "currency";
/// Liquidity zone code.
pub const ZONE: &str = "zone";
/// Flow type code.
pub const FLOW_TYPE: &str = "flow_type";
/// Intra-group marker distinguishing internal from external business.
pub const INTRA_GROUP: &str = "intra_group";
/// Signed position amount, integer-valued in reporting currency units.
pub const AMOUNT: &str = "amount";

/// Descriptive columns carried through slices but unused by the core.
pub const PERIOD: &str = "period";
pub const ENTITY_LABEL: &str = "entity_label";
pub const COMMENT: &str = "comment";

/// Intra-group sentinel: rows carrying it belong to the BILAN partition.
pub const INTRA_GROUP_MARKER: &str = "INTER";
/// Technical flow type excluded from every indicator.
pub const TECHNICAL_FLOW_TYPE: &str = "T99";
/// Zone whose positions are weighted with the flow percentage.
pub const FLOW_ZONE: &str = "E01";

/// Columns that must be present in an extract.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    ENTITY_CODE,
    ACCOUNT,
    CURRENCY,
    ZONE,
    FLOW_TYPE,
    INTRA_GROUP,
    AMOUNT,
];

/// Coercion schema for the ledger extract.
pub fn ledger_schema() -> Schema {
    Schema::new([
        (ENTITY_CODE, ColumnKind::Text),
        (ACCOUNT, ColumnKind::Text),
        (CURRENCY, ColumnKind::Text),
        (ZONE, ColumnKind::Text),
        (FLOW_TYPE, ColumnKind::Text),
        (INTRA_GROUP, ColumnKind::Text),
        (AMOUNT, ColumnKind::Int),
        (PERIOD, ColumnKind::Float),
        (ENTITY_LABEL, ColumnKind::Text),
        (COMMENT, ColumnKind::Text),
    ])
}
