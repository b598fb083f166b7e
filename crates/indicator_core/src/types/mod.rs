//! Shared value types: currencies, run modes, indicator families.

pub mod currency;
pub mod export;
pub mod indicator;

pub use currency::{Currency, CurrencyScope, UnknownCurrency};
pub use export::{EntityScope, ExportType, Segment, UnknownMode};
pub use indicator::{IndicatorKind, UnknownIndicator};
