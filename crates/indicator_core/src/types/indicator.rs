//! The five regulatory indicator families.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Indicator family identifier.
///
/// The name doubles as the artifact filename prefix, so it is part of
/// the export contract consumed by the occurrence tally.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndicatorKind {
    /// Liquidity coverage ratio
    Lcr,
    /// Net stable funding ratio
    Nsfr,
    /// Additional liquidity monitoring metrics
    Almm,
    /// Quantitative impact study
    Qis,
    /// Annual earnings report
    Aer,
}

impl IndicatorKind {
    /// All indicator families, in reporting order.
    pub const ALL: [IndicatorKind; 5] = [
        IndicatorKind::Lcr,
        IndicatorKind::Nsfr,
        IndicatorKind::Almm,
        IndicatorKind::Qis,
        IndicatorKind::Aer,
    ];

    /// Artifact filename prefix.
    pub fn name(&self) -> &'static str {
        match self {
            IndicatorKind::Lcr => "LCR",
            IndicatorKind::Nsfr => "NSFR",
            IndicatorKind::Almm => "ALMM",
            IndicatorKind::Qis => "QIS",
            IndicatorKind::Aer => "AER",
        }
    }
}

impl FromStr for IndicatorKind {
    type Err = UnknownIndicator;

    fn from_str(s: &str) -> Result<Self, UnknownIndicator> {
        match s.to_uppercase().as_str() {
            "LCR" => Ok(IndicatorKind::Lcr),
            "NSFR" => Ok(IndicatorKind::Nsfr),
            "ALMM" => Ok(IndicatorKind::Almm),
            "QIS" => Ok(IndicatorKind::Qis),
            "AER" => Ok(IndicatorKind::Aer),
            _ => Err(UnknownIndicator(s.to_string())),
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error for unrecognised indicator names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown indicator '{0}', expected LCR, NSFR, ALMM, QIS or AER")]
pub struct UnknownIndicator(pub String);
