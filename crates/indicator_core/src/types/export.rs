//! Export run modes and scoping parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Top-level run mode controlling which ledger partitions are produced.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExportType {
    /// Full set, plus both intra-group partitions as intermediates
    All,
    /// Intra-group rows only
    Bilan,
    /// External rows only
    Conso,
    /// Single-entity/single-currency ad-hoc mode
    Gran,
}

impl ExportType {
    /// The path/filename label for this mode.
    pub fn label(&self) -> &'static str {
        match self {
            ExportType::All => "ALL",
            ExportType::Bilan => "BILAN",
            ExportType::Conso => "CONSO",
            ExportType::Gran => "GRAN",
        }
    }
}

impl FromStr for ExportType {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, UnknownMode> {
        match s.to_uppercase().as_str() {
            "ALL" => Ok(ExportType::All),
            "BILAN" => Ok(ExportType::Bilan),
            "CONSO" => Ok(ExportType::Conso),
            "GRAN" => Ok(ExportType::Gran),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for ExportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Error for unrecognised export or view labels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode '{0}', expected ALL, BILAN, CONSO or GRAN")]
pub struct UnknownMode(pub String);

/// The intra-group split applied to a ledger slice.
///
/// Doubles as the "indicator view" selector of the granular mode, which
/// reuses the same predicate without further currency slicing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Segment {
    /// No intra-group filtering
    All,
    /// Rows whose intra-group marker equals the sentinel
    Bilan,
    /// Rows whose intra-group marker differs from the sentinel
    Conso,
}

impl Segment {
    /// The path/filename label for this segment.
    pub fn label(&self) -> &'static str {
        match self {
            Segment::All => "ALL",
            Segment::Bilan => "BILAN",
            Segment::Conso => "CONSO",
        }
    }
}

impl FromStr for Segment {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, UnknownMode> {
        match s.to_uppercase().as_str() {
            "ALL" => Ok(Segment::All),
            "BILAN" => Ok(Segment::Bilan),
            "CONSO" => Ok(Segment::Conso),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Entity scoping for a granular run.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntityScope {
    /// Every canonical entity
    All,
    /// A single named entity
    One(String),
}

impl EntityScope {
    /// Parse the user-facing value, where the literal `ALL` means every
    /// canonical entity.
    pub fn parse(value: &str) -> EntityScope {
        if value.eq_ignore_ascii_case("ALL") {
            EntityScope::All
        } else {
            EntityScope::One(value.to_string())
        }
    }

    /// Resolve against the canonical entity list.
    pub fn resolve<'a>(&'a self, canonical: &'a [String]) -> Vec<&'a str> {
        match self {
            EntityScope::All => canonical.iter().map(String::as_str).collect(),
            EntityScope::One(e) => vec![e.as_str()],
        }
    }
}
