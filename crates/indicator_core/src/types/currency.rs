//! Currency codes recognised by the reporting ledger.
//!
//! The extract carries ISO 4217 codes; only the currencies for which
//! dedicated report slices exist are modelled as variants. Everything
//! else stays in the unfiltered `ALL` slice.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Currencies with a dedicated report slice.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Euro
    Eur,
    /// United States Dollar
    Usd,
}

impl Currency {
    /// All currencies that get their own slice, in report order.
    pub const ALL: [Currency; 2] = [Currency::Eur, Currency::Usd];

    /// Returns the ISO 4217 three-letter code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
        }
    }
}

impl FromStr for Currency {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, UnknownCurrency> {
        match s.to_uppercase().as_str() {
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            _ => Err(UnknownCurrency(s.to_string())),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error for unrecognised currency codes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown currency code '{0}'")]
pub struct UnknownCurrency(pub String);

/// A currency filter for a report slice: everything, or one currency.
///
/// The unfiltered scope is labelled `ALL` in artifact paths, alongside
/// the per-currency labels, so the label is part of the export contract.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CurrencyScope {
    /// No currency filtering
    All,
    /// A single currency
    One(Currency),
}

impl CurrencyScope {
    /// The scopes a non-granular export produces, in report order.
    pub fn report_order() -> Vec<CurrencyScope> {
        let mut scopes = vec![CurrencyScope::All];
        scopes.extend(Currency::ALL.iter().map(|c| CurrencyScope::One(*c)));
        scopes
    }

    /// The path/filename label for this scope.
    pub fn label(&self) -> &'static str {
        match self {
            CurrencyScope::All => "ALL",
            CurrencyScope::One(c) => c.code(),
        }
    }
}

impl fmt::Display for CurrencyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_code_roundtrip() {
        for currency in Currency::ALL {
            let parsed: Currency = currency.code().parse().unwrap();
            assert_eq!(parsed, currency);
        }
    }

    #[test]
    fn test_currency_from_str_case_insensitive() {
        assert_eq!("eur".parse::<Currency>().unwrap(), Currency::Eur);
        assert_eq!("Usd".parse::<Currency>().unwrap(), Currency::Usd);
    }

    #[test]
    fn test_currency_from_str_unknown() {
        let err = "XYZ".parse::<Currency>().unwrap_err();
        assert_eq!(err, UnknownCurrency("XYZ".to_string()));
    }

    #[test]
    fn test_report_order_starts_with_all() {
        let scopes = CurrencyScope::report_order();
        assert_eq!(scopes[0], CurrencyScope::All);
        assert_eq!(scopes[1].label(), "EUR");
        assert_eq!(scopes[2].label(), "USD");
    }
}
