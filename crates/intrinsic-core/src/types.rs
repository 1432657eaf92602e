use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Multiplicative per-period factors (1.06 = 6% per period).
pub type Factor = Decimal;

/// ISO currency code. Serialised as the bare code, e.g. `"EUR"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Currency {
    GBP,
    #[default]
    USD,
    EUR,
    CHF,
    JPY,
    CAD,
    AUD,
    HKD,
    SGD,
    Other(String),
}

impl Currency {
    pub fn code(&self) -> &str {
        match self {
            Currency::GBP => "GBP",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::CHF => "CHF",
            Currency::JPY => "JPY",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            Currency::HKD => "HKD",
            Currency::SGD => "SGD",
            Currency::Other(code) => code,
        }
    }

    pub fn is_usd(&self) -> bool {
        matches!(self, Currency::USD)
    }

    /// Quote symbol the market-data provider uses for the `<CCY>/USD` pair.
    pub fn usd_quote_symbol(&self) -> String {
        format!("{}USD=X", self.code())
    }
}

impl From<String> for Currency {
    fn from(code: String) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "GBP" => Currency::GBP,
            "USD" => Currency::USD,
            "EUR" => Currency::EUR,
            "CHF" => Currency::CHF,
            "JPY" => Currency::JPY,
            "CAD" => Currency::CAD,
            "AUD" => Currency::AUD,
            "HKD" => Currency::HKD,
            "SGD" => Currency::SGD,
            other => Currency::Other(other.to_string()),
        }
    }
}

impl From<Currency> for String {
    fn from(c: Currency) -> Self {
        c.code().to_string()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_currency_parses_known_codes() {
        assert_eq!(Currency::from("eur".to_string()), Currency::EUR);
        assert_eq!(Currency::from(" USD ".to_string()), Currency::USD);
        assert_eq!(
            Currency::from("SEK".to_string()),
            Currency::Other("SEK".into())
        );
    }

    #[test]
    fn test_currency_serde_as_code() {
        let json = serde_json::to_string(&Currency::JPY).unwrap();
        assert_eq!(json, "\"JPY\"");
        let back: Currency = serde_json::from_str("\"NOK\"").unwrap();
        assert_eq!(back, Currency::Other("NOK".into()));
    }

    #[test]
    fn test_usd_quote_symbol() {
        assert_eq!(Currency::EUR.usd_quote_symbol(), "EURUSD=X");
        assert!(Currency::default().is_usd());
    }

    #[test]
    fn test_with_metadata_envelope() {
        let out = with_metadata("test", &serde_json::json!({"a": 1}), vec![], 5, 42u32);
        assert_eq!(out.result, 42);
        assert_eq!(out.methodology, "test");
        assert_eq!(out.metadata.computation_time_us, 5);
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    }
}
