use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::IntrinsicError;
use crate::types::{Currency, Factor, Money, Rate};
use crate::IntrinsicResult;

/// Period a reported operating cash flow covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashFlowPeriod {
    /// Trailing twelve months
    #[default]
    Ttm,
    /// Last fiscal year
    Annual,
}

/// Market data for one ticker as returned by the data provider, before any
/// currency normalisation or field selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ticker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
    /// Last traded price, in `price_currency`
    pub current_price: Money,
    #[serde(default)]
    pub price_currency: Currency,
    pub shares_outstanding: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<Decimal>,
    /// Currency the financial statements are reported in
    #[serde(default)]
    pub financial_currency: Currency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cash_cash_equivalents_and_short_term_investments: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cash_and_cash_equivalents: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_debt: Option<Money>,
    pub operating_cash_flow: Money,
    #[serde(default)]
    pub operating_cash_flow_period: CashFlowPeriod,
    /// Analyst estimate of per-annum growth over the next five years (0.12 = 12%)
    pub five_year_growth_estimate: Rate,
}

/// A snapshot plus the exchange rates and settings needed to prepare it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotInput {
    pub snapshot: MarketSnapshot,
    /// Ask price of `<CCY>USD=X`, keyed by currency code or quote symbol
    #[serde(default)]
    pub fx_rates: BTreeMap<String, Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_years: Option<u32>,
    /// Discount rate used when the snapshot has no beta (default 1.09)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_discount_rate: Option<Factor>,
}

impl SnapshotInput {
    /// USD per one unit of `currency`.
    pub fn usd_rate(&self, currency: &Currency) -> IntrinsicResult<Rate> {
        if currency.is_usd() {
            return Ok(Decimal::ONE);
        }

        let symbol = currency.usd_quote_symbol();
        let rate = self
            .fx_rates
            .get(currency.code())
            .or_else(|| self.fx_rates.get(&symbol))
            .copied()
            .ok_or_else(|| {
                IntrinsicError::InsufficientData(format!(
                    "No exchange rate for {symbol}; add it to fx_rates"
                ))
            })?;

        if rate <= Decimal::ZERO {
            return Err(IntrinsicError::invalid(
                "fx_rates",
                format!("Exchange rate for {symbol} must be positive, got {rate}"),
            ));
        }
        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn input_with_rates(rates: &[(&str, Decimal)]) -> SnapshotInput {
        SnapshotInput {
            snapshot: MarketSnapshot {
                ticker: "SAP.DE".into(),
                as_of: None,
                current_price: dec!(200),
                price_currency: Currency::EUR,
                shares_outstanding: dec!(1000000),
                beta: None,
                financial_currency: Currency::EUR,
                cash_cash_equivalents_and_short_term_investments: None,
                cash_and_cash_equivalents: Some(dec!(10)),
                total_debt: None,
                operating_cash_flow: dec!(100),
                operating_cash_flow_period: CashFlowPeriod::Ttm,
                five_year_growth_estimate: dec!(0.1),
            },
            fx_rates: rates.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            forecast_years: None,
            fallback_discount_rate: None,
        }
    }

    #[test]
    fn test_usd_rate_is_one() {
        let input = input_with_rates(&[]);
        assert_eq!(input.usd_rate(&Currency::USD).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_usd_rate_by_code_or_symbol() {
        let input = input_with_rates(&[("EUR", dec!(1.08))]);
        assert_eq!(input.usd_rate(&Currency::EUR).unwrap(), dec!(1.08));

        let input = input_with_rates(&[("GBPUSD=X", dec!(1.27))]);
        assert_eq!(input.usd_rate(&Currency::GBP).unwrap(), dec!(1.27));
    }

    #[test]
    fn test_missing_rate_is_insufficient_data() {
        let input = input_with_rates(&[]);
        assert!(matches!(
            input.usd_rate(&Currency::JPY),
            Err(IntrinsicError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_non_positive_rate_rejected() {
        let input = input_with_rates(&[("EUR", Decimal::ZERO)]);
        assert!(input.usd_rate(&Currency::EUR).is_err());
    }

    #[test]
    fn test_snapshot_defaults() {
        let json = r#"{
            "snapshot": {
                "ticker": "AAPL",
                "current_price": "190.5",
                "shares_outstanding": "15500000000",
                "operating_cash_flow": "110000000000",
                "five_year_growth_estimate": "0.08"
            }
        }"#;
        let input: SnapshotInput = serde_json::from_str(json).unwrap();
        assert!(input.snapshot.price_currency.is_usd());
        assert!(input.snapshot.financial_currency.is_usd());
        assert_eq!(input.snapshot.operating_cash_flow_period, CashFlowPeriod::Ttm);
        assert!(input.snapshot.beta.is_none());
        assert!(input.fx_rates.is_empty());
    }
}
