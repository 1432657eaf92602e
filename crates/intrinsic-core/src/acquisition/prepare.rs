use rust_decimal::Decimal;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::IntrinsicError;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::valuation::discount_rate::{resolve_discount_rate, DEFAULT_DISCOUNT_RATE};
use crate::valuation::model::{
    calculate_intrinsic_value, ValuationInputs, ValuationModel, ValuationOutput,
    DEFAULT_FORECAST_YEARS, TEN_YEAR_GROWTH_CAP,
};
use crate::IntrinsicResult;

use super::snapshot::{CashFlowPeriod, MarketSnapshot, SnapshotInput};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Turn a raw market-data snapshot into validated, USD-normalised
/// [`ValuationInputs`].
///
/// Field selection:
/// - price is converted from `price_currency`, statement figures from
///   `financial_currency`
/// - no beta: the fallback discount rate applies (1.09 unless overridden)
/// - cash prefers cash + equivalents + short-term investments, then plain
///   cash + equivalents
/// - unreported debt counts as zero
/// - the ten-year growth factor is the five-year factor capped at 1.15
pub fn prepare_inputs(input: &SnapshotInput) -> IntrinsicResult<ComputationOutput<ValuationInputs>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let snap = &input.snapshot;

    let price_fx = input.usd_rate(&snap.price_currency)?;
    let statement_fx = input.usd_rate(&snap.financial_currency)?;

    // --- Discount rate ---
    let fallback = input.fallback_discount_rate.unwrap_or(DEFAULT_DISCOUNT_RATE);
    let discount = resolve_discount_rate(snap.beta, fallback);
    if snap.beta.is_none() {
        push_warning(
            &mut warnings,
            format!(
                "{} does not have beta; using fallback discount rate {}",
                snap.ticker, discount.discount_rate
            ),
        );
    }

    // --- Balance sheet ---
    let cash = select_cash(snap, &mut warnings)?;
    let total_debt = match snap.total_debt {
        Some(debt) => debt,
        None => {
            push_warning(
                &mut warnings,
                format!(
                    "{} does not have debt or did not report it last quarter; assuming zero",
                    snap.ticker
                ),
            );
            Decimal::ZERO
        }
    };

    // --- Cash flow ---
    if snap.operating_cash_flow_period == CashFlowPeriod::Annual {
        push_warning(
            &mut warnings,
            format!(
                "{} does not have TTM operating cash flow; using annual OCF",
                snap.ticker
            ),
        );
    }

    // --- Growth ---
    let five_year_growth_rate = Decimal::ONE
        .checked_add(snap.five_year_growth_estimate)
        .ok_or_else(|| {
            IntrinsicError::invalid("five_year_growth_estimate", "Growth estimate overflows")
        })?;
    let ten_year_growth_rate = five_year_growth_rate.min(TEN_YEAR_GROWTH_CAP);

    if !snap.financial_currency.is_usd() {
        info!(
            ticker = %snap.ticker,
            currency = %snap.financial_currency,
            rate = %statement_fx,
            "converting statement figures to USD"
        );
    }

    let inputs = ValuationInputs {
        ticker: Some(snap.ticker.clone()),
        as_of: snap.as_of,
        current_price_usd: to_usd(snap.current_price, price_fx, "current_price")?,
        shares_outstanding: snap.shares_outstanding,
        beta: snap.beta,
        cash_and_short_term_investments: to_usd(cash, statement_fx, "cash")?,
        total_debt: to_usd(total_debt, statement_fx, "total_debt")?,
        operating_cash_flow: to_usd(snap.operating_cash_flow, statement_fx, "operating_cash_flow")?,
        five_year_growth_rate,
        ten_year_growth_rate,
        forecast_years: input.forecast_years.unwrap_or(DEFAULT_FORECAST_YEARS),
        discount_rate: discount.discount_rate,
    };

    // Fail here rather than on the first query against the model.
    ValuationModel::new(inputs.clone())?;

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Market snapshot normalised to USD valuation inputs",
        input,
        warnings,
        elapsed,
        inputs,
    ))
}

/// Prepare a snapshot and value it in one step. Warnings from both stages are
/// kept, preparation first.
pub fn analyze_snapshot(input: &SnapshotInput) -> IntrinsicResult<ComputationOutput<ValuationOutput>> {
    let start = Instant::now();
    let prepared = prepare_inputs(input)?;
    let valued = calculate_intrinsic_value(&prepared.result)?;

    let mut warnings = prepared.warnings;
    warnings.extend(valued.warnings);

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        &valued.methodology,
        &prepared.result,
        warnings,
        elapsed,
        valued.result,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn select_cash(snap: &MarketSnapshot, warnings: &mut Vec<String>) -> IntrinsicResult<Money> {
    if let Some(cash) = snap.cash_cash_equivalents_and_short_term_investments {
        return Ok(cash);
    }
    if let Some(cash) = snap.cash_and_cash_equivalents {
        push_warning(
            warnings,
            format!(
                "{} does not report short-term investments; using cash and cash equivalents",
                snap.ticker
            ),
        );
        return Ok(cash);
    }
    Err(IntrinsicError::InsufficientData(format!(
        "balance sheet data unavailable for {}: no cash figure reported",
        snap.ticker
    )))
}

fn to_usd(amount: Money, rate: Decimal, field: &str) -> IntrinsicResult<Money> {
    amount.checked_mul(rate).ok_or_else(|| {
        IntrinsicError::invalid(field, format!("{amount} at exchange rate {rate} overflows in USD"))
    })
}

fn push_warning(warnings: &mut Vec<String>, message: String) {
    warn!("{message}");
    warnings.push(message);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
