use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::IntrinsicError;
use crate::types::{with_metadata, ComputationOutput, Factor, Money, Rate};
use crate::IntrinsicResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Upper bound on the per-year growth factor applied after the growth stage.
pub const TEN_YEAR_GROWTH_CAP: Factor = dec!(1.15);

/// Horizon used when the inputs do not name one.
pub const DEFAULT_FORECAST_YEARS: u32 = 10;

/// Longest horizon accepted by the model.
pub const MAX_FORECAST_YEARS: u32 = 100;

/// Years 1..=5 grow at the five-year rate; later years at the ten-year rate.
const GROWTH_STAGE_YEARS: u32 = 5;

fn default_forecast_years() -> u32 {
    DEFAULT_FORECAST_YEARS
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Financial inputs for a single company, normalised to USD.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationInputs {
    /// Ticker symbol, for reporting only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    /// Date the market data was observed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
    /// Current share price in USD
    pub current_price_usd: Money,
    /// Shares outstanding
    pub shares_outstanding: Decimal,
    /// Beta, when the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<Decimal>,
    /// Most recent quarter cash and short-term investments
    pub cash_and_short_term_investments: Money,
    /// Most recent quarter total debt
    pub total_debt: Money,
    /// TTM (or annual) operating cash flow
    pub operating_cash_flow: Money,
    /// Per-year growth multiplier for years 1-5 (1 + growth)
    pub five_year_growth_rate: Factor,
    /// Per-year growth multiplier for years 6+, at most 1.15
    pub ten_year_growth_rate: Factor,
    /// Number of years to forecast
    #[serde(default = "default_forecast_years")]
    pub forecast_years: u32,
    /// Per-year discount factor (1 + rate)
    pub discount_rate: Factor,
}

/// Which growth regime a projected year belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionStage {
    /// Years 1-5, five-year growth rate
    Growth,
    /// Years 6+, capped ten-year growth rate
    LateGrowth,
}

/// One row of the projected cash-flow schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearProjection {
    pub year: u32,
    pub stage: ProjectionStage,
    pub growth_rate: Factor,
    pub cash_flow: Money,
    pub discount_factor: Factor,
    pub present_value: Money,
}

/// Output of the intrinsic-value calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    /// Year-by-year projections
    pub projections: Vec<YearProjection>,
    /// Sum of discounted cash flows over the horizon
    pub sum_present_value: Money,
    /// Per-share value of the discounted cash flows alone
    pub intrinsic_value: Money,
    /// Intrinsic value plus cash per share
    pub intrinsic_value_with_cash: Money,
    /// Intrinsic value plus cash less debt per share
    pub intrinsic_value_with_debt: Money,
    /// (intrinsic - price) / intrinsic; absent when intrinsic value is zero
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_of_safety: Option<Rate>,
    pub current_price_usd: Money,
    pub discount_rate_used: Factor,
}

/// A validated valuation over one [`ValuationInputs`] snapshot.
///
/// Cash flows, discount factors and the per-share totals for the forecast
/// horizon are computed once in [`ValuationModel::new`]; every query
/// afterwards reads from them.
#[derive(Debug, Clone)]
pub struct ValuationModel {
    inputs: ValuationInputs,
    cash_flows: Vec<Money>,
    discount_factors: Vec<Factor>,
    totals: Totals,
}

/// Horizon aggregates, checked for overflow at construction.
#[derive(Debug, Clone, Copy)]
struct Totals {
    sum_present_value: Money,
    intrinsic_value: Money,
    intrinsic_value_with_cash: Money,
    intrinsic_value_with_debt: Money,
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

impl ValuationModel {
    /// Validate the inputs and project the horizon.
    pub fn new(inputs: ValuationInputs) -> IntrinsicResult<Self> {
        validate_inputs(&inputs)?;

        let horizon = inputs.forecast_years;
        let mut cash_flows = Vec::with_capacity(horizon as usize);
        let mut discount_factors = Vec::with_capacity(horizon as usize);

        let mut cash_flow = inputs.operating_cash_flow;
        for year in 1..=horizon {
            cash_flow = next_cash_flow(&inputs, year, cash_flow)?;
            cash_flows.push(cash_flow);
            discount_factors.push(power_of_rate(inputs.discount_rate, year)?);
        }

        let totals = aggregate(&inputs, &cash_flows, &discount_factors)?;

        debug!(
            ticker = inputs.ticker.as_deref().unwrap_or("-"),
            horizon, "projected cash flows"
        );

        Ok(Self {
            inputs,
            cash_flows,
            discount_factors,
            totals,
        })
    }

    pub fn inputs(&self) -> &ValuationInputs {
        &self.inputs
    }

    /// Growth multiplier that takes year `year - 1` to year `year`.
    pub fn growth_rate_for_year(&self, year: u32) -> Factor {
        growth_rate_for_year(&self.inputs, year)
    }

    /// Operating cash flow projected for `year` (1-based).
    ///
    /// Years beyond the forecast horizon keep compounding at the ten-year rate.
    pub fn projected_cash_flow(&self, year: u32) -> IntrinsicResult<Money> {
        let idx = year_index(year)?;
        if let Some(cf) = self.cash_flows.get(idx) {
            return Ok(*cf);
        }

        let mut cash_flow = self.last_cash_flow()?;
        for y in self.horizon() + 1..=year {
            cash_flow = next_cash_flow(&self.inputs, y, cash_flow)?;
        }
        Ok(cash_flow)
    }

    /// Cumulative discounting over `year` periods: `discount_rate ^ year`.
    pub fn discount_factor(&self, year: u32) -> IntrinsicResult<Factor> {
        let idx = year_index(year)?;
        match self.discount_factors.get(idx) {
            Some(df) => Ok(*df),
            None => power_of_rate(self.inputs.discount_rate, year),
        }
    }

    pub fn present_value(&self, year: u32) -> IntrinsicResult<Money> {
        let cash_flow = self.projected_cash_flow(year)?;
        let discount = self.discount_factor(year)?;
        Ok(cash_flow / discount)
    }

    /// Sum of present values for years `1..=forecast_years`.
    pub fn sum_present_value(&self) -> Money {
        self.totals.sum_present_value
    }

    /// Per-share value from discounted operating cash flows alone.
    pub fn intrinsic_value(&self) -> Money {
        self.totals.intrinsic_value
    }

    pub fn intrinsic_value_with_cash(&self) -> Money {
        self.totals.intrinsic_value_with_cash
    }

    /// Final per-share estimate: discounted cash flows plus cash less debt.
    pub fn intrinsic_value_with_debt(&self) -> Money {
        self.totals.intrinsic_value_with_debt
    }

    /// Fractional discount (positive) or premium (negative) of the market
    /// price to the final intrinsic value.
    pub fn margin_of_safety(&self) -> IntrinsicResult<Rate> {
        let final_iv = self.intrinsic_value_with_debt();
        if final_iv.is_zero() {
            return Err(IntrinsicError::DegenerateResult {
                context: "margin of safety: intrinsic value net of debt is zero".into(),
            });
        }
        final_iv
            .checked_sub(self.inputs.current_price_usd)
            .and_then(|gap| gap.checked_div(final_iv))
            .ok_or_else(|| IntrinsicError::DegenerateResult {
                context: format!(
                    "margin of safety overflows: intrinsic value net of debt ({final_iv}) is too small against price {}",
                    self.inputs.current_price_usd
                ),
            })
    }

    /// Full schedule for the forecast horizon.
    pub fn projections(&self) -> Vec<YearProjection> {
        self.cash_flows
            .iter()
            .zip(&self.discount_factors)
            .zip(1u32..)
            .map(|((cf, df), year)| YearProjection {
                year,
                stage: stage_for_year(year),
                growth_rate: self.growth_rate_for_year(year),
                cash_flow: *cf,
                discount_factor: *df,
                present_value: cf / df,
            })
            .collect()
    }

    fn horizon(&self) -> u32 {
        self.cash_flows.len() as u32
    }

    fn last_cash_flow(&self) -> IntrinsicResult<Money> {
        self.cash_flows.last().copied().ok_or_else(|| {
            IntrinsicError::InsufficientData("No projection years generated".into())
        })
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the two-stage operating cash flow DCF and wrap it in the standard
/// output envelope.
pub fn calculate_intrinsic_value(
    inputs: &ValuationInputs,
) -> IntrinsicResult<ComputationOutput<ValuationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let model = ValuationModel::new(inputs.clone())?;
    let final_iv = model.intrinsic_value_with_debt();

    let margin_of_safety = match model.margin_of_safety() {
        Ok(m) => Some(m),
        Err(IntrinsicError::DegenerateResult { context }) => {
            push_warning(
                &mut warnings,
                format!("Margin of safety omitted: {context}"),
            );
            None
        }
        Err(e) => return Err(e),
    };

    if final_iv < Decimal::ZERO {
        push_warning(
            &mut warnings,
            format!("Intrinsic value net of debt is negative ({final_iv}); debt exceeds discounted cash flows plus cash"),
        );
    }
    if let Some(m) = margin_of_safety {
        if m < Decimal::ZERO && final_iv > Decimal::ZERO {
            let message = match m.checked_mul(dec!(-100)) {
                Some(pct) => format!("Current price trades {pct:.1}% above intrinsic value"),
                None => "Current price trades far above intrinsic value".to_string(),
            };
            push_warning(&mut warnings, message);
        }
    }

    let output = ValuationOutput {
        ticker: inputs.ticker.clone(),
        projections: model.projections(),
        sum_present_value: model.sum_present_value(),
        intrinsic_value: model.intrinsic_value(),
        intrinsic_value_with_cash: model.intrinsic_value_with_cash(),
        intrinsic_value_with_debt: final_iv,
        margin_of_safety,
        current_price_usd: inputs.current_price_usd,
        discount_rate_used: inputs.discount_rate,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Two-stage operating cash flow DCF (beta-tiered discount rate)",
        inputs,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_inputs(inputs: &ValuationInputs) -> IntrinsicResult<()> {
    if inputs.shares_outstanding <= Decimal::ZERO {
        return Err(IntrinsicError::invalid(
            "shares_outstanding",
            "Shares outstanding must be positive",
        ));
    }
    if inputs.forecast_years == 0 || inputs.forecast_years > MAX_FORECAST_YEARS {
        return Err(IntrinsicError::invalid(
            "forecast_years",
            format!("Forecast horizon must be between 1 and {MAX_FORECAST_YEARS} years"),
        ));
    }
    if inputs.discount_rate <= Decimal::ONE {
        return Err(IntrinsicError::invalid(
            "discount_rate",
            format!(
                "Discount rate is a factor (1 + rate) and must exceed 1, got {}",
                inputs.discount_rate
            ),
        ));
    }
    if inputs.five_year_growth_rate <= Decimal::ZERO {
        return Err(IntrinsicError::invalid(
            "five_year_growth_rate",
            "Growth factor (1 + growth) must be positive",
        ));
    }
    if inputs.ten_year_growth_rate <= Decimal::ZERO {
        return Err(IntrinsicError::invalid(
            "ten_year_growth_rate",
            "Growth factor (1 + growth) must be positive",
        ));
    }
    if inputs.ten_year_growth_rate > TEN_YEAR_GROWTH_CAP {
        return Err(IntrinsicError::invalid(
            "ten_year_growth_rate",
            format!(
                "Ten-year growth factor is capped at {TEN_YEAR_GROWTH_CAP}, got {}",
                inputs.ten_year_growth_rate
            ),
        ));
    }
    if inputs.current_price_usd < Decimal::ZERO {
        return Err(IntrinsicError::invalid(
            "current_price_usd",
            "Share price cannot be negative",
        ));
    }
    Ok(())
}

fn growth_rate_for_year(inputs: &ValuationInputs, year: u32) -> Factor {
    if year <= GROWTH_STAGE_YEARS {
        inputs.five_year_growth_rate
    } else {
        inputs.ten_year_growth_rate
    }
}

fn stage_for_year(year: u32) -> ProjectionStage {
    if year <= GROWTH_STAGE_YEARS {
        ProjectionStage::Growth
    } else {
        ProjectionStage::LateGrowth
    }
}

/// Cash flow for `year` given the previous year's (operating cash flow for year 1).
fn next_cash_flow(inputs: &ValuationInputs, year: u32, prev: Money) -> IntrinsicResult<Money> {
    prev.checked_mul(growth_rate_for_year(inputs, year))
        .ok_or_else(|| {
            IntrinsicError::invalid(
                "operating_cash_flow",
                format!("Projected cash flow overflows at year {year}"),
            )
        })
}

fn power_of_rate(rate: Factor, year: u32) -> IntrinsicResult<Factor> {
    rate.checked_powu(u64::from(year)).ok_or_else(|| {
        IntrinsicError::invalid(
            "discount_rate",
            format!("Discount factor overflows at year {year}"),
        )
    })
}

/// Sum the discounted horizon and spread it, with cash and debt, over the
/// share count.
fn aggregate(
    inputs: &ValuationInputs,
    cash_flows: &[Money],
    discount_factors: &[Factor],
) -> IntrinsicResult<Totals> {
    let mut sum_present_value = Decimal::ZERO;
    for (year, (cf, df)) in (1u32..).zip(cash_flows.iter().zip(discount_factors)) {
        sum_present_value = sum_present_value.checked_add(cf / df).ok_or_else(|| {
            IntrinsicError::invalid(
                "operating_cash_flow",
                format!("Sum of present values overflows at year {year}"),
            )
        })?;
    }

    let shares = inputs.shares_outstanding;
    let per_share = |amount: Money, field: &str| {
        amount.checked_div(shares).ok_or_else(|| {
            IntrinsicError::invalid(field, format!("{field} per share overflows"))
        })
    };

    let intrinsic_value = per_share(sum_present_value, "operating_cash_flow")?;
    let intrinsic_value_with_cash = per_share(
        inputs.cash_and_short_term_investments,
        "cash_and_short_term_investments",
    )?
    .checked_add(intrinsic_value)
    .ok_or_else(|| {
        IntrinsicError::invalid(
            "cash_and_short_term_investments",
            "Intrinsic value plus cash overflows",
        )
    })?;
    let intrinsic_value_with_debt = per_share(inputs.total_debt, "total_debt")
        .and_then(|debt| {
            intrinsic_value_with_cash.checked_sub(debt).ok_or_else(|| {
                IntrinsicError::invalid("total_debt", "Intrinsic value net of debt overflows")
            })
        })?;

    Ok(Totals {
        sum_present_value,
        intrinsic_value,
        intrinsic_value_with_cash,
        intrinsic_value_with_debt,
    })
}

fn year_index(year: u32) -> IntrinsicResult<usize> {
    if year == 0 {
        return Err(IntrinsicError::invalid("year", "Years are 1-based"));
    }
    Ok((year - 1) as usize)
}

fn push_warning(warnings: &mut Vec<String>, message: String) {
    warn!("{message}");
    warnings.push(message);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
