use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::time::Instant;

use intrinsic_core::valuation::discount_rate::{self, DiscountRateSource};
use intrinsic_core::valuation::model::{
    self, ValuationInputs, DEFAULT_FORECAST_YEARS, TEN_YEAR_GROWTH_CAP,
};
use intrinsic_core::with_metadata;

use crate::input;

/// Arguments for the beta-to-discount-rate mapping
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct DiscountRateArgs {
    /// Beta coefficient; omit to get the fallback rate
    #[arg(long)]
    pub beta: Option<Decimal>,

    /// Discount rate used when no beta is given
    #[arg(long, default_value = "1.09")]
    pub fallback: Decimal,
}

/// Arguments for an intrinsic-value calculation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ValueArgs {
    /// Path to a JSON or YAML file with valuation inputs (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Ticker symbol, for labelling the output
    #[arg(long)]
    pub ticker: Option<String>,

    /// Current share price in USD
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Shares outstanding
    #[arg(long)]
    pub shares: Option<Decimal>,

    /// Beta; used to derive the discount rate when --discount-rate is omitted
    #[arg(long)]
    pub beta: Option<Decimal>,

    /// Cash and short-term investments in USD
    #[arg(long, default_value = "0")]
    pub cash: Decimal,

    /// Total debt in USD
    #[arg(long, default_value = "0")]
    pub debt: Decimal,

    /// TTM operating cash flow in USD
    #[arg(long, alias = "ocf")]
    pub operating_cash_flow: Option<Decimal>,

    /// Growth factor for years 1-5 (1 + growth, e.g. 1.12)
    #[arg(long)]
    pub five_year_growth: Option<Decimal>,

    /// Growth factor for years 6+ (defaults to the five-year factor capped at 1.15)
    #[arg(long)]
    pub ten_year_growth: Option<Decimal>,

    /// Forecast horizon in years
    #[arg(long, default_value_t = DEFAULT_FORECAST_YEARS)]
    pub years: u32,

    /// Discount factor (1 + rate); derived from --beta when omitted
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Discount factor used when neither --discount-rate nor --beta is given
    #[arg(long, default_value = "1.09")]
    pub fallback_discount_rate: Decimal,
}

pub fn run_discount_rate(args: DiscountRateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let out = discount_rate::resolve_discount_rate(args.beta, args.fallback);

    let mut warnings = Vec::new();
    if out.source == DiscountRateSource::Fallback {
        warnings.push(format!(
            "No beta supplied; using fallback discount rate {}",
            out.discount_rate
        ));
    }

    let assumptions = json!({
        "beta": args.beta,
        "fallback": args.fallback,
    });
    let elapsed = start.elapsed().as_micros() as u64;
    let result = with_metadata(
        "Beta-tiered discount rate",
        &assumptions,
        warnings,
        elapsed,
        out,
    );
    Ok(serde_json::to_value(result)?)
}

pub fn run_value(args: ValueArgs) -> Result<Value, Box<dyn std::error::Error>> {
    // Explicit flags take precedence over piped stdin.
    let inputs: ValuationInputs = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if args.price.is_some() {
        inputs_from_flags(&args)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        inputs_from_flags(&args)?
    };

    let result = model::calculate_intrinsic_value(&inputs)?;
    Ok(serde_json::to_value(result)?)
}

fn inputs_from_flags(args: &ValueArgs) -> Result<ValuationInputs, Box<dyn std::error::Error>> {
    let five_year_growth_rate = args
        .five_year_growth
        .ok_or("--five-year-growth is required (or provide --input)")?;
    let discount_rate = match args.discount_rate {
        Some(rate) => rate,
        None => discount_rate::resolve_discount_rate(args.beta, args.fallback_discount_rate)
            .discount_rate,
    };

    Ok(ValuationInputs {
        ticker: args.ticker.clone(),
        as_of: None,
        current_price_usd: args
            .price
            .ok_or("--price is required (or provide --input)")?,
        shares_outstanding: args
            .shares
            .ok_or("--shares is required (or provide --input)")?,
        beta: args.beta,
        cash_and_short_term_investments: args.cash,
        total_debt: args.debt,
        operating_cash_flow: args
            .operating_cash_flow
            .ok_or("--operating-cash-flow is required (or provide --input)")?,
        five_year_growth_rate,
        ten_year_growth_rate: args
            .ten_year_growth
            .unwrap_or_else(|| five_year_growth_rate.min(TEN_YEAR_GROWTH_CAP)),
        forecast_years: args.years,
        discount_rate,
    })
}
