use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Factor;

/// Rate applied when no beta is available for the company.
pub const DEFAULT_DISCOUNT_RATE: Factor = dec!(1.09);

const LOW_BETA_BOUND: Decimal = dec!(0.8);
const HIGH_BETA_BOUND: Decimal = dec!(1.5);
const LOW_BETA_RATE: Factor = dec!(1.05);
const MARKET_BETA_RATE: Factor = dec!(1.06);
const TIER_STEP: Decimal = dec!(0.005);

/// Where a discount rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscountRateSource {
    /// Derived from the company's beta
    Beta,
    /// Caller-supplied fallback, beta unavailable
    Fallback,
}

/// A resolved discount rate plus its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountRateOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<Decimal>,
    /// Multiplicative per-year factor (1.06 = 6%)
    pub discount_rate: Factor,
    pub source: DiscountRateSource,
}

/// Map a beta coefficient to a per-year discount factor.
///
/// | beta            | rate  |
/// |-----------------|-------|
/// | < 0.8           | 1.05  |
/// | 0.8 ..= 1.0     | 1.06  |
/// | > 1.5           | 1.09  |
/// | (1.0, 1.5]      | 1.06 + ceil((beta - 1) * 10) * 0.005, to 3 dp |
///
/// The bands are tested in that order, so a beta of exactly 1.5 lands in the
/// tiered band (1.085) and only betas strictly above 1.5 get the flat 1.09.
pub fn derive_discount_rate(beta: Decimal) -> Factor {
    if beta < LOW_BETA_BOUND {
        return LOW_BETA_RATE;
    }
    if beta <= Decimal::ONE {
        return MARKET_BETA_RATE;
    }
    if beta > HIGH_BETA_BOUND {
        return DEFAULT_DISCOUNT_RATE;
    }

    let tier = ((beta - Decimal::ONE) * dec!(10)).ceil();
    (MARKET_BETA_RATE + tier * TIER_STEP).round_dp(3)
}

/// Use the beta-derived rate when a beta exists, otherwise `fallback`.
pub fn resolve_discount_rate(beta: Option<Decimal>, fallback: Factor) -> DiscountRateOutput {
    match beta {
        Some(b) => DiscountRateOutput {
            beta: Some(b),
            discount_rate: derive_discount_rate(b),
            source: DiscountRateSource::Beta,
        },
        None => DiscountRateOutput {
            beta: None,
            discount_rate: fallback,
            source: DiscountRateSource::Fallback,
        },
    }
}
