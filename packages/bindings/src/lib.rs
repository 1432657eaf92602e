use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use intrinsic_core::acquisition::{self, SnapshotInput};
use intrinsic_core::valuation::{discount_rate, model};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

#[derive(Deserialize)]
struct DiscountRateRequest {
    #[serde(default)]
    beta: Option<Decimal>,
    #[serde(default)]
    fallback: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

#[napi]
pub fn discount_rate_from_beta(input_json: String) -> NapiResult<String> {
    let req: DiscountRateRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = discount_rate::resolve_discount_rate(
        req.beta,
        req.fallback.unwrap_or(discount_rate::DEFAULT_DISCOUNT_RATE),
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_intrinsic_value(input_json: String) -> NapiResult<String> {
    let input: model::ValuationInputs =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = model::calculate_intrinsic_value(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Market snapshots
// ---------------------------------------------------------------------------

#[napi]
pub fn prepare_inputs(input_json: String) -> NapiResult<String> {
    let input: SnapshotInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = acquisition::prepare_inputs(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn analyze_snapshot(input_json: String) -> NapiResult<String> {
    let input: SnapshotInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = acquisition::analyze_snapshot(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
