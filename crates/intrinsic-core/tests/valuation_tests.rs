use intrinsic_core::valuation::{discount_rate, model};
use intrinsic_core::IntrinsicError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn assert_close(actual: Decimal, expected: Decimal, tolerance: Decimal) {
    assert!(
        (actual - expected).abs() < tolerance,
        "expected {expected} ± {tolerance}, got {actual}"
    );
}

fn worked_example() -> model::ValuationInputs {
    model::ValuationInputs {
        ticker: None,
        as_of: None,
        current_price_usd: dec!(1.0),
        shares_outstanding: dec!(1000),
        beta: None,
        cash_and_short_term_investments: Decimal::ZERO,
        total_debt: Decimal::ZERO,
        operating_cash_flow: dec!(100),
        five_year_growth_rate: dec!(1.10),
        ten_year_growth_rate: dec!(1.05),
        forecast_years: 6,
        discount_rate: dec!(1.06),
    }
}

// ===========================================================================
// Discount-rate policy tests
// ===========================================================================

#[test]
fn test_discount_rate_bands() {
    assert_eq!(discount_rate::derive_discount_rate(dec!(0.5)), dec!(1.05));
    assert_eq!(discount_rate::derive_discount_rate(dec!(0.8)), dec!(1.06));
    assert_eq!(discount_rate::derive_discount_rate(dec!(1.0)), dec!(1.06));
    assert_eq!(discount_rate::derive_discount_rate(dec!(1.05)), dec!(1.065));
    assert_eq!(discount_rate::derive_discount_rate(dec!(1.5)), dec!(1.085));
    assert_eq!(discount_rate::derive_discount_rate(dec!(1.6)), dec!(1.09));
}

#[test]
fn test_discount_rate_feeds_model() {
    // Beta of 1.24 -> tier 3 -> 7.5% per year
    let mut inputs = worked_example();
    inputs.beta = Some(dec!(1.24));
    inputs.discount_rate = discount_rate::derive_discount_rate(dec!(1.24));
    let m = model::ValuationModel::new(inputs).unwrap();
    assert_eq!(m.discount_factor(1).unwrap(), dec!(1.075));
    assert_eq!(m.inputs().beta, Some(dec!(1.24)));
}

// ===========================================================================
// Valuation model tests
// ===========================================================================

#[test]
fn test_worked_example_end_to_end() {
    let m = model::ValuationModel::new(worked_example()).unwrap();

    assert_eq!(m.projected_cash_flow(1).unwrap(), dec!(110));
    assert_eq!(m.projected_cash_flow(5).unwrap(), dec!(161.051));
    assert_eq!(m.projected_cash_flow(6).unwrap(), dec!(169.10355));

    // Manual: sum of CF_t / 1.06^t for t = 1..6
    let cash_flows = [
        dec!(110),
        dec!(121),
        dec!(133.1),
        dec!(146.41),
        dec!(161.051),
        dec!(169.10355),
    ];
    let mut discount = Decimal::ONE;
    let mut manual = Decimal::ZERO;
    for cf in cash_flows {
        discount *= dec!(1.06);
        manual += cf / discount;
    }

    assert_close(m.sum_present_value(), manual, dec!(0.0000000001));
    assert_close(m.sum_present_value(), dec!(678.74491995), dec!(0.00000001));
    assert_close(m.intrinsic_value(), manual / dec!(1000), dec!(0.0000000001));

    // No cash, no debt: all three per-share values coincide
    assert_eq!(m.intrinsic_value(), m.intrinsic_value_with_cash());
    assert_eq!(m.intrinsic_value_with_cash(), m.intrinsic_value_with_debt());

    // Price 1.00 vs ~0.6787 of value: ~47% premium
    assert_close(m.margin_of_safety().unwrap(), dec!(-0.47330753), dec!(0.000001));
}

#[test]
fn test_cash_and_debt_adjustments() {
    let mut inputs = worked_example();
    inputs.cash_and_short_term_investments = dec!(500);
    inputs.total_debt = dec!(1500);
    let m = model::ValuationModel::new(inputs).unwrap();

    assert_eq!(
        m.intrinsic_value_with_cash(),
        m.intrinsic_value() + dec!(500) / dec!(1000)
    );
    assert_eq!(
        m.intrinsic_value_with_debt(),
        m.intrinsic_value_with_cash() - dec!(1500) / dec!(1000)
    );
    // 0.68 + 0.5 - 1.5 < 0
    assert!(m.intrinsic_value_with_debt() < Decimal::ZERO);
}

#[test]
fn test_single_year_horizon() {
    let mut inputs = worked_example();
    inputs.forecast_years = 1;
    let m = model::ValuationModel::new(inputs).unwrap();
    assert_close(
        m.sum_present_value(),
        dec!(110) / dec!(1.06),
        dec!(0.0000000001),
    );
}

#[test]
fn test_long_horizon_is_iterative() {
    let mut inputs = worked_example();
    inputs.forecast_years = model::MAX_FORECAST_YEARS;
    let m = model::ValuationModel::new(inputs).unwrap();
    let rows = m.projections();
    assert_eq!(rows.len(), 100);
    for pair in rows.windows(2) {
        assert_eq!(pair[1].cash_flow, pair[0].cash_flow * pair[1].growth_rate);
    }
}

#[test]
fn test_zero_shares_is_invalid_input() {
    let mut inputs = worked_example();
    inputs.shares_outstanding = Decimal::ZERO;
    let err = model::ValuationModel::new(inputs).unwrap_err();
    match err {
        IntrinsicError::InvalidInput { field, .. } => assert_eq!(field, "shares_outstanding"),
        other => panic!("expected InvalidInput, got {other}"),
    }
}

#[test]
fn test_zero_intrinsic_value_is_degenerate() {
    // Cash exactly offsets debt and there are no cash flows
    let mut inputs = worked_example();
    inputs.operating_cash_flow = Decimal::ZERO;
    inputs.cash_and_short_term_investments = dec!(700);
    inputs.total_debt = dec!(700);
    let m = model::ValuationModel::new(inputs).unwrap();
    assert!(matches!(
        m.margin_of_safety(),
        Err(IntrinsicError::DegenerateResult { .. })
    ));
}

#[test]
fn test_calculate_intrinsic_value_serializes() {
    let out = model::calculate_intrinsic_value(&worked_example()).unwrap();
    let json = serde_json::to_value(&out).unwrap();
    assert!(json["result"]["projections"].is_array());
    assert!(json["result"]["intrinsic_value_with_debt"].is_string());
    assert_eq!(json["assumptions"]["forecast_years"], 6);
    assert_eq!(json["metadata"]["precision"], "rust_decimal_128bit");
}

// ===========================================================================
// Overflow and degenerate results
// ===========================================================================

#[test]
fn test_near_zero_intrinsic_value_margin_is_degenerate() {
    // One millionth of a dollar spread over a billion shares, priced at 1e24
    let mut inputs = worked_example();
    inputs.operating_cash_flow = Decimal::ZERO;
    inputs.cash_and_short_term_investments = dec!(0.000001);
    inputs.shares_outstanding = dec!(1000000000);
    inputs.current_price_usd = dec!(1000000000000000000000000);

    let m = model::ValuationModel::new(inputs.clone()).unwrap();
    assert_eq!(m.intrinsic_value_with_debt(), dec!(0.000000000000001));
    assert!(matches!(
        m.margin_of_safety(),
        Err(IntrinsicError::DegenerateResult { .. })
    ));

    let out = model::calculate_intrinsic_value(&inputs).unwrap();
    assert!(out.result.margin_of_safety.is_none());
    assert!(out.warnings.iter().any(|w| w.contains("Margin of safety omitted")));
}

#[test]
fn test_overflowing_present_value_sum_rejected_at_construction() {
    let mut inputs = worked_example();
    inputs.operating_cash_flow = dec!(20000000000000000000000000000);
    inputs.five_year_growth_rate = Decimal::ONE;
    inputs.ten_year_growth_rate = Decimal::ONE;
    inputs.discount_rate = dec!(1.0001);
    inputs.forecast_years = 10;

    assert!(matches!(
        model::ValuationModel::new(inputs.clone()),
        Err(IntrinsicError::InvalidInput { .. })
    ));
    assert!(matches!(
        model::calculate_intrinsic_value(&inputs),
        Err(IntrinsicError::InvalidInput { .. })
    ));
}
