use super::error::EngineError;

/// Principal ceiling applied before any formula evaluation.
pub const MAX_PRINCIPAL: f64 = 1.0e12;

/// Annual rate ceiling in percent.
pub const MAX_ANNUAL_RATE_PERCENT: f64 = 100.0;

/// Term ceiling: 50 years.
pub const MAX_TENURE_MONTHS: u32 = 600;

/// Balances below this are treated as fully repaid.
pub const BALANCE_EPSILON: f64 = 0.01;

/// Equated monthly installment for `principal` at `monthly_rate` over
/// `months`. Zero-rate loans degenerate to straight division.
pub fn monthly_installment(
    principal: f64,
    monthly_rate: f64,
    months: u32,
) -> Result<f64, EngineError> {
    validate_formula_inputs(principal, monthly_rate, months)?;

    let principal = principal.min(MAX_PRINCIPAL);
    let monthly_rate = monthly_rate.min(MAX_ANNUAL_RATE_PERCENT / 12.0 / 100.0);
    let months = months.min(MAX_TENURE_MONTHS);

    if monthly_rate == 0.0 {
        return Ok(principal / months as f64);
    }

    let factor = annuity_factor(monthly_rate, months)?;
    Ok(principal * monthly_rate * factor / (factor - 1.0))
}

/// Inverse of the EMI formula: the principal amortized by `installment` at
/// `monthly_rate` over `months`.
pub fn principal_from_installment(
    installment: f64,
    monthly_rate: f64,
    months: u32,
) -> Result<f64, EngineError> {
    validate_formula_inputs(installment, monthly_rate, months)?;

    let monthly_rate = monthly_rate.min(MAX_ANNUAL_RATE_PERCENT / 12.0 / 100.0);
    let months = months.min(MAX_TENURE_MONTHS);

    if monthly_rate == 0.0 {
        return Ok(installment * months as f64);
    }

    let factor = annuity_factor(monthly_rate, months)?;
    Ok(installment * (factor - 1.0) / (monthly_rate * factor))
}

/// Fractional months needed to amortize `balance` with a fixed
/// `installment` at `monthly_rate`. `None` when the installment cannot
/// outrun the interest accrual.
pub fn months_to_amortize(balance: f64, installment: f64, monthly_rate: f64) -> Option<f64> {
    if balance <= 0.0 {
        return Some(0.0);
    }
    if installment <= 0.0 {
        return None;
    }
    if monthly_rate == 0.0 {
        return Some(balance / installment);
    }

    let margin = installment - balance * monthly_rate;
    if margin <= 0.0 {
        return None;
    }
    Some((installment / margin).ln() / (1.0 + monthly_rate).ln())
}

fn annuity_factor(monthly_rate: f64, months: u32) -> Result<f64, EngineError> {
    let factor = (1.0 + monthly_rate).powi(months as i32);
    if !factor.is_finite() || factor <= 1.0 {
        return Err(EngineError::NumericOverflow(format!(
            "annuity factor {factor} for rate {monthly_rate} over {months} months"
        )));
    }
    Ok(factor)
}

fn validate_formula_inputs(
    amount: f64,
    monthly_rate: f64,
    months: u32,
) -> Result<(), EngineError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(EngineError::InvalidInput(format!(
            "amount must be a positive finite number, got {amount}"
        )));
    }
    if !monthly_rate.is_finite() || monthly_rate < 0.0 {
        return Err(EngineError::InvalidInput(format!(
            "monthly rate must be finite and >= 0, got {monthly_rate}"
        )));
    }
    if months == 0 {
        return Err(EngineError::InvalidInput(
            "term must be at least one month".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    #[test]
    fn known_installment_for_reference_loan() {
        // 2,000,000 at 8% over 15 years.
        let emi = monthly_installment(2_000_000.0, 0.08 / 12.0, 180).expect("valid emi");
        assert_approx_tol(emi, 19_113.0, 2.0);
    }

    #[test]
    fn zero_rate_is_straight_division() {
        let emi = monthly_installment(120_000.0, 0.0, 120).expect("valid emi");
        assert_approx_tol(emi, 1_000.0, 1e-9);
    }

    #[test]
    fn inverse_round_trips_the_formula() {
        let rate = 0.09 / 12.0;
        let emi = monthly_installment(3_500_000.0, rate, 240).expect("valid emi");
        let principal = principal_from_installment(emi, rate, 240).expect("valid principal");
        assert_approx_tol(principal, 3_500_000.0, 1e-4);
    }

    #[test]
    fn inverse_zero_rate_is_multiplication() {
        let principal = principal_from_installment(2_500.0, 0.0, 48).expect("valid principal");
        assert_approx_tol(principal, 120_000.0, 1e-9);
    }

    #[test]
    fn rejects_non_positive_principal() {
        assert!(matches!(
            monthly_installment(0.0, 0.01, 12),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            monthly_installment(-5.0, 0.01, 12),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_non_finite_inputs() {
        assert!(matches!(
            monthly_installment(f64::NAN, 0.01, 12),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            monthly_installment(1_000.0, f64::INFINITY, 12),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            monthly_installment(1_000.0, -0.01, 12),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_zero_term() {
        assert!(matches!(
            monthly_installment(1_000.0, 0.01, 0),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn clamps_extreme_inputs_instead_of_overflowing() {
        let emi = monthly_installment(1.0e18, 2.0, 10_000).expect("clamped emi");
        assert!(emi.is_finite());
        let capped =
            monthly_installment(MAX_PRINCIPAL, MAX_ANNUAL_RATE_PERCENT / 12.0 / 100.0, 600)
                .expect("capped emi");
        assert_approx_tol(emi, capped, 1e-6);
    }

    #[test]
    fn months_to_amortize_matches_term_for_fresh_loan() {
        let rate = 0.08 / 12.0;
        let emi = monthly_installment(2_000_000.0, rate, 180).expect("valid emi");
        let months = months_to_amortize(2_000_000.0, emi, rate).expect("amortizable");
        assert_approx_tol(months, 180.0, 1e-6);
    }

    #[test]
    fn months_to_amortize_zero_rate() {
        let months = months_to_amortize(1_200.0, 100.0, 0.0).expect("amortizable");
        assert_approx_tol(months, 12.0, 1e-9);
    }

    #[test]
    fn months_to_amortize_reports_unpayable_loans() {
        // Installment below the monthly interest accrual never amortizes.
        assert_eq!(months_to_amortize(1_000_000.0, 100.0, 0.01), None);
    }
}
