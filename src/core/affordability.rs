use super::emi;
use super::error::EngineError;
use super::types::{AffordabilityInput, AffordabilityResult, EmploymentType};

/// Fixed-Obligations-to-Income-Ratio cap: at most half of gross income may
/// service installments.
const FOIR: f64 = 0.5;

/// Loan-to-value cap on the collateral property.
const LTV_STANDARD: f64 = 0.75;
/// Relaxed cap for borrowers with a known score of 750 or better.
const LTV_PRIME: f64 = 0.85;

const MIN_CREDIT_SCORE: u32 = 300;
const MAX_CREDIT_SCORE: u32 = 900;
const PRIME_CREDIT_SCORE: u32 = 750;

/// Band table applied only when a score is supplied.
pub fn credit_score_multiplier(score: u32) -> f64 {
    match score {
        800.. => 1.10,
        750.. => 1.00,
        700.. => 0.90,
        650.. => 0.80,
        _ => 0.70,
    }
}

pub fn employment_multiplier(employment: EmploymentType) -> f64 {
    match employment {
        EmploymentType::Salaried => 1.00,
        EmploymentType::BusinessOwner => 0.90,
        EmploymentType::SelfEmployed => 0.85,
    }
}

/// Inverts the installment formula under the FOIR budget, applies the
/// qualification multipliers, then caps the result by the LTV limit.
pub fn estimate_affordability(
    input: &AffordabilityInput,
) -> Result<AffordabilityResult, EngineError> {
    validate_input(input)?;

    let max_allowed_installment = input.monthly_income * FOIR;
    let available_for_new_installment =
        (max_allowed_installment - input.existing_obligations).max(0.0);

    let monthly_rate = input.annual_rate_percent / 12.0 / 100.0;
    let months = input.tenure_years.min(emi::MAX_TENURE_MONTHS / 12) * 12;
    let base_eligible_principal = if available_for_new_installment > 0.0 {
        emi::principal_from_installment(available_for_new_installment, monthly_rate, months)?
    } else {
        0.0
    };

    let credit_multiplier = input.credit_score.map_or(1.0, credit_score_multiplier);
    let employment_multiplier = employment_multiplier(input.employment);
    let income_based_eligibility =
        base_eligible_principal * credit_multiplier * employment_multiplier;

    let ltv = match input.credit_score {
        Some(score) if score >= PRIME_CREDIT_SCORE => LTV_PRIME,
        _ => LTV_STANDARD,
    };
    let loan_to_value_limit = input.property_value * ltv;

    let eligible_principal = income_based_eligibility.min(loan_to_value_limit).max(0.0);

    Ok(AffordabilityResult {
        max_allowed_installment,
        available_for_new_installment,
        base_eligible_principal,
        credit_score_multiplier: credit_multiplier,
        employment_multiplier,
        income_based_eligibility,
        loan_to_value_limit,
        eligible_principal,
    })
}

fn validate_input(input: &AffordabilityInput) -> Result<(), EngineError> {
    if !input.monthly_income.is_finite() || input.monthly_income <= 0.0 {
        return Err(EngineError::InvalidInput(format!(
            "monthly income must be a positive finite amount, got {}",
            input.monthly_income
        )));
    }
    if input.tenure_years == 0 {
        return Err(EngineError::InvalidInput(
            "tenure must be at least one year".to_string(),
        ));
    }
    if !input.annual_rate_percent.is_finite() || input.annual_rate_percent < 0.0 {
        return Err(EngineError::InvalidInput(format!(
            "annual rate must be finite and >= 0, got {}",
            input.annual_rate_percent
        )));
    }
    if !input.existing_obligations.is_finite() || input.existing_obligations < 0.0 {
        return Err(EngineError::InvalidInput(format!(
            "existing obligations must be finite and >= 0, got {}",
            input.existing_obligations
        )));
    }
    if !input.property_value.is_finite() || input.property_value < 0.0 {
        return Err(EngineError::InvalidInput(format!(
            "property value must be finite and >= 0, got {}",
            input.property_value
        )));
    }
    if let Some(score) = input.credit_score {
        if !(MIN_CREDIT_SCORE..=MAX_CREDIT_SCORE).contains(&score) {
            return Err(EngineError::InvalidInput(format!(
                "credit score must be {MIN_CREDIT_SCORE}-{MAX_CREDIT_SCORE}, got {score}"
            )));
        }
    }
    Ok(())
}
