use serde::Serialize;

use super::emi::MAX_TENURE_MONTHS;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PartPaymentFrequency {
    OneTime,
    Monthly,
    Quarterly,
    HalfYearly,
    Yearly,
}

impl PartPaymentFrequency {
    /// Months between recurring occurrences; `None` for a one-time payment.
    pub fn interval_months(self) -> Option<u32> {
        match self {
            PartPaymentFrequency::OneTime => None,
            PartPaymentFrequency::Monthly => Some(1),
            PartPaymentFrequency::Quarterly => Some(3),
            PartPaymentFrequency::HalfYearly => Some(6),
            PartPaymentFrequency::Yearly => Some(12),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PartPaymentStrategy {
    /// Shorten the payoff horizon, installment unchanged.
    ReduceTenure,
    /// Lower future installments, payoff date unchanged.
    ReduceEmi,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EmploymentType {
    Salaried,
    SelfEmployed,
    BusinessOwner,
}

/// Immutable input to one simulation run.
#[derive(Debug, Clone)]
pub struct LoanTerms {
    pub principal: f64,
    pub annual_rate_percent: f64,
    pub tenure_years: u32,
    /// Calendar month of the first installment, 1-12.
    pub start_month: u32,
    pub start_year: i32,
}

impl LoanTerms {
    pub fn monthly_rate(&self) -> f64 {
        self.annual_rate_percent / 12.0 / 100.0
    }

    pub fn tenure_months(&self) -> u32 {
        self.tenure_years.saturating_mul(12).min(MAX_TENURE_MONTHS)
    }
}

/// A user-authored extra-principal payment, possibly recurring.
#[derive(Debug, Clone)]
pub struct PartPaymentInstruction {
    pub id: u32,
    /// First occurrence, 1-12.
    pub month: u32,
    pub year: i32,
    pub amount: f64,
    pub frequency: PartPaymentFrequency,
    pub strategy: PartPaymentStrategy,
}

/// One concrete occurrence of an instruction inside the loan window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpandedPartPayment {
    pub month: u32,
    pub year: i32,
    pub amount: f64,
    pub strategy: PartPaymentStrategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub month: u32,
    pub year: i32,
    /// Installment actually charged this month; the final month may be a
    /// balloon of interest plus residual principal.
    pub emi_amount: f64,
    pub principal_component: f64,
    pub interest_component: f64,
    pub remaining_balance: f64,
    pub part_payment_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlySummary {
    pub year: i32,
    pub principal_paid: f64,
    pub interest_paid: f64,
    pub part_payments: f64,
    pub closing_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanCalculationResult {
    /// Nominal installment from the original terms, kept for reference even
    /// when part payments later override the charged amount.
    pub emi: f64,
    pub total_interest_paid: f64,
    pub total_amount_paid: f64,
    pub schedule: Vec<ScheduleEntry>,
    pub yearly_summary: Vec<YearlySummary>,
}

/// A named set of loan terms entered in the comparison view.
#[derive(Debug, Clone)]
pub struct LoanScenario {
    pub name: String,
    pub terms: LoanTerms,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub name: String,
    pub emi: f64,
    pub total_interest: f64,
    pub total_amount: f64,
    pub tenure_months: u32,
    pub emi_score: f64,
    pub interest_score: f64,
    pub tenure_score: f64,
    pub weighted_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioComparison {
    pub scenarios: Vec<ScenarioResult>,
    pub winner_index: usize,
    pub winner_name: String,
    pub winner_score: f64,
}

#[derive(Debug, Clone)]
pub struct AffordabilityInput {
    pub monthly_income: f64,
    pub tenure_years: u32,
    pub annual_rate_percent: f64,
    pub existing_obligations: f64,
    pub property_value: f64,
    pub credit_score: Option<u32>,
    pub employment: EmploymentType,
}

/// Every intermediate is exposed so callers can render the breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffordabilityResult {
    pub max_allowed_installment: f64,
    pub available_for_new_installment: f64,
    pub base_eligible_principal: f64,
    pub credit_score_multiplier: f64,
    pub employment_multiplier: f64,
    pub income_based_eligibility: f64,
    pub loan_to_value_limit: f64,
    pub eligible_principal: f64,
}
