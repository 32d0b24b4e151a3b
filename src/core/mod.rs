mod affordability;
mod emi;
mod engine;
mod error;
mod types;

pub use affordability::estimate_affordability;
pub use emi::{monthly_installment, principal_from_installment, BALANCE_EPSILON};
pub use engine::{compare_scenarios, compute_schedule, expand_part_payments};
pub use error::EngineError;
pub use types::{
    AffordabilityInput, AffordabilityResult, EmploymentType, ExpandedPartPayment,
    LoanCalculationResult, LoanScenario, LoanTerms, PartPaymentFrequency, PartPaymentInstruction,
    PartPaymentStrategy, ScenarioComparison, ScenarioResult, ScheduleEntry, YearlySummary,
};
