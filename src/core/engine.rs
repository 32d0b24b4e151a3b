use super::emi::{self, BALANCE_EPSILON, MAX_ANNUAL_RATE_PERCENT, MAX_PRINCIPAL, MAX_TENURE_MONTHS};
use super::error::EngineError;
use super::types::{
    ExpandedPartPayment, LoanCalculationResult, LoanScenario, LoanTerms, PartPaymentInstruction,
    PartPaymentStrategy, ScenarioComparison, ScenarioResult, ScheduleEntry, YearlySummary,
};

const MIN_CALENDAR_YEAR: i32 = 1900;
const MAX_CALENDAR_YEAR: i32 = 2200;

/// Most scenarios the comparison view accepts: one base plus three edits.
const MAX_SCENARIOS: usize = 4;

const EMI_WEIGHT: f64 = 0.3;
const INTEREST_WEIGHT: f64 = 0.5;
const TENURE_WEIGHT: f64 = 0.2;

fn month_index(month: u32, year: i32) -> i64 {
    year as i64 * 12 + (month as i64 - 1)
}

fn index_to_month_year(index: i64) -> (u32, i32) {
    ((index.rem_euclid(12)) as u32 + 1, index.div_euclid(12) as i32)
}

/// Loop-carried state of the month-by-month simulation.
struct AmortizationState {
    balance: f64,
    installment: f64,
    /// First month index past the last scheduled payment. Reduce-tenure
    /// payments pull it in; reduce-emi reads it to re-derive the installment.
    adjusted_end_index: i64,
    total_interest: f64,
    total_paid: f64,
}

/// Materializes every occurrence of the given instructions inside the loan
/// window, ordered chronologically. Same-month occurrences are left
/// unmerged; the simulator sums them.
pub fn expand_part_payments(
    instructions: &[PartPaymentInstruction],
    terms: &LoanTerms,
) -> Vec<ExpandedPartPayment> {
    let start = month_index(terms.start_month, terms.start_year);
    let last_scheduled = start + terms.tenure_months() as i64 - 1;

    let mut events = Vec::new();
    for instruction in instructions {
        let first = month_index(instruction.month, instruction.year);
        match instruction.frequency.interval_months() {
            None => {
                if (start..=last_scheduled).contains(&first) {
                    events.push(event_at(first, instruction));
                }
            }
            Some(step) => {
                let mut index = first;
                while index <= last_scheduled {
                    if index >= start {
                        events.push(event_at(index, instruction));
                    }
                    index += step as i64;
                }
            }
        }
    }

    events.sort_by_key(|event| month_index(event.month, event.year));
    events
}

fn event_at(index: i64, instruction: &PartPaymentInstruction) -> ExpandedPartPayment {
    let (month, year) = index_to_month_year(index);
    ExpandedPartPayment {
        month,
        year,
        amount: instruction.amount,
        strategy: instruction.strategy,
    }
}

/// Runs the full amortization simulation: one pass over the loan months,
/// applying interest, principal, and part payments, re-deriving the
/// horizon or the installment as the payment strategies demand.
pub fn compute_schedule(
    terms: &LoanTerms,
    instructions: &[PartPaymentInstruction],
) -> Result<LoanCalculationResult, EngineError> {
    validate_terms(terms)?;
    validate_instructions(instructions)?;

    let terms = bounded_terms(terms);
    let rate = terms.monthly_rate();
    let tenure_months = terms.tenure_months();
    let nominal_emi = emi::monthly_installment(terms.principal, rate, tenure_months)?;

    let events = expand_part_payments(instructions, &terms);
    let start_index = month_index(terms.start_month, terms.start_year);
    let end_index = start_index + tenure_months as i64;

    let mut state = AmortizationState {
        balance: terms.principal,
        installment: nominal_emi,
        adjusted_end_index: end_index,
        total_interest: 0.0,
        total_paid: 0.0,
    };

    let mut schedule = Vec::with_capacity(tenure_months as usize);
    let mut cursor = 0usize;
    let mut index = start_index;

    // Single termination rule: the nominal horizon bounds every mode, since
    // neither strategy may push the payoff past the original end date.
    while index < end_index && state.balance > BALANCE_EPSILON {
        let interest = state.balance * rate;
        let mut principal_component = state.installment - interest;
        if principal_component > state.balance {
            principal_component = state.balance;
        }
        if principal_component < 0.0 {
            principal_component = 0.0;
        }
        let charged = interest + principal_component;

        let mut part_payment = 0.0;
        let mut reduce_tenure_seen = false;
        let mut reduce_emi_seen = false;
        while cursor < events.len() {
            let event = &events[cursor];
            let event_index = month_index(event.month, event.year);
            if event_index > index {
                break;
            }
            if event_index == index {
                part_payment += event.amount;
                match event.strategy {
                    PartPaymentStrategy::ReduceTenure => reduce_tenure_seen = true,
                    PartPaymentStrategy::ReduceEmi => reduce_emi_seen = true,
                }
            }
            cursor += 1;
        }

        let headroom = state.balance - principal_component;
        if part_payment > headroom {
            part_payment = headroom.max(0.0);
        }

        state.balance -= principal_component + part_payment;
        if state.balance < -BALANCE_EPSILON {
            return Err(EngineError::InconsistentSchedule(format!(
                "remaining balance fell to {} at month index {index}",
                state.balance
            )));
        }
        if state.balance < 0.0 {
            state.balance = 0.0;
        }

        state.total_interest += interest;
        state.total_paid += charged + part_payment;

        if part_payment > 0.0 && state.balance > BALANCE_EPSILON {
            // Reduce-tenure first; a same-month reduce-emi reads the
            // already-shortened horizon.
            if reduce_tenure_seen {
                if let Some(months) = emi::months_to_amortize(state.balance, state.installment, rate)
                {
                    let recomputed = index + 1 + months.ceil() as i64;
                    state.adjusted_end_index = recomputed.clamp(index + 1, end_index);
                }
            }
            if reduce_emi_seen {
                let remaining = (state.adjusted_end_index - (index + 1)).max(1) as u32;
                state.installment = emi::monthly_installment(state.balance, rate, remaining)?;
            }
        }

        let (month, year) = index_to_month_year(index);
        schedule.push(ScheduleEntry {
            month,
            year,
            emi_amount: charged,
            principal_component,
            interest_component: interest,
            remaining_balance: state.balance,
            part_payment_amount: part_payment,
        });
        index += 1;
    }

    let yearly_summary = summarize_by_year(&schedule);
    Ok(LoanCalculationResult {
        emi: nominal_emi,
        total_interest_paid: state.total_interest,
        total_amount_paid: state.total_paid,
        schedule,
        yearly_summary,
    })
}

/// Simulates every scenario independently with part payments stripped,
/// then scores them on a 0-100 min-max scale per metric (100 = cheapest)
/// and picks the highest weighted score, first-wins on ties.
pub fn compare_scenarios(scenarios: &[LoanScenario]) -> Result<ScenarioComparison, EngineError> {
    if scenarios.is_empty() {
        return Err(EngineError::InvalidInput(
            "at least one scenario is required".to_string(),
        ));
    }
    if scenarios.len() > MAX_SCENARIOS {
        return Err(EngineError::InvalidInput(format!(
            "at most {MAX_SCENARIOS} scenarios are supported, got {}",
            scenarios.len()
        )));
    }

    let mut runs = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        let result = compute_schedule(&scenario.terms, &[])?;
        runs.push((
            scenario.name.clone(),
            result.emi,
            result.total_interest_paid,
            result.total_amount_paid,
            result.schedule.len() as u32,
        ));
    }

    let emi_scores = lower_is_better_scores(runs.iter().map(|r| r.1));
    let interest_scores = lower_is_better_scores(runs.iter().map(|r| r.2));
    let tenure_scores = lower_is_better_scores(runs.iter().map(|r| r.4 as f64));

    let mut results = Vec::with_capacity(runs.len());
    for (i, (name, emi_amount, total_interest, total_amount, tenure_months)) in
        runs.into_iter().enumerate()
    {
        let weighted_score = EMI_WEIGHT * emi_scores[i]
            + INTEREST_WEIGHT * interest_scores[i]
            + TENURE_WEIGHT * tenure_scores[i];
        results.push(ScenarioResult {
            name,
            emi: emi_amount,
            total_interest,
            total_amount,
            tenure_months,
            emi_score: emi_scores[i],
            interest_score: interest_scores[i],
            tenure_score: tenure_scores[i],
            weighted_score,
        });
    }

    let mut winner_index = 0;
    for (i, result) in results.iter().enumerate().skip(1) {
        if result.weighted_score > results[winner_index].weighted_score {
            winner_index = i;
        }
    }

    Ok(ScenarioComparison {
        winner_name: results[winner_index].name.clone(),
        winner_score: results[winner_index].weighted_score,
        winner_index,
        scenarios: results,
    })
}

fn lower_is_better_scores(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let values: Vec<f64> = values.collect();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    values
        .iter()
        .map(|v| {
            if span <= 0.0 {
                100.0
            } else {
                100.0 * (max - v) / span
            }
        })
        .collect()
}

fn summarize_by_year(schedule: &[ScheduleEntry]) -> Vec<YearlySummary> {
    let mut years: Vec<YearlySummary> = Vec::new();
    for entry in schedule {
        match years.last_mut() {
            Some(last) if last.year == entry.year => {
                last.principal_paid += entry.principal_component;
                last.interest_paid += entry.interest_component;
                last.part_payments += entry.part_payment_amount;
                last.closing_balance = entry.remaining_balance;
            }
            _ => years.push(YearlySummary {
                year: entry.year,
                principal_paid: entry.principal_component,
                interest_paid: entry.interest_component,
                part_payments: entry.part_payment_amount,
                closing_balance: entry.remaining_balance,
            }),
        }
    }
    years
}

fn bounded_terms(terms: &LoanTerms) -> LoanTerms {
    LoanTerms {
        principal: terms.principal.min(MAX_PRINCIPAL),
        annual_rate_percent: terms.annual_rate_percent.min(MAX_ANNUAL_RATE_PERCENT),
        tenure_years: terms.tenure_years.min(MAX_TENURE_MONTHS / 12),
        start_month: terms.start_month,
        start_year: terms.start_year,
    }
}

fn validate_terms(terms: &LoanTerms) -> Result<(), EngineError> {
    if !terms.principal.is_finite() || terms.principal <= 0.0 {
        return Err(EngineError::InvalidInput(format!(
            "principal must be a positive finite amount, got {}",
            terms.principal
        )));
    }
    if !terms.annual_rate_percent.is_finite() || terms.annual_rate_percent < 0.0 {
        return Err(EngineError::InvalidInput(format!(
            "annual rate must be finite and >= 0, got {}",
            terms.annual_rate_percent
        )));
    }
    if terms.tenure_years == 0 {
        return Err(EngineError::InvalidInput(
            "tenure must be at least one year".to_string(),
        ));
    }
    validate_calendar(terms.start_month, terms.start_year, "start")
}

fn validate_instructions(instructions: &[PartPaymentInstruction]) -> Result<(), EngineError> {
    for instruction in instructions {
        if !instruction.amount.is_finite() || instruction.amount <= 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "part payment {} amount must be a positive finite amount, got {}",
                instruction.id, instruction.amount
            )));
        }
        validate_calendar(instruction.month, instruction.year, "part payment")?;
    }
    Ok(())
}

fn validate_calendar(month: u32, year: i32, what: &str) -> Result<(), EngineError> {
    if !(1..=12).contains(&month) {
        return Err(EngineError::InvalidInput(format!(
            "{what} month must be 1-12, got {month}"
        )));
    }
    if !(MIN_CALENDAR_YEAR..=MAX_CALENDAR_YEAR).contains(&year) {
        return Err(EngineError::InvalidInput(format!(
            "{what} year must be {MIN_CALENDAR_YEAR}-{MAX_CALENDAR_YEAR}, got {year}"
        )));
    }
    Ok(())
}
