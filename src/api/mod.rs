use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    AffordabilityInput, EmploymentType, LoanScenario, LoanTerms, PartPaymentFrequency,
    PartPaymentInstruction, PartPaymentStrategy, compare_scenarios, compute_schedule,
    estimate_affordability,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliEmployment {
    Salaried,
    SelfEmployed,
    BusinessOwner,
}

impl From<CliEmployment> for EmploymentType {
    fn from(value: CliEmployment) -> Self {
        match value {
            CliEmployment::Salaried => EmploymentType::Salaried,
            CliEmployment::SelfEmployed => EmploymentType::SelfEmployed,
            CliEmployment::BusinessOwner => EmploymentType::BusinessOwner,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiFrequency {
    #[serde(alias = "oneTime", alias = "one_time", alias = "once")]
    OneTime,
    Monthly,
    Quarterly,
    #[serde(alias = "halfYearly", alias = "half_yearly")]
    HalfYearly,
    Yearly,
}

impl From<ApiFrequency> for PartPaymentFrequency {
    fn from(value: ApiFrequency) -> Self {
        match value {
            ApiFrequency::OneTime => PartPaymentFrequency::OneTime,
            ApiFrequency::Monthly => PartPaymentFrequency::Monthly,
            ApiFrequency::Quarterly => PartPaymentFrequency::Quarterly,
            ApiFrequency::HalfYearly => PartPaymentFrequency::HalfYearly,
            ApiFrequency::Yearly => PartPaymentFrequency::Yearly,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiStrategy {
    #[serde(alias = "reduceTenure", alias = "reduce_tenure")]
    ReduceTenure,
    #[serde(alias = "reduceEmi", alias = "reduce_emi")]
    ReduceEmi,
}

impl From<ApiStrategy> for PartPaymentStrategy {
    fn from(value: ApiStrategy) -> Self {
        match value {
            ApiStrategy::ReduceTenure => PartPaymentStrategy::ReduceTenure,
            ApiStrategy::ReduceEmi => PartPaymentStrategy::ReduceEmi,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiEmployment {
    Salaried,
    #[serde(alias = "selfEmployed", alias = "self_employed")]
    SelfEmployed,
    #[serde(alias = "businessOwner", alias = "business_owner", alias = "business")]
    BusinessOwner,
}

impl From<ApiEmployment> for CliEmployment {
    fn from(value: ApiEmployment) -> Self {
        match value {
            ApiEmployment::Salaried => CliEmployment::Salaried,
            ApiEmployment::SelfEmployed => CliEmployment::SelfEmployed,
            ApiEmployment::BusinessOwner => CliEmployment::BusinessOwner,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SchedulePayload {
    principal: Option<f64>,
    #[serde(alias = "annualRate")]
    annual_rate_percent: Option<f64>,
    tenure_years: Option<u32>,
    start_month: Option<u32>,
    start_year: Option<i32>,
    part_payments: Vec<PartPaymentPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartPaymentPayload {
    id: Option<u32>,
    month: u32,
    year: i32,
    amount: f64,
    frequency: Option<ApiFrequency>,
    strategy: Option<ApiStrategy>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ComparePayload {
    scenarios: Vec<ScenarioPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ScenarioPayload {
    name: Option<String>,
    principal: Option<f64>,
    #[serde(alias = "annualRate")]
    annual_rate_percent: Option<f64>,
    tenure_years: Option<u32>,
    start_month: Option<u32>,
    start_year: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AffordabilityPayload {
    monthly_income: Option<f64>,
    tenure_years: Option<u32>,
    #[serde(alias = "annualRate")]
    annual_rate_percent: Option<f64>,
    existing_obligations: Option<f64>,
    property_value: Option<f64>,
    credit_score: Option<u32>,
    employment: Option<ApiEmployment>,
}

#[derive(Parser, Debug)]
#[command(
    name = "loanplan",
    about = "Loan repayment planner (EMI schedule + part-payment strategies + scenario comparison + affordability)"
)]
struct Cli {
    #[arg(long, default_value_t = 2_000_000.0)]
    principal: f64,
    #[arg(long, default_value_t = 8.0, help = "Annual interest rate in percent, e.g. 8.5")]
    annual_rate: f64,
    #[arg(long, default_value_t = 15)]
    tenure_years: u32,
    #[arg(
        long,
        default_value_t = 1,
        help = "Calendar month of the first installment, 1-12"
    )]
    start_month: u32,
    #[arg(long, default_value_t = 2025)]
    start_year: i32,
    #[arg(
        long,
        default_value_t = 150_000.0,
        help = "Gross monthly income for affordability estimates"
    )]
    monthly_income: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Existing monthly installment obligations"
    )]
    existing_obligations: f64,
    #[arg(
        long,
        default_value_t = 10_000_000.0,
        help = "Collateral property value for the loan-to-value cap"
    )]
    property_value: f64,
    #[arg(long, help = "Credit score, 300-900; qualification multipliers apply only when supplied")]
    credit_score: Option<u32>,
    #[arg(long, value_enum, default_value_t = CliEmployment::Salaried)]
    employment: CliEmployment,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_terms(cli: &Cli) -> Result<LoanTerms, String> {
    if !cli.principal.is_finite() || cli.principal <= 0.0 {
        return Err("--principal must be > 0".to_string());
    }

    if !cli.annual_rate.is_finite() || cli.annual_rate < 0.0 {
        return Err("--annual-rate must be >= 0".to_string());
    }

    if cli.tenure_years == 0 {
        return Err("--tenure-years must be > 0".to_string());
    }

    if !(1..=12).contains(&cli.start_month) {
        return Err("--start-month must be between 1 and 12".to_string());
    }

    if !(1900..=2200).contains(&cli.start_year) {
        return Err("--start-year must be between 1900 and 2200".to_string());
    }

    Ok(LoanTerms {
        principal: cli.principal,
        annual_rate_percent: cli.annual_rate,
        tenure_years: cli.tenure_years,
        start_month: cli.start_month,
        start_year: cli.start_year,
    })
}

fn build_affordability_input(cli: &Cli) -> Result<AffordabilityInput, String> {
    if !cli.monthly_income.is_finite() || cli.monthly_income <= 0.0 {
        return Err("--monthly-income must be > 0".to_string());
    }

    if cli.tenure_years == 0 {
        return Err("--tenure-years must be > 0".to_string());
    }

    if !cli.annual_rate.is_finite() || cli.annual_rate < 0.0 {
        return Err("--annual-rate must be >= 0".to_string());
    }

    if !cli.existing_obligations.is_finite() || cli.existing_obligations < 0.0 {
        return Err("--existing-obligations must be >= 0".to_string());
    }

    if !cli.property_value.is_finite() || cli.property_value < 0.0 {
        return Err("--property-value must be >= 0".to_string());
    }

    if let Some(score) = cli.credit_score {
        if !(300..=900).contains(&score) {
            return Err("--credit-score must be between 300 and 900".to_string());
        }
    }

    Ok(AffordabilityInput {
        monthly_income: cli.monthly_income,
        tenure_years: cli.tenure_years,
        annual_rate_percent: cli.annual_rate,
        existing_obligations: cli.existing_obligations,
        property_value: cli.property_value,
        credit_score: cli.credit_score,
        employment: cli.employment.into(),
    })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/schedule",
            get(schedule_get_handler).post(schedule_post_handler),
        )
        .route("/api/compare", post(compare_post_handler))
        .route(
            "/api/affordability",
            get(affordability_get_handler).post(affordability_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    log::info!("loanplan HTTP API listening on http://{addr}");
    log::info!("Local access: http://127.0.0.1:{port}/api/schedule");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn schedule_get_handler(Query(payload): Query<SchedulePayload>) -> Response {
    schedule_handler_impl(payload)
}

async fn schedule_post_handler(Json(payload): Json<SchedulePayload>) -> Response {
    schedule_handler_impl(payload)
}

fn schedule_handler_impl(payload: SchedulePayload) -> Response {
    let (terms, part_payments) = match schedule_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return rejected(&msg),
    };

    match compute_schedule(&terms, &part_payments) {
        Ok(result) => json_response(StatusCode::OK, result),
        Err(e) => rejected(&e.to_string()),
    }
}

async fn compare_post_handler(Json(payload): Json<ComparePayload>) -> Response {
    let scenarios = match compare_request_from_payload(payload) {
        Ok(scenarios) => scenarios,
        Err(msg) => return rejected(&msg),
    };

    match compare_scenarios(&scenarios) {
        Ok(comparison) => json_response(StatusCode::OK, comparison),
        Err(e) => rejected(&e.to_string()),
    }
}

async fn affordability_get_handler(Query(payload): Query<AffordabilityPayload>) -> Response {
    affordability_handler_impl(payload)
}

async fn affordability_post_handler(Json(payload): Json<AffordabilityPayload>) -> Response {
    affordability_handler_impl(payload)
}

fn affordability_handler_impl(payload: AffordabilityPayload) -> Response {
    let input = match affordability_request_from_payload(payload) {
        Ok(input) => input,
        Err(msg) => return rejected(&msg),
    };

    match estimate_affordability(&input) {
        Ok(result) => json_response(StatusCode::OK, result),
        Err(e) => rejected(&e.to_string()),
    }
}

fn rejected(msg: &str) -> Response {
    log::warn!("rejected request: {msg}");
    error_response(StatusCode::BAD_REQUEST, msg)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn schedule_request_from_json(
    json: &str,
) -> Result<(LoanTerms, Vec<PartPaymentInstruction>), String> {
    let payload = serde_json::from_str::<SchedulePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    schedule_request_from_payload(payload)
}

fn schedule_request_from_payload(
    payload: SchedulePayload,
) -> Result<(LoanTerms, Vec<PartPaymentInstruction>), String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.principal {
        cli.principal = v;
    }
    if let Some(v) = payload.annual_rate_percent {
        cli.annual_rate = v;
    }
    if let Some(v) = payload.tenure_years {
        cli.tenure_years = v;
    }
    if let Some(v) = payload.start_month {
        cli.start_month = v;
    }
    if let Some(v) = payload.start_year {
        cli.start_year = v;
    }

    let terms = build_terms(&cli)?;
    let part_payments = payload
        .part_payments
        .into_iter()
        .enumerate()
        .map(|(i, p)| PartPaymentInstruction {
            id: p.id.unwrap_or(i as u32 + 1),
            month: p.month,
            year: p.year,
            amount: p.amount,
            frequency: p.frequency.map_or(PartPaymentFrequency::OneTime, Into::into),
            strategy: p.strategy.map_or(PartPaymentStrategy::ReduceTenure, Into::into),
        })
        .collect();

    Ok((terms, part_payments))
}

#[cfg(test)]
fn compare_request_from_json(json: &str) -> Result<Vec<LoanScenario>, String> {
    let payload = serde_json::from_str::<ComparePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    compare_request_from_payload(payload)
}

fn compare_request_from_payload(payload: ComparePayload) -> Result<Vec<LoanScenario>, String> {
    payload
        .scenarios
        .into_iter()
        .enumerate()
        .map(|(i, scenario)| {
            let mut cli = default_cli_for_api();
            if let Some(v) = scenario.principal {
                cli.principal = v;
            }
            if let Some(v) = scenario.annual_rate_percent {
                cli.annual_rate = v;
            }
            if let Some(v) = scenario.tenure_years {
                cli.tenure_years = v;
            }
            if let Some(v) = scenario.start_month {
                cli.start_month = v;
            }
            if let Some(v) = scenario.start_year {
                cli.start_year = v;
            }

            let terms = build_terms(&cli)?;
            Ok(LoanScenario {
                name: scenario
                    .name
                    .unwrap_or_else(|| format!("Scenario {}", i + 1)),
                terms,
            })
        })
        .collect()
}

#[cfg(test)]
fn affordability_request_from_json(json: &str) -> Result<AffordabilityInput, String> {
    let payload = serde_json::from_str::<AffordabilityPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    affordability_request_from_payload(payload)
}

fn affordability_request_from_payload(
    payload: AffordabilityPayload,
) -> Result<AffordabilityInput, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.monthly_income {
        cli.monthly_income = v;
    }
    if let Some(v) = payload.tenure_years {
        cli.tenure_years = v;
    }
    if let Some(v) = payload.annual_rate_percent {
        cli.annual_rate = v;
    }
    if let Some(v) = payload.existing_obligations {
        cli.existing_obligations = v;
    }
    if let Some(v) = payload.property_value {
        cli.property_value = v;
    }
    if let Some(v) = payload.credit_score {
        cli.credit_score = Some(v);
    }
    if let Some(v) = payload.employment {
        cli.employment = v.into();
    }

    build_affordability_input(&cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        principal: 2_000_000.0,
        annual_rate: 8.0,
        tenure_years: 15,
        start_month: 1,
        start_year: 2025,
        monthly_income: 150_000.0,
        existing_obligations: 0.0,
        property_value: 10_000_000.0,
        credit_score: None,
        employment: CliEmployment::Salaried,
    }
}
