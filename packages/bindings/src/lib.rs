use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use equity_dcf_core::valuation::{assumptions, dcf, sensitivity};
use equity_dcf_core::{Assumptions, FinancialInputs};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

#[derive(Deserialize)]
struct ValuationRequest {
    inputs: FinancialInputs,
    assumptions: Assumptions,
    #[serde(default)]
    wacc_offsets: Option<Vec<Decimal>>,
    #[serde(default)]
    growth_offsets: Option<Vec<Decimal>>,
}

#[napi]
pub fn calculate_valuation(input_json: String) -> NapiResult<String> {
    let request: ValuationRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = dcf::calculate_valuation(&request.inputs, &request.assumptions)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn build_sensitivity_grid(input_json: String) -> NapiResult<String> {
    let request: ValuationRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = sensitivity::build_sensitivity_grid(
        &request.inputs,
        &request.assumptions,
        request.wacc_offsets.as_deref(),
        request.growth_offsets.as_deref(),
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Aggregate a fundamentals history and derive the pre-filled assumption set
/// plus the engine inputs, in one call for the dashboard's DCF screen.
#[napi]
pub fn derive_dcf_defaults(history_json: String) -> NapiResult<String> {
    let history: assumptions::FundamentalsHistory =
        serde_json::from_str(&history_json).map_err(to_napi_error)?;
    let fundamentals = assumptions::summarize_fundamentals(&history).map_err(to_napi_error)?;
    let defaults = assumptions::derive_default_assumptions(&fundamentals);
    let inputs = assumptions::financial_inputs(&fundamentals);

    serde_json::to_string(&serde_json::json!({
        "fundamentals": fundamentals,
        "assumptions": defaults,
        "inputs": inputs,
    }))
    .map_err(to_napi_error)
}
