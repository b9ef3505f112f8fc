use clap::Args;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use equity_dcf_core::valuation::{dcf, sensitivity};
use equity_dcf_core::{Assumptions, FinancialInputs};

use crate::input;

/// Inputs and assumptions shared by the dcf and sensitivity commands.
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ModelArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Most recent annual revenue
    #[arg(long)]
    pub latest_revenue: Option<Decimal>,

    /// Total debt
    #[arg(long, default_value = "0")]
    pub total_debt: Decimal,

    /// Cash and equivalents
    #[arg(long, default_value = "0")]
    pub cash: Decimal,

    /// Shares outstanding (0 = unknown)
    #[arg(long, default_value = "0")]
    pub shares: Decimal,

    /// Current market price per share (0 = unknown)
    #[arg(long, default_value = "0")]
    pub price: Decimal,

    /// Annual revenue growth rate in percent
    #[arg(long, default_value = "5", allow_hyphen_values = true)]
    pub growth_rate: Decimal,

    /// Operating margin in percent
    #[arg(long, default_value = "20", allow_hyphen_values = true)]
    pub operating_margin: Decimal,

    /// Tax rate in percent
    #[arg(long, default_value = "21")]
    pub tax_rate: Decimal,

    /// Discount rate (WACC) in percent
    #[arg(long, default_value = "10")]
    pub wacc: Decimal,

    /// Terminal growth rate in percent
    #[arg(long, default_value = "2.5", allow_hyphen_values = true)]
    pub terminal_growth: Decimal,

    /// Projection years
    #[arg(long, default_value = "5")]
    pub years: u32,
}

/// Arguments for DCF valuation
#[derive(Args)]
pub struct DcfArgs {
    #[command(flatten)]
    pub model: ModelArgs,
}

/// Arguments for sensitivity analysis
#[derive(Args)]
pub struct SensitivityArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Comma-separated WACC offsets in percentage points (e.g. "-2,-1,0,1,2")
    #[arg(long, allow_hyphen_values = true)]
    pub wacc_offsets: Option<String>,

    /// Comma-separated terminal-growth offsets in percentage points
    #[arg(long, allow_hyphen_values = true)]
    pub growth_offsets: Option<String>,
}

/// JSON request shape accepted via --input or piped stdin.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValuationRequest {
    pub inputs: FinancialInputs,
    pub assumptions: Assumptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wacc_offsets: Option<Vec<Decimal>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_offsets: Option<Vec<Decimal>>,
}

fn resolve_request(args: &ModelArgs) -> Result<ValuationRequest, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        return input::file::read_json(path);
    }
    if let Some(request) = input::stdin::read_stdin::<ValuationRequest>()? {
        return Ok(request);
    }

    let latest_revenue = args
        .latest_revenue
        .ok_or("--latest-revenue is required (or provide --input / pipe JSON)")?;

    Ok(ValuationRequest {
        inputs: FinancialInputs {
            latest_revenue,
            total_debt: args.total_debt,
            cash_and_equivalents: args.cash,
            shares_outstanding: args.shares,
            current_price: args.price,
        },
        assumptions: Assumptions {
            revenue_growth_rate: args.growth_rate,
            operating_margin: args.operating_margin,
            tax_rate: args.tax_rate,
            wacc: args.wacc,
            terminal_growth_rate: args.terminal_growth,
            projection_years: args.years,
        },
        wacc_offsets: None,
        growth_offsets: None,
    })
}

fn parse_offsets(spec: &str) -> Result<Vec<Decimal>, Box<dyn std::error::Error>> {
    spec.split(',')
        .map(|s| {
            s.trim()
                .parse::<Decimal>()
                .map_err(|e| format!("Invalid offset '{}': {}", s.trim(), e).into())
        })
        .collect()
}

pub fn run_dcf(args: DcfArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = resolve_request(&args.model)?;
    let result = dcf::calculate_valuation(&request.inputs, &request.assumptions)?;
    Ok(serde_json::to_value(&result)?)
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = resolve_request(&args.model)?;

    // Flags win over offsets embedded in the JSON request
    let wacc_offsets = match args.wacc_offsets {
        Some(ref spec) => Some(parse_offsets(spec)?),
        None => request.wacc_offsets.clone(),
    };
    let growth_offsets = match args.growth_offsets {
        Some(ref spec) => Some(parse_offsets(spec)?),
        None => request.growth_offsets.clone(),
    };

    let result = sensitivity::build_sensitivity_grid(
        &request.inputs,
        &request.assumptions,
        wacc_offsets.as_deref(),
        growth_offsets.as_deref(),
    )?;
    Ok(serde_json::to_value(&result)?)
}
