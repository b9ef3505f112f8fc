use clap::Args;
use serde_json::Value;

use equity_dcf_core::valuation::assumptions::{
    derive_default_assumptions, financial_inputs, summarize_fundamentals, FundamentalsHistory,
};

use crate::input;

/// Arguments for assumption defaulting
#[derive(Args)]
pub struct AssumptionsArgs {
    /// Path to JSON file with a fundamentals history
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_assumptions(args: AssumptionsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let history: FundamentalsHistory = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(piped) = input::stdin::read_stdin::<FundamentalsHistory>()? {
        piped
    } else {
        return Err("--input is required (or pipe a fundamentals history as JSON)".into());
    };

    let fundamentals = summarize_fundamentals(&history)?;
    let assumptions = derive_default_assumptions(&fundamentals);
    let inputs = financial_inputs(&fundamentals);

    Ok(serde_json::json!({
        "fundamentals": fundamentals,
        "assumptions": assumptions,
        "inputs": inputs,
    }))
}
