mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::assumptions::AssumptionsArgs;
use commands::valuation::{DcfArgs, SensitivityArgs};

/// Single-equity intrinsic value estimation
#[derive(Parser)]
#[command(
    name = "edcf",
    version,
    about = "Discounted cash flow valuation for a single equity",
    long_about = "Estimate a company's intrinsic value per share from its \
                  fundamentals with decimal precision. Projects free cash flow \
                  as after-tax operating income, discounts at WACC with a \
                  Gordon growth terminal value, and sweeps WACC and terminal \
                  growth into a sensitivity surface."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a DCF valuation
    Dcf(DcfArgs),
    /// Build the WACC x terminal-growth sensitivity grid
    Sensitivity(SensitivityArgs),
    /// Derive default assumptions from a fundamentals history
    Assumptions(AssumptionsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Dcf(args) => commands::valuation::run_dcf(args),
        Commands::Sensitivity(args) => commands::valuation::run_sensitivity(args),
        Commands::Assumptions(args) => commands::assumptions::run_assumptions(args),
        Commands::Version => {
            println!("edcf {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
