use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimal fractions (0.05 = 5%). Used at the
/// fundamentals-aggregation boundary.
pub type Rate = Decimal;

/// Rates expressed in percent units (5 = 5%). The engine and the
/// user-adjustable assumptions work in percent; callers converting from a
/// `FundamentalsBundle` must multiply by 100.
pub type Percent = Decimal;

/// Balance-sheet and market facts for one company. Fetched once per symbol
/// and read-only for the life of a valuation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialInputs {
    /// Most recent annual revenue
    pub latest_revenue: Money,
    pub total_debt: Money,
    pub cash_and_equivalents: Money,
    /// Zero means unknown; per-share output degrades to zero
    pub shares_outstanding: Decimal,
    /// Zero means unknown; upside output degrades to zero
    pub current_price: Money,
}

/// User-adjustable model assumptions, in percent units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assumptions {
    /// Annual revenue growth; negative values model decline
    pub revenue_growth_rate: Percent,
    /// Operating margin; negative values model loss-making companies
    pub operating_margin: Percent,
    pub tax_rate: Percent,
    /// Discount rate
    pub wacc: Percent,
    /// Perpetuity growth rate; must stay below WACC for a finite terminal value
    pub terminal_growth_rate: Percent,
    /// Explicit forecast periods before the terminal year
    pub projection_years: u32,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
