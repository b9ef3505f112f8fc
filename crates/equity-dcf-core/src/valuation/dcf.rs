use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ValuationError;
use crate::types::{with_metadata, Assumptions, ComputationOutput, FinancialInputs, Money, Percent};
use crate::ValuationResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Projection for a single forecast year. Years are 1-indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectedCashFlow {
    pub year: u32,
    pub free_cash_flow: Money,
    pub present_value: Money,
}

/// Output of a single-company DCF valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationOutput {
    /// Year-by-year projections, length = projection_years
    pub projected_cash_flows: Vec<ProjectedCashFlow>,
    /// Gordon growth terminal value (zero when clamped, see `calculate_valuation`)
    pub terminal_value: Money,
    pub pv_of_terminal: Money,
    /// Enterprise value = sum of PV(FCF) + PV(terminal)
    pub enterprise_value: Money,
    /// Equity value = EV - total_debt + cash. Not floored at zero; heavily
    /// levered firms legitimately come out negative.
    pub equity_value: Money,
    /// Zero when shares outstanding are unknown
    pub intrinsic_value_per_share: Money,
    /// Echoed back for the consumer
    pub current_price: Money,
    /// Zero when the current price is unknown
    pub upside_percent: Percent,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run a single-stage DCF valuation.
///
/// Free cash flow is approximated as NOPAT: projected revenue times operating
/// margin, after tax. CapEx, D&A add-back, and working-capital changes are
/// deliberately ignored; callers must not expect a capex-adjusted FCF.
///
/// Terminal value uses the Gordon growth formula on the last projected year's
/// FCF. When the terminal growth rate meets or exceeds WACC the terminal value
/// is clamped to zero (with a warning) rather than going negative or infinite,
/// so that any slider combination still yields a displayable result.
///
/// Assumptions that compound past `rust_decimal`'s representable range
/// (extreme growth over a long horizon) return [`ValuationError::Overflow`]
/// instead of panicking.
pub fn calculate_valuation(
    inputs: &FinancialInputs,
    assumptions: &Assumptions,
) -> ValuationResult<ComputationOutput<ValuationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate(inputs, assumptions)?;

    let hundred = dec!(100);
    let growth_factor = Decimal::ONE + assumptions.revenue_growth_rate / hundred;
    let margin = assumptions.operating_margin / hundred;
    let after_tax = Decimal::ONE - assumptions.tax_rate / hundred;
    let discount_base = Decimal::ONE + assumptions.wacc / hundred;

    // --- Project cash flows ---
    let n_years = assumptions.projection_years;
    let mut projected_cash_flows = Vec::with_capacity(n_years as usize);
    let mut sum_of_pvs = Decimal::ZERO;

    for year in 1..=n_years {
        let projected_revenue = growth_factor
            .checked_powi(year as i64)
            .and_then(|compounded| inputs.latest_revenue.checked_mul(compounded))
            .ok_or_else(|| overflow("projected revenue"))?;
        let operating_income = projected_revenue
            .checked_mul(margin)
            .ok_or_else(|| overflow("operating income"))?;
        let free_cash_flow = operating_income
            .checked_mul(after_tax)
            .ok_or_else(|| overflow("free cash flow"))?;
        let present_value = discount_base
            .checked_powi(year as i64)
            .and_then(|factor| free_cash_flow.checked_div(factor))
            .ok_or_else(|| overflow("present value"))?;

        sum_of_pvs = sum_of_pvs
            .checked_add(present_value)
            .ok_or_else(|| overflow("sum of present values"))?;
        projected_cash_flows.push(ProjectedCashFlow {
            year,
            free_cash_flow,
            present_value,
        });
    }

    // --- Terminal value (Gordon growth on the last projected year's FCF) ---
    let last_fcf = projected_cash_flows
        .last()
        .map(|p| p.free_cash_flow)
        .unwrap_or(Decimal::ZERO); // unreachable: projection_years >= 1 validated

    let wacc_frac = assumptions.wacc / hundred;
    let growth_frac = assumptions.terminal_growth_rate / hundred;
    let terminal_value = if wacc_frac > growth_frac {
        last_fcf
            .checked_mul(Decimal::ONE + growth_frac)
            .and_then(|v| v.checked_div(wacc_frac - growth_frac))
            .ok_or_else(|| overflow("terminal value"))?
    } else {
        warnings.push(format!(
            "Terminal growth rate ({}%) meets or exceeds WACC ({}%); terminal value clamped to zero",
            assumptions.terminal_growth_rate, assumptions.wacc
        ));
        Decimal::ZERO
    };

    let pv_of_terminal = if terminal_value.is_zero() {
        Decimal::ZERO
    } else {
        discount_base
            .checked_powi(n_years as i64)
            .and_then(|factor| terminal_value.checked_div(factor))
            .ok_or_else(|| overflow("terminal present value"))?
    };

    // --- Enterprise value and equity bridge ---
    let enterprise_value = sum_of_pvs
        .checked_add(pv_of_terminal)
        .ok_or_else(|| overflow("enterprise value"))?;
    let equity_value = enterprise_value
        .checked_sub(inputs.total_debt)
        .and_then(|v| v.checked_add(inputs.cash_and_equivalents))
        .ok_or_else(|| overflow("equity value"))?;

    let intrinsic_value_per_share = if inputs.shares_outstanding > Decimal::ZERO {
        equity_value
            .checked_div(inputs.shares_outstanding)
            .ok_or_else(|| overflow("intrinsic value per share"))?
    } else {
        Decimal::ZERO
    };

    let upside_percent = if inputs.current_price > Decimal::ZERO {
        intrinsic_value_per_share
            .checked_sub(inputs.current_price)
            .and_then(|v| v.checked_div(inputs.current_price))
            .and_then(|v| v.checked_mul(hundred))
            .ok_or_else(|| overflow("upside percent"))?
    } else {
        Decimal::ZERO
    };

    // --- Terminal value share warning ---
    if enterprise_value > Decimal::ZERO {
        let tv_pct = pv_of_terminal / enterprise_value;
        if tv_pct > dec!(0.75) {
            warnings.push(format!(
                "Terminal value represents {:.1}% of enterprise value; consider extending the explicit forecast period",
                tv_pct * hundred
            ));
        }
    }

    let output = ValuationOutput {
        projected_cash_flows,
        terminal_value,
        pv_of_terminal,
        enterprise_value,
        equity_value,
        intrinsic_value_per_share,
        current_price: inputs.current_price,
        upside_percent,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Single-stage NOPAT DCF (Gordon growth terminal)",
        &serde_json::json!({ "inputs": inputs, "assumptions": assumptions }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn overflow(context: &str) -> ValuationError {
    ValuationError::Overflow {
        context: context.into(),
    }
}

fn validate(inputs: &FinancialInputs, assumptions: &Assumptions) -> ValuationResult<()> {
    if assumptions.projection_years < 1 {
        return Err(ValuationError::InvalidInput {
            field: "projection_years".into(),
            reason: "At least one explicit projection year is required".into(),
        });
    }

    // A WACC at or below -100% makes the discount factor zero or flips its
    // sign every period; reject it instead of dividing by zero.
    if assumptions.wacc <= dec!(-100) {
        return Err(ValuationError::InvalidInput {
            field: "wacc".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let non_negative = [
        ("latest_revenue", inputs.latest_revenue),
        ("total_debt", inputs.total_debt),
        ("cash_and_equivalents", inputs.cash_and_equivalents),
        ("shares_outstanding", inputs.shares_outstanding),
        ("current_price", inputs.current_price),
    ];
    for (field, value) in non_negative {
        if value < Decimal::ZERO {
            return Err(ValuationError::InvalidInput {
                field: field.into(),
                reason: "Must be zero or positive".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
