use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ValuationError;
use crate::types::{Assumptions, FinancialInputs, Money, Rate};
use crate::ValuationResult;

/// Fixed perpetuity growth default, in percent.
pub const DEFAULT_TERMINAL_GROWTH: Decimal = dec!(2.5);

/// Fixed explicit forecast horizon default.
pub const DEFAULT_PROJECTION_YEARS: u32 = 5;

/// One annual reporting period, as normalized by the data-provider layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnualFigures {
    pub fiscal_date: NaiveDate,
    pub revenue: Money,
    pub operating_income: Money,
    pub net_income: Money,
    /// Operating income as a fraction of revenue, when the provider reports it
    pub operating_income_ratio: Option<Rate>,
}

/// Raw per-symbol history consumed by the aggregation step. Statements are
/// ordered most recent first, matching the provider's annual-statement feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundamentalsHistory {
    pub statements: Vec<AnnualFigures>,
    pub latest_free_cash_flow: Money,
    pub total_debt: Money,
    pub cash_and_equivalents: Money,
    pub shares_outstanding: Decimal,
    pub current_price: Money,
    pub beta: Decimal,
}

/// Aggregated fundamentals for one symbol. All rates are decimal fractions
/// (0.10 = 10%); converting to the engine's percent units happens in
/// [`derive_default_assumptions`], and nowhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundamentalsBundle {
    pub latest_revenue: Money,
    pub avg_revenue_growth: Rate,
    pub avg_operating_margin: Rate,
    pub effective_tax_rate: Rate,
    pub latest_free_cash_flow: Money,
    pub total_debt: Money,
    pub cash_and_equivalents: Money,
    pub shares_outstanding: Decimal,
    pub current_price: Money,
    pub beta: Decimal,
}

/// Reduce a statement history to the aggregated bundle.
///
/// Averages tolerate short or partial history: fewer than two usable revenue
/// points falls back to 5% growth, zero usable margin periods falls back to
/// 20%, and the effective tax rate falls back to 21% when the latest period
/// has no positive operating income. The growth/margin/tax clamps live here —
/// once, at the aggregation boundary — so the engine never re-clamps.
pub fn summarize_fundamentals(
    history: &FundamentalsHistory,
) -> ValuationResult<FundamentalsBundle> {
    let latest = history.statements.first().ok_or_else(|| {
        ValuationError::InsufficientData("At least one annual statement is required".into())
    })?;

    // Year-over-year growth, oldest to newest, skipping periods where the
    // prior-year revenue is not positive.
    let mut growth_rates = Vec::new();
    let mut prior: Option<Money> = None;
    for figures in history.statements.iter().rev() {
        if let Some(prev) = prior {
            if prev > Decimal::ZERO {
                growth_rates.push((figures.revenue - prev) / prev);
            }
        }
        prior = Some(figures.revenue);
    }
    let avg_revenue_growth = average(&growth_rates).unwrap_or(dec!(0.05));

    let margins: Vec<Rate> = history
        .statements
        .iter()
        .filter_map(|f| f.operating_income_ratio)
        .collect();
    let avg_operating_margin = average(&margins).unwrap_or(dec!(0.2));

    let effective_tax_rate = if latest.operating_income > Decimal::ZERO {
        (Decimal::ONE - latest.net_income / latest.operating_income).max(Decimal::ZERO)
    } else {
        dec!(0.21)
    };

    Ok(FundamentalsBundle {
        latest_revenue: latest.revenue,
        avg_revenue_growth: avg_revenue_growth.clamp(dec!(-0.5), Decimal::ONE),
        avg_operating_margin: avg_operating_margin.clamp(Decimal::ZERO, Decimal::ONE),
        effective_tax_rate: effective_tax_rate.clamp(Decimal::ZERO, dec!(0.5)),
        latest_free_cash_flow: history.latest_free_cash_flow,
        total_debt: history.total_debt,
        cash_and_equivalents: history.cash_and_equivalents,
        shares_outstanding: history.shares_outstanding,
        current_price: history.current_price,
        beta: history.beta,
    })
}

/// Derive the pre-filled assumption set from an aggregated bundle.
///
/// The WACC estimate `max(6, 4 + beta × 5.5)` is a CAPM-flavored heuristic,
/// not a full cost-of-capital build-up; it exists to give the sliders a
/// sensible starting point. Rates are converted from fractions to percent and
/// rounded to one decimal place, matching what the sliders display.
pub fn derive_default_assumptions(bundle: &FundamentalsBundle) -> Assumptions {
    let hundred = dec!(100);
    Assumptions {
        revenue_growth_rate: (bundle.avg_revenue_growth * hundred).round_dp(1),
        operating_margin: (bundle.avg_operating_margin * hundred).round_dp(1),
        tax_rate: (bundle.effective_tax_rate * hundred).round_dp(1),
        wacc: (dec!(4) + bundle.beta * dec!(5.5)).max(dec!(6)).round_dp(1),
        terminal_growth_rate: DEFAULT_TERMINAL_GROWTH,
        projection_years: DEFAULT_PROJECTION_YEARS,
    }
}

/// Project the bundle onto the engine's read-only input struct.
pub fn financial_inputs(bundle: &FundamentalsBundle) -> FinancialInputs {
    FinancialInputs {
        latest_revenue: bundle.latest_revenue,
        total_debt: bundle.total_debt,
        cash_and_equivalents: bundle.cash_and_equivalents,
        shares_outstanding: bundle.shares_outstanding,
        current_price: bundle.current_price,
    }
}

fn average(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum: Decimal = values.iter().sum();
    Some(sum / Decimal::from(values.len()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn figures(year: i32, revenue: Decimal, operating_income: Decimal) -> AnnualFigures {
        AnnualFigures {
            fiscal_date: NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
            revenue,
            operating_income,
            net_income: operating_income * dec!(0.79),
            operating_income_ratio: if revenue > Decimal::ZERO {
                Some(operating_income / revenue)
            } else {
                None
            },
        }
    }

    fn sample_history() -> FundamentalsHistory {
        FundamentalsHistory {
            // Most recent first: 121 <- 110 <- 100, i.e. 10% growth per year
            statements: vec![
                figures(2025, dec!(121), dec!(30.25)),
                figures(2024, dec!(110), dec!(27.5)),
                figures(2023, dec!(100), dec!(25)),
            ],
            latest_free_cash_flow: dec!(18),
            total_debt: dec!(40),
            cash_and_equivalents: dec!(15),
            shares_outstanding: dec!(10),
            current_price: dec!(42),
            beta: dec!(1.2),
        }
    }

    #[test]
    fn test_average_growth_and_margin() {
        let bundle = summarize_fundamentals(&sample_history()).unwrap();

        assert_eq!(bundle.latest_revenue, dec!(121));
        assert_eq!(bundle.avg_revenue_growth, dec!(0.1));
        // Margin is 25% in every period
        assert_eq!(bundle.avg_operating_margin, dec!(0.25));
        // Tax = 1 - 0.79 = 0.21
        assert_eq!(bundle.effective_tax_rate, dec!(0.21));
    }

    #[test]
    fn test_short_history_falls_back_to_five_percent_growth() {
        let mut history = sample_history();
        history.statements.truncate(1);

        let bundle = summarize_fundamentals(&history).unwrap();
        assert_eq!(bundle.avg_revenue_growth, dec!(0.05));
    }

    #[test]
    fn test_non_positive_prior_revenue_is_skipped() {
        let mut history = sample_history();
        // Oldest period has zero revenue; its growth period must be dropped,
        // leaving only the 10% year.
        history.statements = vec![
            figures(2025, dec!(110), dec!(27.5)),
            figures(2024, dec!(100), dec!(25)),
            figures(2023, dec!(0), dec!(0)),
        ];

        let bundle = summarize_fundamentals(&history).unwrap();
        assert_eq!(bundle.avg_revenue_growth, dec!(0.1));
    }

    #[test]
    fn test_growth_clamped_to_bounds() {
        let mut history = sample_history();
        history.statements = vec![
            figures(2025, dec!(500), dec!(50)),
            figures(2024, dec!(100), dec!(10)),
        ];
        let bundle = summarize_fundamentals(&history).unwrap();
        assert_eq!(bundle.avg_revenue_growth, Decimal::ONE);

        history.statements = vec![
            figures(2025, dec!(10), dec!(1)),
            figures(2024, dec!(100), dec!(10)),
        ];
        let bundle = summarize_fundamentals(&history).unwrap();
        assert_eq!(bundle.avg_revenue_growth, dec!(-0.5));
    }

    #[test]
    fn test_missing_margins_fall_back() {
        let mut history = sample_history();
        for f in &mut history.statements {
            f.operating_income_ratio = None;
        }

        let bundle = summarize_fundamentals(&history).unwrap();
        assert_eq!(bundle.avg_operating_margin, dec!(0.2));
    }

    #[test]
    fn test_tax_fallback_without_positive_operating_income() {
        let mut history = sample_history();
        history.statements[0].operating_income = dec!(-5);

        let bundle = summarize_fundamentals(&history).unwrap();
        assert_eq!(bundle.effective_tax_rate, dec!(0.21));
    }

    #[test]
    fn test_tax_clamped_to_half() {
        let mut history = sample_history();
        // Net income far below operating income => implied rate above 50%
        history.statements[0].net_income = dec!(3);

        let bundle = summarize_fundamentals(&history).unwrap();
        assert_eq!(bundle.effective_tax_rate, dec!(0.5));
    }

    #[test]
    fn test_empty_history_rejected() {
        let mut history = sample_history();
        history.statements.clear();

        assert!(matches!(
            summarize_fundamentals(&history),
            Err(ValuationError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_derived_defaults() {
        let bundle = summarize_fundamentals(&sample_history()).unwrap();
        let assumptions = derive_default_assumptions(&bundle);

        assert_eq!(assumptions.revenue_growth_rate, dec!(10.0));
        assert_eq!(assumptions.operating_margin, dec!(25.0));
        assert_eq!(assumptions.tax_rate, dec!(21.0));
        // 4 + 1.2 * 5.5 = 10.6
        assert_eq!(assumptions.wacc, dec!(10.6));
        assert_eq!(assumptions.terminal_growth_rate, dec!(2.5));
        assert_eq!(assumptions.projection_years, 5);
    }

    #[test]
    fn test_wacc_heuristic_floor() {
        let mut bundle = summarize_fundamentals(&sample_history()).unwrap();
        bundle.beta = dec!(0.2);

        // 4 + 0.2 * 5.5 = 5.1, floored at 6
        let assumptions = derive_default_assumptions(&bundle);
        assert_eq!(assumptions.wacc, dec!(6));
    }

    #[test]
    fn test_financial_inputs_projection() {
        let bundle = summarize_fundamentals(&sample_history()).unwrap();
        let inputs = financial_inputs(&bundle);

        assert_eq!(inputs.latest_revenue, dec!(121));
        assert_eq!(inputs.total_debt, dec!(40));
        assert_eq!(inputs.cash_and_equivalents, dec!(15));
        assert_eq!(inputs.shares_outstanding, dec!(10));
        assert_eq!(inputs.current_price, dec!(42));
    }
}
