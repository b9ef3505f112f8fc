use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ValuationError;
use crate::types::{with_metadata, Assumptions, ComputationOutput, FinancialInputs, Money, Percent};
use crate::ValuationResult;

use super::dcf::calculate_valuation;

/// Default WACC perturbations, in percentage points.
pub const DEFAULT_WACC_OFFSETS: [Percent; 5] =
    [dec!(-2), dec!(-1), dec!(0), dec!(1), dec!(2)];

/// Default terminal-growth perturbations, in percentage points.
pub const DEFAULT_GROWTH_OFFSETS: [Percent; 5] =
    [dec!(-1), dec!(-0.5), dec!(0), dec!(0.5), dec!(1)];

/// One cell of the sensitivity surface. `intrinsic_value` is `None` when the
/// cell is divergent (WACC at or below terminal growth, or WACC at or below
/// zero); consumers must render such cells as not-applicable, never as a
/// numeric value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityCell {
    pub wacc: Percent,
    pub terminal_growth: Percent,
    pub intrinsic_value: Option<Money>,
}

/// Dense rectangular grid of intrinsic-value outcomes. Cells are row-major:
/// all growth values for the first WACC value, then the next WACC value, and
/// so on. Always exactly `wacc_values.len() * growth_values.len()` cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityGrid {
    pub wacc_values: Vec<Percent>,
    pub growth_values: Vec<Percent>,
    pub cells: Vec<SensitivityCell>,
}

/// Build the WACC × terminal-growth sensitivity surface around a base
/// assumption set, re-running the DCF engine per cell.
///
/// Offsets default to [`DEFAULT_WACC_OFFSETS`] / [`DEFAULT_GROWTH_OFFSETS`]
/// (a 5×5 grid). Divergent cells are expected, not errors: they stay in the
/// grid with an empty value so the surface is never ragged.
pub fn build_sensitivity_grid(
    inputs: &FinancialInputs,
    base_assumptions: &Assumptions,
    wacc_offsets: Option<&[Percent]>,
    growth_offsets: Option<&[Percent]>,
) -> ValuationResult<ComputationOutput<SensitivityGrid>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let wacc_offsets = resolve_offsets(wacc_offsets, &DEFAULT_WACC_OFFSETS, "wacc_offsets")?;
    let growth_offsets =
        resolve_offsets(growth_offsets, &DEFAULT_GROWTH_OFFSETS, "growth_offsets")?;

    let wacc_values: Vec<Percent> = wacc_offsets
        .iter()
        .map(|o| base_assumptions.wacc + o)
        .collect();
    let growth_values: Vec<Percent> = growth_offsets
        .iter()
        .map(|o| base_assumptions.terminal_growth_rate + o)
        .collect();

    let mut cells = Vec::with_capacity(wacc_values.len() * growth_values.len());
    let mut divergent = 0usize;

    for &wacc in &wacc_values {
        for &terminal_growth in &growth_values {
            if wacc <= terminal_growth || wacc <= Decimal::ZERO {
                divergent += 1;
                cells.push(SensitivityCell {
                    wacc,
                    terminal_growth,
                    intrinsic_value: None,
                });
                continue;
            }

            let perturbed = Assumptions {
                wacc,
                terminal_growth_rate: terminal_growth,
                ..base_assumptions.clone()
            };
            let valuation = calculate_valuation(inputs, &perturbed)?;
            cells.push(SensitivityCell {
                wacc,
                terminal_growth,
                intrinsic_value: Some(valuation.result.intrinsic_value_per_share),
            });
        }
    }

    if divergent > 0 {
        warnings.push(format!(
            "{divergent} of {} cells are divergent (WACC at or below terminal growth, or at or below zero)",
            cells.len()
        ));
    }

    let output = SensitivityGrid {
        wacc_values,
        growth_values,
        cells,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "WACC × terminal growth sensitivity grid",
        &serde_json::json!({
            "base_assumptions": base_assumptions,
            "wacc_offsets": wacc_offsets,
            "growth_offsets": growth_offsets,
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn resolve_offsets(
    overrides: Option<&[Percent]>,
    defaults: &[Percent],
    field: &str,
) -> ValuationResult<Vec<Percent>> {
    let offsets = overrides.unwrap_or(defaults);
    if offsets.is_empty() {
        return Err(ValuationError::InvalidInput {
            field: field.into(),
            reason: "Offset list must not be empty".into(),
        });
    }
    Ok(offsets.to_vec())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    fn sample_inputs() -> FinancialInputs {
        FinancialInputs {
            latest_revenue: dec!(1000),
            total_debt: dec!(200),
            cash_and_equivalents: dec!(100),
            shares_outstanding: dec!(100),
            current_price: dec!(50),
        }
    }

    fn base_assumptions() -> Assumptions {
        Assumptions {
            revenue_growth_rate: dec!(5),
            operating_margin: dec!(20),
            tax_rate: dec!(21),
            wacc: dec!(10),
            terminal_growth_rate: dec!(2.5),
            projection_years: 5,
        }
    }

    #[test]
    fn test_default_grid_is_5x5() {
        let result =
            build_sensitivity_grid(&sample_inputs(), &base_assumptions(), None, None).unwrap();
        let grid = &result.result;

        assert_eq!(grid.wacc_values.len(), 5);
        assert_eq!(grid.growth_values.len(), 5);
        assert_eq!(grid.cells.len(), 25);
        assert_eq!(grid.wacc_values, vec![dec!(8), dec!(9), dec!(10), dec!(11), dec!(12)]);
        assert_eq!(
            grid.growth_values,
            vec![dec!(1.5), dec!(2), dec!(2.5), dec!(3), dec!(3.5)]
        );
    }

    #[test]
    fn test_grid_keys_are_unique() {
        let result =
            build_sensitivity_grid(&sample_inputs(), &base_assumptions(), None, None).unwrap();

        let keys: HashSet<(String, String)> = result
            .result
            .cells
            .iter()
            .map(|c| {
                (
                    c.wacc.normalize().to_string(),
                    c.terminal_growth.normalize().to_string(),
                )
            })
            .collect();
        assert_eq!(keys.len(), 25);
    }

    #[test]
    fn test_custom_offsets_stay_rectangular() {
        let result = build_sensitivity_grid(
            &sample_inputs(),
            &base_assumptions(),
            Some(&[dec!(-1), dec!(1)]),
            Some(&[dec!(-0.5), dec!(0), dec!(0.5)]),
        )
        .unwrap();

        assert_eq!(result.result.cells.len(), 6);
    }

    #[test]
    fn test_divergent_cells_carry_no_value() {
        // Base WACC of 3% with a -2 offset lands at 1%, below the 1.5%
        // terminal growth of the first growth column.
        let mut base = base_assumptions();
        base.wacc = dec!(3);

        let result = build_sensitivity_grid(&sample_inputs(), &base, None, None).unwrap();
        let grid = &result.result;

        let divergent: Vec<&SensitivityCell> = grid
            .cells
            .iter()
            .filter(|c| c.intrinsic_value.is_none())
            .collect();
        assert!(!divergent.is_empty());
        for cell in &divergent {
            assert!(cell.wacc <= cell.terminal_growth || cell.wacc <= Decimal::ZERO);
        }
        // Grid stays fully populated even with invalid cells
        assert_eq!(grid.cells.len(), 25);
        assert!(result.warnings.iter().any(|w| w.contains("divergent")));
    }

    #[test]
    fn test_wacc_at_or_below_zero_is_divergent() {
        let mut base = base_assumptions();
        base.wacc = dec!(1);
        base.terminal_growth_rate = dec!(-5);

        let result = build_sensitivity_grid(&sample_inputs(), &base, None, None).unwrap();
        for cell in &result.result.cells {
            if cell.wacc <= Decimal::ZERO {
                assert!(cell.intrinsic_value.is_none());
            }
        }
    }

    #[test]
    fn test_base_cell_matches_direct_valuation() {
        let inputs = sample_inputs();
        let base = base_assumptions();

        let grid = build_sensitivity_grid(&inputs, &base, None, None).unwrap();
        let direct = calculate_valuation(&inputs, &base).unwrap();

        let centre = grid
            .result
            .cells
            .iter()
            .find(|c| c.wacc == base.wacc && c.terminal_growth == base.terminal_growth_rate)
            .expect("base cell missing from grid");
        assert_eq!(
            centre.intrinsic_value,
            Some(direct.result.intrinsic_value_per_share)
        );
    }

    #[test]
    fn test_values_fall_as_wacc_rises() {
        let result =
            build_sensitivity_grid(&sample_inputs(), &base_assumptions(), None, None).unwrap();
        let grid = &result.result;
        let cols = grid.growth_values.len();

        // Fixed growth column, walk down the WACC rows
        for col in 0..cols {
            let column: Vec<Decimal> = grid
                .cells
                .iter()
                .skip(col)
                .step_by(cols)
                .filter_map(|c| c.intrinsic_value)
                .collect();
            for pair in column.windows(2) {
                assert!(pair[0] > pair[1]);
            }
        }
    }

    #[test]
    fn test_empty_offsets_rejected() {
        let result = build_sensitivity_grid(
            &sample_inputs(),
            &base_assumptions(),
            Some(&[]),
            None,
        );
        assert!(matches!(
            result,
            Err(ValuationError::InvalidInput { ref field, .. }) if field == "wacc_offsets"
        ));
    }
}
