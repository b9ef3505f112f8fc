pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Render a JSON scalar for human-facing output. Decimals arrive as strings
/// (serde-with-str); trim them to at most `dp` fractional digits.
pub fn format_scalar(value: &Value, dp: usize) -> String {
    match value {
        Value::String(s) => trim_decimal(s, dp),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "n/a".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

fn trim_decimal(s: &str, dp: usize) -> String {
    match s.split_once('.') {
        Some((int, frac)) if frac.len() > dp => {
            if dp == 0 {
                int.to_string()
            } else {
                format!("{}.{}", int, &frac[..dp])
            }
        }
        _ => s.to_string(),
    }
}
