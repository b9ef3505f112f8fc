use serde_json::Value;

use super::format_scalar;

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = [
        "intrinsic_value_per_share",
        "upside_percent",
        "enterprise_value",
        "equity_value",
        "wacc",
    ];

    if let Value::Object(map) = result {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_scalar(val, 4));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_scalar(val, 4));
            return;
        }
    }

    println!("{}", format_scalar(result, 4));
}
