use serde_json::Value;
use std::io;

use super::format_scalar;

/// Write output as CSV to stdout. Sensitivity grids become one row per cell;
/// everything else becomes field,value rows.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(Value::Array(cells)) = result.get("cells") {
        let _ = wtr.write_record(["wacc", "terminal_growth", "intrinsic_value"]);
        for cell in cells {
            let _ = wtr.write_record([
                csv_value(cell.get("wacc")),
                csv_value(cell.get("terminal_growth")),
                csv_value(cell.get("intrinsic_value")),
            ]);
        }
    } else if let Value::Object(map) = result {
        let _ = wtr.write_record(["field", "value"]);
        for (key, val) in map {
            if let Value::Array(flows) = val {
                for flow in flows {
                    if let Value::Object(fields) = flow {
                        for (k, v) in fields {
                            let _ = wtr.write_record([&format!("{}.{}", key, k), &csv_value(Some(v))]);
                        }
                    }
                }
            } else {
                let _ = wtr.write_record([key.as_str(), &csv_value(Some(val))]);
            }
        }
    } else {
        let _ = wtr.write_record([csv_value(Some(result))]);
    }

    let _ = wtr.flush();
}

fn csv_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(v) => format_scalar(v, usize::MAX),
    }
}
