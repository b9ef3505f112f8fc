use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::format_scalar;

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    let Some(envelope) = value.as_object() else {
        println!("{}", value);
        return;
    };

    match envelope.get("result") {
        Some(result) if is_sensitivity_grid(result) => print_grid(result),
        Some(result) if is_valuation(result) => print_valuation(result),
        Some(Value::Object(map)) => print_field_value(map),
        _ => print_top_level(envelope),
    }

    print_footer(envelope);
}

fn is_sensitivity_grid(result: &Value) -> bool {
    result.get("cells").is_some() && result.get("wacc_values").is_some()
}

fn is_valuation(result: &Value) -> bool {
    result.get("projected_cash_flows").is_some()
}

/// Render the grid as a WACC-by-growth matrix. Divergent cells print "n/a".
fn print_grid(result: &Value) {
    let wacc_values = result["wacc_values"].as_array().cloned().unwrap_or_default();
    let growth_values = result["growth_values"].as_array().cloned().unwrap_or_default();
    let cells = result["cells"].as_array().cloned().unwrap_or_default();

    let mut builder = Builder::default();
    let mut header = vec!["WACC \\ g".to_string()];
    header.extend(growth_values.iter().map(|g| format_scalar(g, 1)));
    builder.push_record(header);

    // Cells are row-major: one row per WACC value
    for (i, wacc) in wacc_values.iter().enumerate() {
        let mut row = vec![format_scalar(wacc, 1)];
        for j in 0..growth_values.len() {
            let cell = cells
                .get(i * growth_values.len() + j)
                .and_then(|c| c.get("intrinsic_value"))
                .unwrap_or(&Value::Null);
            row.push(format_scalar(cell, 2));
        }
        builder.push_record(row);
    }

    println!("{}", Table::from(builder));
}

/// Render the valuation summary, then the year-by-year projection.
fn print_valuation(result: &Value) {
    if let Value::Object(map) = result {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            if key == "projected_cash_flows" {
                continue;
            }
            builder.push_record([key.as_str(), &format_scalar(val, 2)]);
        }
        println!("{}", Table::from(builder));
    }

    if let Some(Value::Array(flows)) = result.get("projected_cash_flows") {
        let mut builder = Builder::default();
        builder.push_record(["Year", "FCF", "PV"]);
        for flow in flows {
            builder.push_record([
                format_scalar(flow.get("year").unwrap_or(&Value::Null), 0),
                format_scalar(flow.get("free_cash_flow").unwrap_or(&Value::Null), 2),
                format_scalar(flow.get("present_value").unwrap_or(&Value::Null), 2),
            ]);
        }
        println!("\nProjections:\n{}", Table::from(builder));
    }
}

fn print_field_value(map: &serde_json::Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_scalar(val, 2)]);
    }
    println!("{}", Table::from(builder));
}

/// Composite outputs (e.g. the assumptions command) have no "result" key;
/// print each top-level object as its own section.
fn print_top_level(envelope: &serde_json::Map<String, Value>) {
    for (section, val) in envelope {
        if let Value::Object(map) = val {
            println!("{}:", section);
            print_field_value(map);
        }
    }
}

fn print_footer(envelope: &serde_json::Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(methodology)) = envelope.get("methodology") {
        println!("\nMethodology: {}", methodology);
    }
}
