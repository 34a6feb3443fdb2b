use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{flatten_record, is_record_list};

/// Format output as tables: headline fields first, then one table per list
/// of records (schedule rows, sequence periods, ranked scenarios).
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_tables(result, map);
            } else {
                print_fields(map);
            }
        }
        Value::Array(arr) => print_records(arr),
        _ => println!("{}", value),
    }
}

fn print_result_tables(result: &Value, envelope: &Map<String, Value>) {
    if let Value::Object(res_map) = result {
        print_fields(res_map);

        for (key, val) in res_map {
            if let Value::Array(records) = val {
                if is_record_list(val) {
                    println!("\n{}:", key);
                    print_records(records);
                }
            }
        }
    } else {
        print_fields(envelope);
    }

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

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Field/value table of everything that is not a list of records.
fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut count = 0;
    for (key, val) in map {
        if is_record_list(val) {
            continue;
        }
        if let Value::Object(inner) = val {
            for (name, leaf) in flatten_record(inner) {
                builder.push_record([format!("{key}.{name}"), format_value(leaf)]);
                count += 1;
            }
        } else {
            builder.push_record([key.clone(), format_value(val)]);
            count += 1;
        }
    }
    if count > 0 {
        println!("{}", Table::from(builder));
    }
}

fn print_records(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = flatten_record(first)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        let mut builder = Builder::default();
        builder.push_record(headers.clone());

        for item in arr {
            if let Value::Object(map) = item {
                let flat = flatten_record(map);
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        flat.iter()
                            .find(|(name, _)| name == h)
                            .map(|(_, v)| format_value(v))
                            .unwrap_or_default()
                    })
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) if is_record_list(value) => format!("({} records)", arr.len()),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
