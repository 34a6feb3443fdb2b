use serde_json::{Map, Value};
use std::io::{self, Write};

use super::{flatten_record, is_record_list};

/// Write output as CSV to stdout.
///
/// The result's figures come first as `field,value` pairs; each list of
/// records (schedule rows, legs, ranked scenarios) follows under a row
/// naming it, one record per line.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    write_csv(stdout.lock(), value);
}

fn write_csv<W: Write>(out: W, value: &Value) {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(out);

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => write_result(&mut wtr, map),
        Value::Array(arr) => write_records(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(result)]);
        }
    }

    let _ = wtr.flush();
}

fn write_result<W: Write>(wtr: &mut csv::Writer<W>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in flatten_record(map) {
        if is_record_list(val) {
            continue;
        }
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }

    for (key, val) in map {
        if let Value::Array(records) = val {
            if is_record_list(val) {
                let _ = wtr.write_record([key.as_str()]);
                write_records(wtr, records);
            }
        }
    }
}

fn write_records<W: Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
        return;
    };

    let headers: Vec<String> = flatten_record(first)
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    let _ = wtr.write_record(&headers);

    for item in arr {
        if let Value::Object(map) = item {
            let flat = flatten_record(map);
            let row: Vec<String> = headers
                .iter()
                .map(|h| {
                    flat.iter()
                        .find(|(name, _)| name == h)
                        .map(|(_, v)| format_csv_value(v))
                        .unwrap_or_default()
                })
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
