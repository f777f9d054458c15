//! Turning raw spreadsheet payloads into a typed [`Table`].

use std::io::Read;

use serde_json::Value;
use tracing::debug;

use crate::error::{CleanerError, Result};
use crate::types::{is_integer_literal, Cell, Table};

/// Builds a table from a header row and string records.
///
/// Short records are padded with blank text, long ones truncated to the header width.
/// Values are numericised with [`Cell::parse`].
pub fn table_from_grid(headers: Vec<String>, records: Vec<Vec<String>>) -> Table {
    let width = headers.len();
    let rows = records
        .into_iter()
        .enumerate()
        .map(|(n, mut record)| {
            if record.len() != width {
                debug!("Record {} has {} fields, header has {}", n, record.len(), width);
                record.resize(width, String::new());
            }
            record.iter().map(|raw| Cell::parse(raw)).collect()
        })
        .collect();
    Table::new(headers, rows)
}

/// Reads CSV with a header row. An input with no header row yields an empty table.
pub fn read_csv<R: Read>(reader: R) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
    let mut records = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        records.push(record.iter().map(str::to_string).collect());
    }

    debug!("Read {} CSV records across {} columns", records.len(), headers.len());
    Ok(table_from_grid(headers, records))
}

fn json_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Missing,
        Value::Bool(true) => Cell::text("TRUE"),
        Value::Bool(false) => Cell::text("FALSE"),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Cell::Int(i),
            None => {
                let literal = n.to_string();
                if is_integer_literal(&literal) {
                    Cell::Text(literal)
                } else {
                    n.as_f64().map(Cell::Float).unwrap_or(Cell::Missing)
                }
            }
        },
        Value::String(s) => Cell::text(s.as_str()),
        other => Cell::text(other.to_string()),
    }
}

/// Reads a JSON array of record objects, the shape a sheet's "all records" export takes.
///
/// Header order follows the first record's keys; keys first seen later are appended.
pub fn read_json_records(payload: &str) -> Result<Table> {
    let value: Value = serde_json::from_str(payload)?;
    let Value::Array(items) = value else {
        return Err(CleanerError::SourceAccess(
            "expected a JSON array of record objects".to_string(),
        ));
    };

    let mut records = Vec::with_capacity(items.len());
    for (n, item) in items.iter().enumerate() {
        let Value::Object(fields) = item else {
            return Err(CleanerError::SourceAccess(format!(
                "record {} is not a JSON object",
                n
            )));
        };
        records.push(
            fields
                .iter()
                .map(|(key, value)| (key.clone(), json_cell(value)))
                .collect::<Vec<_>>(),
        );
    }

    Ok(Table::from_records(records))
}
