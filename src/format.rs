use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::HashSet;

use crate::error::LitefetchError;
use crate::session::TableMetadata;
use crate::shaper::{CellValue, QueryResult};

/// Convert a cell to JSON for encoding. Blobs become base64 text.
pub fn cell_to_json(value: &CellValue) -> serde_json::Value {
    match value {
        CellValue::Integer(i) => serde_json::Value::from(*i),
        CellValue::Real(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        CellValue::Text(s) => serde_json::Value::String(s.clone()),
        CellValue::Blob(bytes) => serde_json::Value::String(STANDARD.encode(bytes)),
        CellValue::Null => serde_json::Value::Null,
    }
}

/// Convert a QueryResult to a TOON-formatted string.
///
/// Repeated column names (`SELECT *` over a join) get a numeric suffix so
/// every cell keeps its own field: `id, name, id` becomes `id, name, id_2`.
pub fn to_toon(result: &QueryResult) -> Result<String, LitefetchError> {
    let fields = unique_field_names(&result.columns);

    // toon_format can't infer columns from an empty array, so the
    // header of a zero-row result is written by hand.
    if result.rows.is_empty() && !fields.is_empty() {
        let header: Vec<String> = fields.iter().map(|f| quote_field(f)).collect();
        return Ok(format!("[0]{{{}}}:\n", header.join(",")));
    }

    let array: Vec<serde_json::Value> = result
        .rows
        .iter()
        .map(|row| {
            let mut map = serde_json::Map::new();
            for (i, field) in fields.iter().enumerate() {
                let value = row.get(i).unwrap_or(&CellValue::Null);
                map.insert(field.clone(), cell_to_json(value));
            }
            serde_json::Value::Object(map)
        })
        .collect();

    encode(&serde_json::Value::Array(array))
}

/// Field names for TOON output, one per column and all distinct.
///
/// The first occurrence keeps its name. Later repeats take the lowest
/// `_<n>` suffix (from 2) that no other column already uses.
pub fn unique_field_names(columns: &[String]) -> Vec<String> {
    let taken: HashSet<&str> = columns.iter().map(String::as_str).collect();
    let mut fields: Vec<String> = Vec::with_capacity(columns.len());

    for column in columns {
        if !fields.iter().any(|f| f == column) {
            fields.push(column.clone());
            continue;
        }
        let renamed = (2..)
            .map(|n| format!("{column}_{n}"))
            .find(|candidate| {
                !taken.contains(candidate.as_str()) && !fields.iter().any(|f| f == candidate)
            })
            .unwrap_or_else(|| column.clone());
        fields.push(renamed);
    }
    fields
}

/// Write a field name the way TOON headers need it: bare when it is a
/// plain identifier, otherwise double-quoted with `\\` and `\"` escaped.
fn quote_field(name: &str) -> String {
    let mut chars = name.chars();
    let bare = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if bare {
        return name.to_string();
    }

    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('"');
    for c in name.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

/// Convert the table catalog to TOON, one entry per table.
pub fn schema_to_toon(tables: &[TableMetadata]) -> Result<String, LitefetchError> {
    let value = serde_json::to_value(tables).map_err(|e| LitefetchError::Format {
        message: e.to_string(),
    })?;
    encode(&value)
}

fn encode(value: &serde_json::Value) -> Result<String, LitefetchError> {
    toon_format::encode_default(value).map_err(|e| LitefetchError::Format {
        message: e.to_string(),
    })
}
