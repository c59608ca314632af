//! Row normalizers for the heterogeneous upstream datasets.
//!
//! Upstream rows are duck-typed string-keyed mappings whose field names
//! vary per dataset. Each logical attribute is resolved against an ordered
//! candidate-key list (held as `const` data in the per-table modules),
//! first non-empty value wins.

pub mod companies;
pub mod listings;
pub mod resumes;
pub mod skills;

use serde_json::Value;

/// A raw row as produced by the loaders: column name to value.
pub type GenericRow = serde_json::Map<String, Value>;

/// Resolves one scalar attribute: the first candidate key holding a
/// non-empty string (or a number) wins.
pub fn pick(row: &GenericRow, candidates: &[&str]) -> Option<String> {
    for key in candidates {
        match row.get(*key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// Resolves one list attribute. Accepts a JSON array value, a string
/// containing a JSON array, or a `,`/`;`/`|` delimited string.
pub fn pick_list(row: &GenericRow, candidates: &[&str]) -> Vec<String> {
    for key in candidates {
        match row.get(*key) {
            Some(Value::Array(items)) if !items.is_empty() => {
                return items.iter().filter_map(value_to_string).collect();
            }
            Some(Value::String(s)) if !s.trim().is_empty() => return parse_list(s),
            _ => {}
        }
    }
    Vec::new()
}

/// Parses a cell that should hold a list.
pub fn parse_list(value: &str) -> Vec<String> {
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(value) {
        return items.iter().filter_map(value_to_string).collect();
    }
    value
        .split([',', ';', '|'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
