//! Structured file loading: every CSV and JSON file in a dataset
//! directory becomes generic string-keyed rows for the normalizers.
//! A file that fails to parse is logged and skipped, never fatal.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{error, warn};

use crate::errors::AppError;
use crate::normalize::GenericRow;

pub fn load_structured_files(dir: &Path) -> Vec<GenericRow> {
    let mut rows = Vec::new();
    if !dir.is_dir() {
        warn!("Directory {} missing", dir.display());
        return rows;
    }

    let mut paths: Vec<_> = match fs::read_dir(dir) {
        Ok(entries) => entries.flatten().map(|entry| entry.path()).collect(),
        Err(e) => {
            error!("Failed listing {}: {e}", dir.display());
            return rows;
        }
    };
    paths.sort();

    for path in paths {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("csv") => match load_csv(&path) {
                Ok(mut file_rows) => rows.append(&mut file_rows),
                Err(e) => error!("Failed reading CSV {}: {e}", path.display()),
            },
            Some("json") => match load_json(&path) {
                Ok(mut file_rows) => rows.append(&mut file_rows),
                Err(e) => error!("Failed reading JSON {}: {e}", path.display()),
            },
            _ => {}
        }
    }
    rows
}

fn load_csv(path: &Path) -> Result<Vec<GenericRow>, AppError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = GenericRow::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            row.insert(header.to_string(), Value::String(field.to_string()));
        }
        rows.push(row);
    }
    Ok(rows)
}

fn load_json(path: &Path) -> Result<Vec<GenericRow>, AppError> {
    let text = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_loads_csv_and_json_rows() {
        let dir = tempfile::tempdir().unwrap();

        let mut csv_file = std::fs::File::create(dir.path().join("a.csv")).unwrap();
        writeln!(csv_file, "title,company").unwrap();
        writeln!(csv_file, "Backend Intern,Acme").unwrap();

        std::fs::write(
            dir.path().join("b.json"),
            r#"[{"title": "Data Intern", "company": "Beta"}]"#,
        )
        .unwrap();

        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let rows = load_structured_files(dir.path());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["title"], "Backend Intern");
        assert_eq!(rows[1]["company"], "Beta");
    }

    #[test]
    fn test_missing_directory_yields_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        let rows = load_structured_files(&dir.path().join("nope"));
        assert!(rows.is_empty());
    }

    #[test]
    fn test_malformed_json_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("good.json"), r#"[{"k": "v"}]"#).unwrap();

        let rows = load_structured_files(dir.path());
        assert_eq!(rows.len(), 1);
    }
}
