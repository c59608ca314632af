//! Normalized row types shared by the normalizers, the CSV/JSON writers,
//! and the SQLite loaders.

pub mod company;
pub mod listing;
pub mod resume;

pub use company::CompanyRow;
pub use listing::ListingRow;
pub use resume::ResumeRow;

/// JSON-encodes a list for a single tabular cell.
pub(crate) fn json_cell(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}
