//! Run counters persisted between pipeline stages, and the final report.
//!
//! Parse ambiguity and match misses are data-quality metrics, not errors;
//! they land in these counters and surface in `reports/report.json`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::ListingRow;

const STATE_FILE: &str = "state.json";
const REPORT_FILE: &str = "report.json";
/// Sample rows/mappings kept per category in the report.
const SAMPLE_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub rows_read: u64,
    pub rows_ingested: u64,
    pub duplicates: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailures {
    pub locations: u64,
    pub stipend: u64,
    pub posted_date: u64,
}

/// Everything the `clean` stage learns that `report` needs later.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestState {
    pub datasets: BTreeMap<String, DatasetStats>,
    pub parse_failures: ParseFailures,
    /// Listings dropped by cross-dataset dedup.
    pub listing_duplicates: u64,
    pub skill_mappings: Vec<String>,
    pub location_samples: Vec<String>,
    pub sample_listings: Vec<ListingRow>,
}

impl IngestState {
    pub fn load(reports_dir: &Path) -> Result<Self, AppError> {
        let path = reports_dir.join(STATE_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, reports_dir: &Path) -> Result<(), AppError> {
        fs::create_dir_all(reports_dir)?;
        let path = reports_dir.join(STATE_FILE);
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// The human-readable run summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub datasets: BTreeMap<String, DatasetStats>,
    pub parse_failures: ParseFailures,
    pub listing_duplicates: u64,
    pub skill_mappings: Vec<String>,
    pub location_samples: Vec<String>,
    pub sample_listings: Vec<ListingRow>,
}

/// Builds the report from accumulated state and writes it under the
/// reports directory. Returns the path written.
pub fn write_report(reports_dir: &Path, state: &IngestState) -> Result<PathBuf, AppError> {
    let report = ReportData {
        run_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        datasets: state.datasets.clone(),
        parse_failures: state.parse_failures,
        listing_duplicates: state.listing_duplicates,
        skill_mappings: truncated(&state.skill_mappings),
        location_samples: truncated(&state.location_samples),
        sample_listings: state
            .sample_listings
            .iter()
            .take(SAMPLE_LIMIT)
            .cloned()
            .collect(),
    };

    fs::create_dir_all(reports_dir)?;
    let path = reports_dir.join(REPORT_FILE);
    fs::write(&path, serde_json::to_string_pretty(&report)?)?;
    Ok(path)
}

fn truncated(values: &[String]) -> Vec<String> {
    values.iter().take(SAMPLE_LIMIT).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = IngestState::default();
        state.parse_failures.stipend = 3;
        state
            .datasets
            .insert("internshala".into(), DatasetStats {
                rows_read: 100,
                rows_ingested: 90,
                duplicates: 10,
            });
        state.save(dir.path()).unwrap();

        let loaded = IngestState::load(dir.path()).unwrap();
        assert_eq!(loaded.parse_failures.stipend, 3);
        assert_eq!(loaded.datasets["internshala"].duplicates, 10);
    }

    #[test]
    fn test_missing_state_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let state = IngestState::load(dir.path()).unwrap();
        assert!(state.datasets.is_empty());
    }

    #[test]
    fn test_report_truncates_samples() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = IngestState::default();
        state.skill_mappings = (0..40).map(|i| format!("s{i} -> Skill")).collect();
        let path = write_report(dir.path(), &state).unwrap();

        let report: ReportData =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(report.skill_mappings.len(), 20);
    }
}
