//! Resume normalization.

use super::{pick, pick_list, GenericRow};
use crate::models::ResumeRow;

const ID_FIELDS: &[&str] = &["user_id", "id"];
const NAME_FIELDS: &[&str] = &["name", "candidate"];
const EDUCATION_FIELDS: &[&str] = &["education", "educational_details"];
const EXPERIENCE_FIELDS: &[&str] = &["experience_years"];
const SKILLS_FIELDS: &[&str] = &["skills"];
const PROJECTS_FIELDS: &[&str] = &["projects", "project"];
const TEXT_FIELDS: &[&str] = &["raw_resume_text", "summary"];
const SOURCE_FIELDS: &[&str] = &["source", "dataset"];

/// Normalizes raw resume rows. Skills are lowercased; listing-side chunk
/// tagging re-canonicalizes them against the catalog later.
pub fn normalize_resumes(rows: &[GenericRow]) -> Vec<ResumeRow> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| ResumeRow {
            user_id: pick(row, ID_FIELDS).unwrap_or_else(|| format!("resume-{index}")),
            name: pick(row, NAME_FIELDS).unwrap_or_else(|| "Unknown".to_string()),
            education: pick_list(row, EDUCATION_FIELDS),
            experience_years: pick(row, EXPERIENCE_FIELDS).and_then(|v| v.parse().ok()),
            skills: pick_list(row, SKILLS_FIELDS)
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect(),
            projects: pick(row, PROJECTS_FIELDS),
            raw_resume_text: pick(row, TEXT_FIELDS).unwrap_or_default(),
            source: pick(row, SOURCE_FIELDS).or_else(|| Some("unknown".to_string())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: serde_json::Value) -> Vec<GenericRow> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn test_resume_fields_resolved_and_lowercased() {
        let rows = rows(json!([{
            "id": "u1",
            "candidate": "Asha",
            "educational_details": "BSc CS; MSc AI",
            "experience_years": "2.5",
            "skills": "Python|SQL",
            "summary": "Built data dashboards."
        }]));
        let resumes = normalize_resumes(&rows);

        assert_eq!(resumes.len(), 1);
        let resume = &resumes[0];
        assert_eq!(resume.user_id, "u1");
        assert_eq!(resume.name, "Asha");
        assert_eq!(resume.education, vec!["BSc CS", "MSc AI"]);
        assert_eq!(resume.experience_years, Some(2.5));
        assert_eq!(resume.skills, vec!["python", "sql"]);
        assert_eq!(resume.raw_resume_text, "Built data dashboards.");
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let rows = rows(json!([{}]));
        let resumes = normalize_resumes(&rows);

        let resume = &resumes[0];
        assert_eq!(resume.user_id, "resume-0");
        assert_eq!(resume.name, "Unknown");
        assert!(resume.education.is_empty());
        assert_eq!(resume.experience_years, None);
        assert_eq!(resume.source.as_deref(), Some("unknown"));
    }
}
