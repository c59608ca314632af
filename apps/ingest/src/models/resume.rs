use serde::{Deserialize, Serialize};

use super::json_cell;

/// A normalized candidate resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeRow {
    pub user_id: String,
    pub name: String,
    pub education: Vec<String>,
    pub experience_years: Option<f64>,
    pub skills: Vec<String>,
    pub projects: Option<String>,
    pub raw_resume_text: String,
    pub source: Option<String>,
}

impl ResumeRow {
    pub const CSV_HEADER: &'static [&'static str] = &[
        "user_id",
        "name",
        "education",
        "experience_years",
        "skills",
        "projects",
        "raw_resume_text",
        "source",
    ];

    pub fn csv_record(&self) -> Vec<String> {
        vec![
            self.user_id.clone(),
            self.name.clone(),
            json_cell(&self.education),
            self.experience_years
                .map(|v| v.to_string())
                .unwrap_or_default(),
            json_cell(&self.skills),
            self.projects.clone().unwrap_or_default(),
            self.raw_resume_text.clone(),
            self.source.clone().unwrap_or_default(),
        ]
    }
}
