use serde::{Deserialize, Serialize};

use super::json_cell;

/// A normalized internship/job listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRow {
    pub listing_id: String,
    pub title: String,
    pub company_id: Option<String>,
    pub company_name: String,
    pub location_city: Option<String>,
    pub location_state: Option<String>,
    pub location_country: Option<String>,
    pub skills: Vec<String>,
    pub stipend_min_inr: Option<i64>,
    pub stipend_max_inr: Option<i64>,
    pub duration_weeks: Option<i64>,
    pub mode: Option<String>,
    pub category: Option<String>,
    pub description: String,
    pub application_url: Option<String>,
    pub posted_date: Option<String>,
    pub source: Option<String>,
}

impl ListingRow {
    pub const CSV_HEADER: &'static [&'static str] = &[
        "listing_id",
        "title",
        "company_id",
        "company_name",
        "location_city",
        "location_state",
        "location_country",
        "skills",
        "stipend_min_inr",
        "stipend_max_inr",
        "duration_weeks",
        "mode",
        "category",
        "description",
        "application_url",
        "posted_date",
        "source",
    ];

    pub fn csv_record(&self) -> Vec<String> {
        vec![
            self.listing_id.clone(),
            self.title.clone(),
            self.company_id.clone().unwrap_or_default(),
            self.company_name.clone(),
            self.location_city.clone().unwrap_or_default(),
            self.location_state.clone().unwrap_or_default(),
            self.location_country.clone().unwrap_or_default(),
            json_cell(&self.skills),
            self.stipend_min_inr.map(|v| v.to_string()).unwrap_or_default(),
            self.stipend_max_inr.map(|v| v.to_string()).unwrap_or_default(),
            self.duration_weeks.map(|v| v.to_string()).unwrap_or_default(),
            self.mode.clone().unwrap_or_default(),
            self.category.clone().unwrap_or_default(),
            self.description.clone(),
            self.application_url.clone().unwrap_or_default(),
            self.posted_date.clone().unwrap_or_default(),
            self.source.clone().unwrap_or_default(),
        ]
    }
}
