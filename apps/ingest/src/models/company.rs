use serde::{Deserialize, Serialize};

/// A normalized employer profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRow {
    pub company_id: String,
    pub company_name: String,
    pub industry: Option<String>,
    pub headquarters_city: Option<String>,
    pub headquarters_country: Option<String>,
    pub company_url: Option<String>,
    pub size_bucket: Option<String>,
    pub source: Option<String>,
}

impl CompanyRow {
    pub const CSV_HEADER: &'static [&'static str] = &[
        "company_id",
        "company_name",
        "industry",
        "headquarters_city",
        "headquarters_country",
        "company_url",
        "size_bucket",
        "source",
    ];

    pub fn csv_record(&self) -> Vec<String> {
        vec![
            self.company_id.clone(),
            self.company_name.clone(),
            self.industry.clone().unwrap_or_default(),
            self.headquarters_city.clone().unwrap_or_default(),
            self.headquarters_country.clone().unwrap_or_default(),
            self.company_url.clone().unwrap_or_default(),
            self.size_bucket.clone().unwrap_or_default(),
            self.source.clone().unwrap_or_default(),
        ]
    }
}
