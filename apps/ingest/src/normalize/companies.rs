//! Company normalization.

use super::{pick, GenericRow};
use crate::models::CompanyRow;

const ID_FIELDS: &[&str] = &["company_id", "id"];
const NAME_FIELDS: &[&str] = &["company_name", "name"];
const INDUSTRY_FIELDS: &[&str] = &["industry", "domain"];
const CITY_FIELDS: &[&str] = &["city", "headquarters_city"];
const COUNTRY_FIELDS: &[&str] = &["country", "headquarters_country"];
const URL_FIELDS: &[&str] = &["company_url", "url"];
const SIZE_FIELDS: &[&str] = &["size", "size_bucket"];
const SOURCE_FIELDS: &[&str] = &["source", "dataset"];

pub fn normalize_companies(rows: &[GenericRow]) -> Vec<CompanyRow> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| CompanyRow {
            company_id: pick(row, ID_FIELDS).unwrap_or_else(|| format!("company-{index}")),
            company_name: pick(row, NAME_FIELDS).unwrap_or_else(|| "Unknown".to_string()),
            industry: pick(row, INDUSTRY_FIELDS),
            headquarters_city: pick(row, CITY_FIELDS),
            headquarters_country: pick(row, COUNTRY_FIELDS),
            company_url: pick(row, URL_FIELDS),
            size_bucket: pick(row, SIZE_FIELDS),
            source: pick(row, SOURCE_FIELDS).or_else(|| Some("unknown".to_string())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_company_field_fallbacks() {
        let row = json!({
            "name": "Acme Labs",
            "domain": "robotics",
            "city": "Pune",
            "size": "51-200"
        });
        let companies = normalize_companies(&[row.as_object().unwrap().clone()]);

        let company = &companies[0];
        assert_eq!(company.company_id, "company-0");
        assert_eq!(company.company_name, "Acme Labs");
        assert_eq!(company.industry.as_deref(), Some("robotics"));
        assert_eq!(company.headquarters_city.as_deref(), Some("Pune"));
        assert_eq!(company.size_bucket.as_deref(), Some("51-200"));
    }
}
