//! Listing normalization: raw dataset rows to `ListingRow`s, with skill
//! canonicalization, location/stipend parsing, and dedup.

use std::collections::HashSet;

use chrono::NaiveDate;

use super::{pick, pick_list, GenericRow};
use crate::matching::SkillMapper;
use crate::models::ListingRow;
use crate::parsers::location::{normalize_location, ParsedLocation, WorkMode};
use crate::parsers::stipend::parse_stipend;
use crate::report::ParseFailures;

const ID_FIELDS: &[&str] = &["listing_id", "id"];
const TITLE_FIELDS: &[&str] = &["title", "role", "jobtitle"];
const COMPANY_FIELDS: &[&str] = &["company_name", "company", "employer"];
const LOCATION_FIELDS: &[&str] = &["location", "city", "place"];
const STIPEND_FIELDS: &[&str] = &["stipend", "salary"];
const SKILLS_FIELDS: &[&str] = &["skills", "skill"];
const DURATION_FIELDS: &[&str] = &["duration"];
const MODE_FIELDS: &[&str] = &["mode"];
const CATEGORY_FIELDS: &[&str] = &["category", "domain"];
const DESCRIPTION_FIELDS: &[&str] = &["description", "job_description"];
const URL_FIELDS: &[&str] = &["application_url", "url"];
const POSTED_FIELDS: &[&str] = &["posted_date", "posted"];
const SOURCE_FIELDS: &[&str] = &["source", "dataset"];

/// Date layouts accepted for `posted_date` validation. The raw string is
/// kept verbatim either way; failures only feed the report counter.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];

/// How many mapping/location samples the normalizer keeps for the report.
const SAMPLE_LIMIT: usize = 25;

/// Output of one normalization pass.
#[derive(Debug, Default)]
pub struct ListingNormalization {
    pub listings: Vec<ListingRow>,
    pub mapping_samples: Vec<String>,
    pub location_samples: Vec<String>,
    pub failures: ParseFailures,
}

/// Normalizes raw listing rows. Rows without a resolvable title are
/// dropped; everything else degrades field by field.
pub fn normalize_listings(rows: &[GenericRow], mapper: &SkillMapper) -> ListingNormalization {
    let mut out = ListingNormalization::default();

    for (index, row) in rows.iter().enumerate() {
        let Some(title) = pick(row, TITLE_FIELDS) else {
            continue;
        };
        let company_name =
            pick(row, COMPANY_FIELDS).unwrap_or_else(|| "Unknown".to_string());

        let location_raw = pick(row, LOCATION_FIELDS);
        let location = normalize_location(location_raw.as_deref());
        if location_raw.is_some() {
            if location == ParsedLocation::default() {
                out.failures.locations += 1;
            } else if out.location_samples.len() < SAMPLE_LIMIT {
                out.location_samples.push(format!(
                    "{} -> {}",
                    location_raw.as_deref().unwrap_or_default(),
                    describe_location(&location)
                ));
            }
        }

        let stipend = parse_stipend(pick(row, STIPEND_FIELDS).as_deref());
        if stipend.ambiguous {
            out.failures.stipend += 1;
        }

        let posted_date = pick(row, POSTED_FIELDS);
        if let Some(date) = &posted_date {
            if parse_posted_date(date).is_none() {
                out.failures.posted_date += 1;
            }
        }

        let mut skills = Vec::new();
        for raw_skill in pick_list(row, SKILLS_FIELDS) {
            match mapper.match_skill(&raw_skill).matched {
                Some(record) => {
                    if out.mapping_samples.len() < SAMPLE_LIMIT {
                        out.mapping_samples
                            .push(format!("{raw_skill} -> {}", record.skill_name));
                    }
                    skills.push(record.skill_name);
                }
                None => skills.push(raw_skill),
            }
        }

        let remote = location.mode == Some(WorkMode::Online);
        out.listings.push(ListingRow {
            listing_id: pick(row, ID_FIELDS).unwrap_or_else(|| format!("listing-{index}")),
            title,
            company_id: pick(row, &["company_id"]),
            company_name,
            location_city: location.city,
            location_state: location.state,
            location_country: location
                .country
                .or_else(|| remote.then(|| "Remote".to_string())),
            skills,
            stipend_min_inr: stipend.min,
            stipend_max_inr: stipend.max,
            duration_weeks: infer_duration(row),
            mode: location
                .mode
                .map(|m| m.as_str().to_string())
                .or_else(|| pick(row, MODE_FIELDS)),
            category: pick(row, CATEGORY_FIELDS),
            description: pick(row, DESCRIPTION_FIELDS).unwrap_or_default(),
            application_url: pick(row, URL_FIELDS),
            posted_date,
            source: pick(row, SOURCE_FIELDS).or_else(|| Some("unknown".to_string())),
        });
    }

    out
}

/// Drops repeated listings. Identity is the application URL when present,
/// otherwise title+company+location; the first occurrence wins.
pub fn dedupe_listings(listings: Vec<ListingRow>) -> (Vec<ListingRow>, u64) {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(listings.len());
    let mut duplicates = 0u64;

    for listing in listings {
        let key = match &listing.application_url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => format!(
                "{}-{}-{}-{}",
                listing.title,
                listing.company_name,
                listing.location_city.as_deref().unwrap_or_default(),
                listing.location_state.as_deref().unwrap_or_default()
            ),
        };
        if seen.insert(key) {
            kept.push(listing);
        } else {
            duplicates += 1;
        }
    }
    (kept, duplicates)
}

pub fn parse_posted_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value.trim(), format).ok())
}

fn infer_duration(row: &GenericRow) -> Option<i64> {
    let raw = pick(row, DURATION_FIELDS)?;
    let digits: String = raw
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn describe_location(location: &ParsedLocation) -> String {
    [
        location.city.as_deref(),
        location.state.as_deref(),
        location.country.as_deref(),
    ]
    .iter()
    .flatten()
    .copied()
    .collect::<Vec<_>>()
    .join(", ")
}
