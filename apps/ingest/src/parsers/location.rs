//! Location parsing via fixed gazetteers, tuned for Indian listings.
//!
//! Matching is first-containment-wins in declared array order. Compound
//! strings naming several places resolve to whichever entry appears first
//! in the gazetteer, not the longest or closest match.

use serde::{Deserialize, Serialize};

/// First-level administrative regions. A hit sets `state` and implies India.
const INDIAN_STATES: &[&str] = &[
    "andhra pradesh",
    "arunachal pradesh",
    "assam",
    "bihar",
    "chhattisgarh",
    "goa",
    "gujarat",
    "haryana",
    "himachal pradesh",
    "jharkhand",
    "karnataka",
    "kerala",
    "madhya pradesh",
    "maharashtra",
    "manipur",
    "meghalaya",
    "mizoram",
    "nagaland",
    "odisha",
    "punjab",
    "rajasthan",
    "sikkim",
    "tamil nadu",
    "telangana",
    "tripura",
    "uttar pradesh",
    "uttarakhand",
    "west bengal",
    "delhi",
    "jammu and kashmir",
    "ladakh",
];

/// Major cities the heuristic recognizes.
const METRO_CITIES: &[&str] = &[
    "mumbai",
    "delhi",
    "bengaluru",
    "bangalore",
    "hyderabad",
    "chennai",
    "kolkata",
    "pune",
];

/// Work-mode classification of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkMode {
    Online,
    Onsite,
    Hybrid,
}

impl WorkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkMode::Online => "online",
            WorkMode::Onsite => "onsite",
            WorkMode::Hybrid => "hybrid",
        }
    }
}

/// Parsed place fields. All None means "unparseable"; the caller counts it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedLocation {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<WorkMode>,
}

/// Turns a free-text place description into city/state/country plus a
/// work-mode tag. Remote markers override all further parsing.
pub fn normalize_location(input: Option<&str>) -> ParsedLocation {
    let raw = match input {
        Some(s) if !s.trim().is_empty() => s,
        _ => return ParsedLocation::default(),
    };
    let text = raw.to_lowercase();

    if text.contains("remote") || text.contains("work from home") {
        return ParsedLocation {
            mode: Some(WorkMode::Online),
            ..Default::default()
        };
    }

    let mut city = None;
    let mut state = None;
    let mut country = None;

    for name in INDIAN_STATES {
        if text.contains(name) {
            state = Some(title_case(name));
            country = Some("India".to_string());
            break;
        }
    }

    for name in METRO_CITIES {
        if text.contains(name) {
            city = Some(title_case(name));
            if state.is_none() {
                state = state_for_city(name).map(str::to_string);
            }
            country = Some("India".to_string());
            break;
        }
    }

    if country.is_none() {
        if text.contains("india") {
            country = Some("India".to_string());
        } else if text.contains("usa") || text.contains("united states") {
            country = Some("United States".to_string());
        } else if text.contains("uk") || text.contains("united kingdom") {
            country = Some("United Kingdom".to_string());
        } else if text.contains("canada") {
            country = Some("Canada".to_string());
        }
    }

    ParsedLocation {
        city,
        state,
        country,
        mode: None,
    }
}

fn state_for_city(city: &str) -> Option<&'static str> {
    match city {
        "mumbai" | "pune" => Some("Maharashtra"),
        "delhi" => Some("Delhi"),
        "bengaluru" | "bangalore" => Some("Karnataka"),
        "hyderabad" => Some("Telangana"),
        "chennai" => Some("Tamil Nadu"),
        "kolkata" => Some("West Bengal"),
        _ => None,
    }
}

fn title_case(value: &str) -> String {
    value
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
