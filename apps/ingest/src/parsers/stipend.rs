//! Stipend parsing: free-text compensation strings to a monthly INR range.
//!
//! Only INR is resolved. Foreign-currency amounts are flagged ambiguous
//! instead of converted, and annual figures are divided down to monthly.

use serde::{Deserialize, Serialize};

/// Substrings removed before numeric parsing: currency markers, periodicity
/// words, thousands separators. Order matters where one entry prefixes
/// another ("per month" before "per mo", "rs." before "rs").
const STRIP_TOKENS: &[&str] = &[
    "₹",
    "inr",
    "rs.",
    "rs",
    "per annum",
    "per year",
    "lpa",
    "per month",
    "per mo",
    "/ month",
    "/month",
    ",",
];

/// Markers that flag the amount as an annual figure.
const ANNUAL_MARKERS: &[&str] = &["per annum", "per year", "lpa", "lakh"];

/// Parsed compensation range, monthly, in whole rupees.
///
/// `ambiguous` means the string carried an amount this parser deliberately
/// does not resolve (foreign currency, or nothing numeric at all); it is
/// never set alongside a parsed bound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedStipend {
    pub min: Option<i64>,
    pub max: Option<i64>,
    #[serde(default)]
    pub ambiguous: bool,
}

impl ParsedStipend {
    fn ambiguous() -> Self {
        ParsedStipend {
            min: None,
            max: None,
            ambiguous: true,
        }
    }
}

/// Parses a raw stipend/salary string. Never fails.
pub fn parse_stipend(raw: Option<&str>) -> ParsedStipend {
    let raw = match raw {
        Some(s) if !s.trim().is_empty() => s,
        _ => return ParsedStipend::default(),
    };
    let lower = raw.to_lowercase();

    if lower.contains("usd") || lower.contains('$') {
        return ParsedStipend::ambiguous();
    }

    let cleaned = strip_markers(&lower);
    if cleaned.is_empty() {
        return ParsedStipend::default();
    }

    let annual = ANNUAL_MARKERS.iter().any(|m| lower.contains(m));
    // "lpa" amounts are bare numbers once the marker is stripped; explicit
    // "lakh" tokens carry their own magnitude and are scaled in parse_amount.
    let lakh_scale = lower.contains("lpa");

    let (first, second) = split_range(&cleaned);
    let mut min = parse_amount(first);
    let mut max = match second {
        Some(token) => parse_amount(token),
        None => min,
    };

    if lakh_scale {
        min = min.map(|v| v * 100_000.0);
        max = max.map(|v| v * 100_000.0);
    }

    // A single derivable bound mirrors onto the other.
    if min.is_none() {
        min = max;
    }
    if max.is_none() {
        max = min;
    }

    match (min, max) {
        (Some(lo), Some(hi)) => ParsedStipend {
            min: Some(to_monthly(lo, annual)),
            max: Some(to_monthly(hi, annual)),
            ambiguous: false,
        },
        _ => ParsedStipend::ambiguous(),
    }
}

fn strip_markers(lower: &str) -> String {
    let mut text = lower.to_string();
    for token in STRIP_TOKENS {
        text = text.replace(token, " ");
    }
    text.trim().to_string()
}

/// Splits on the first range delimiter (hyphen, en-dash, "to").
fn split_range(text: &str) -> (&str, Option<&str>) {
    let delimiters: &[&str] = &["-", "–", "to"];
    let earliest = delimiters
        .iter()
        .filter_map(|d| text.find(d).map(|pos| (pos, d.len())))
        .min_by_key(|(pos, _)| *pos);
    match earliest {
        Some((pos, len)) => (&text[..pos], Some(&text[pos + len..])),
        None => (text, None),
    }
}

/// Parses one numeric token, applying magnitude suffixes exactly once:
/// trailing `k` multiplies by 1,000; "lakh" or a trailing bare `l`
/// multiplies by 100,000.
fn parse_amount(token: &str) -> Option<f64> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    if let Some(stripped) = token.strip_suffix('k') {
        return parse_digits(stripped).map(|n| n * 1_000.0);
    }
    if token.contains("lakh") || token.ends_with('l') {
        return parse_digits(token).map(|n| n * 100_000.0);
    }
    parse_digits(token)
}

fn parse_digits(token: &str) -> Option<f64> {
    let digits: String = token
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok()
}

/// Annual figures divide by 12 with round-half-up; monthly figures round
/// only to shed fractional input.
fn to_monthly(value: f64, annual: bool) -> i64 {
    let monthly = if annual { value / 12.0 } else { value };
    monthly.round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> ParsedStipend {
        parse_stipend(Some(input))
    }

    fn range(min: i64, max: i64) -> ParsedStipend {
        ParsedStipend {
            min: Some(min),
            max: Some(max),
            ambiguous: false,
        }
    }

    #[test]
    fn test_monthly_range_with_k_suffix() {
        assert_eq!(parse("₹10k-20k /month"), range(10_000, 20_000));
    }

    #[test]
    fn test_plain_monthly_amount() {
        assert_eq!(parse("20000 INR per month"), range(20_000, 20_000));
    }

    #[test]
    fn test_bare_single_figure_mirrors() {
        assert_eq!(parse("15k"), range(15_000, 15_000));
    }

    #[test]
    fn test_lpa_converts_to_monthly() {
        // 3 * 100,000 / 12
        assert_eq!(parse("3 LPA"), range(25_000, 25_000));
    }

    #[test]
    fn test_per_annum_divides_by_twelve() {
        assert_eq!(parse("₹120000 per annum"), range(10_000, 10_000));
    }

    #[test]
    fn test_rs_prefix() {
        assert_eq!(parse("Rs. 5k per month"), range(5_000, 5_000));
    }

    #[test]
    fn test_explicit_lakh_scales_once() {
        assert_eq!(parse("3 lakh per annum"), range(25_000, 25_000));
    }

    #[test]
    fn test_fractional_lpa_rounds_half_up() {
        // 3.5 * 100,000 / 12 = 29,166.67
        assert_eq!(parse("3.5 lpa"), range(29_167, 29_167));
    }

    #[test]
    fn test_foreign_currency_is_ambiguous() {
        assert_eq!(parse("USD 1000"), ParsedStipend::ambiguous());
        assert_eq!(parse("$500/month"), ParsedStipend::ambiguous());
    }

    #[test]
    fn test_empty_input_is_null_not_ambiguous() {
        assert_eq!(parse(""), ParsedStipend::default());
        assert_eq!(parse_stipend(None), ParsedStipend::default());
    }

    #[test]
    fn test_range_with_to_delimiter_and_commas() {
        assert_eq!(parse("₹10,000 to 12,000"), range(10_000, 12_000));
    }

    #[test]
    fn test_unparseable_text_is_ambiguous() {
        assert_eq!(parse("stipend unavailable"), ParsedStipend::ambiguous());
    }
}
