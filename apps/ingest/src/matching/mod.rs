//! Skill matching: resolves raw skill mentions against the canonical catalog.
//!
//! Three tiers, each consulted only if the previous one missed:
//! 1. exact/alias lookup over normalized keys (score 1.0)
//! 2. Jaro-Winkler scan over the prebuilt key index (catches prefix and
//!    substitution typos)
//! 3. Sørensen-Dice bigram scan over the same keys (catches token-order
//!    errors the edit-distance tier misses)

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strsim::{jaro_winkler, sorensen_dice};

/// Minimum similarity for either fuzzy tier to accept its best hit.
/// A false positive aliases unrelated skills, which poisons every chunk tag
/// downstream, so the bar stays high.
const FUZZY_THRESHOLD: f64 = 0.85;

/// Domain abbreviations expanded during normalization, applied per token.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("ml", "machine learning"),
    ("js", "javascript"),
    ("aws", "amazon web services"),
];

/// One entry of the canonical skill catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillRecord {
    pub skill_id: String,
    pub skill_name: String,
    #[serde(default)]
    pub skill_category: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Result of a single lookup. Not persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SkillMapping {
    pub input: String,
    pub matched: Option<SkillRecord>,
    pub score: f32,
}

/// Lowercases, strips everything but alphanumerics and spaces, collapses
/// whitespace, and expands the abbreviation table token by token.
pub fn normalize_skill(value: &str) -> String {
    let mut cleaned = String::with_capacity(value.len());
    for c in value.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            cleaned.push(c);
        } else {
            cleaned.push(' ');
        }
    }

    let mut out = String::with_capacity(cleaned.len());
    for token in cleaned.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        match ABBREVIATIONS.iter().find(|(abbr, _)| *abbr == token) {
            Some((_, expansion)) => out.push_str(expansion),
            None => out.push_str(token),
        }
    }
    out
}

/// Immutable skill matcher built once per ingestion run from the full
/// catalog and passed by reference to everything that needs it.
pub struct SkillMapper {
    records: Vec<SkillRecord>,
    exact: HashMap<String, usize>,
    /// Fuzzy candidate index: every normalized name and alias, in catalog
    /// order, so tie-breaks are deterministic.
    keys: Vec<(String, usize)>,
}

impl SkillMapper {
    pub fn new(records: Vec<SkillRecord>) -> Self {
        let mut exact = HashMap::new();
        let mut keys = Vec::new();
        for (idx, record) in records.iter().enumerate() {
            let name_key = normalize_skill(&record.skill_name);
            if !name_key.is_empty() {
                exact.entry(name_key.clone()).or_insert(idx);
                keys.push((name_key, idx));
            }
            for alias in &record.aliases {
                let alias_key = normalize_skill(alias);
                if alias_key.is_empty() {
                    continue;
                }
                exact.entry(alias_key.clone()).or_insert(idx);
                keys.push((alias_key, idx));
            }
        }
        Self {
            records,
            exact,
            keys,
        }
    }

    /// Resolves one raw mention. Pure function of constructed state; a miss
    /// is `matched: None` with score 0.0, never an error.
    pub fn match_skill(&self, raw: &str) -> SkillMapping {
        let key = normalize_skill(raw);

        if let Some(&idx) = self.exact.get(&key) {
            return self.hit(raw, idx, 1.0);
        }

        if let Some((idx, similarity)) = self.best_by(&key, jaro_winkler) {
            if similarity >= FUZZY_THRESHOLD {
                return self.hit(raw, idx, similarity as f32);
            }
        }

        if let Some((idx, rating)) = self.best_by(&key, sorensen_dice) {
            if rating >= FUZZY_THRESHOLD {
                return self.hit(raw, idx, rating as f32);
            }
        }

        SkillMapping {
            input: raw.to_string(),
            matched: None,
            score: 0.0,
        }
    }

    /// Best candidate under `metric`. Strict `>` keeps the earliest catalog
    /// entry on ties.
    fn best_by(&self, key: &str, metric: fn(&str, &str) -> f64) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (candidate, idx) in &self.keys {
            let similarity = metric(key, candidate);
            if best.map_or(true, |(_, b)| similarity > b) {
                best = Some((*idx, similarity));
            }
        }
        best
    }

    fn hit(&self, raw: &str, idx: usize, score: f32) -> SkillMapping {
        SkillMapping {
            input: raw.to_string(),
            matched: Some(self.records[idx].clone()),
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<SkillRecord> {
        vec![
            SkillRecord {
                skill_id: "1".into(),
                skill_name: "Machine Learning".into(),
                skill_category: None,
                aliases: vec!["ml".into()],
            },
            SkillRecord {
                skill_id: "2".into(),
                skill_name: "Python".into(),
                skill_category: None,
                aliases: vec!["py".into()],
            },
            SkillRecord {
                skill_id: "3".into(),
                skill_name: "Amazon Web Services".into(),
                skill_category: None,
                aliases: vec!["aws".into()],
            },
        ]
    }

    #[test]
    fn test_normalize_strips_punctuation_and_case() {
        assert_eq!(normalize_skill("  C++ / Python!  "), "c python");
    }

    #[test]
    fn test_normalize_expands_abbreviations() {
        assert_eq!(normalize_skill("ML"), "machine learning");
        assert_eq!(normalize_skill("node JS"), "node javascript");
    }

    #[test]
    fn test_exact_match_scores_one() {
        let mapper = SkillMapper::new(catalog());
        let mapping = mapper.match_skill("python");
        assert_eq!(mapping.matched.unwrap().skill_name, "Python");
        assert_eq!(mapping.score, 1.0);
    }

    #[test]
    fn test_case_insensitive() {
        let mapper = SkillMapper::new(catalog());
        let mapping = mapper.match_skill("PyThOn");
        assert_eq!(mapping.matched.unwrap().skill_name, "Python");
    }

    #[test]
    fn test_alias_resolves_to_canonical_record() {
        let mapper = SkillMapper::new(catalog());
        let mapping = mapper.match_skill("py");
        assert_eq!(mapping.matched.unwrap().skill_name, "Python");
    }

    #[test]
    fn test_abbreviation_expansion_reaches_exact_tier() {
        let mapper = SkillMapper::new(catalog());
        let mapping = mapper.match_skill("AWS");
        assert_eq!(mapping.matched.unwrap().skill_name, "Amazon Web Services");
        assert_eq!(mapping.score, 1.0);
    }

    #[test]
    fn test_fuzzy_tier_catches_typo() {
        let mapper = SkillMapper::new(catalog());
        let mapping = mapper.match_skill("pythn");
        assert_eq!(mapping.matched.unwrap().skill_name, "Python");
        assert!(mapping.score >= 0.85);
        assert!(mapping.score < 1.0);
    }

    #[test]
    fn test_unknown_skill_misses() {
        let mapper = SkillMapper::new(catalog());
        let mapping = mapper.match_skill("kubernetes");
        assert!(mapping.matched.is_none());
        assert_eq!(mapping.score, 0.0);
    }

    #[test]
    fn test_empty_input_misses() {
        let mapper = SkillMapper::new(catalog());
        assert!(mapper.match_skill("").matched.is_none());
        assert!(mapper.match_skill("  !!  ").matched.is_none());
    }
}
