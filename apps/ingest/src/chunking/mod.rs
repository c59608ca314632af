//! Splits source text into overlapping windows and tags each with the
//! skills that co-occur in it. Chunks are the unit of embedding and
//! retrieval; chunking is deterministic so re-runs produce identical ids.

use serde::{Deserialize, Serialize};

use crate::matching::SkillMapper;

/// Window size in characters.
pub const CHUNK_SIZE: usize = 1500;
/// Overlap carried into the next window.
pub const CHUNK_OVERLAP: usize = 300;
/// Maximum skill tags per chunk.
const TOP_SKILLS: usize = 5;

/// What kind of source a chunk was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Listing,
    Resume,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Listing => "listing",
            SourceType::Resume => "resume",
        }
    }
}

/// A bounded slice of source text plus the metadata retrieval filters need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub source_type: SourceType,
    pub source_id: String,
    pub chunk_index: u32,
    pub text: String,
    pub tokens_estimate: u32,
    pub top_skills: Vec<String>,
    pub location_city: Option<String>,
    pub location_state: Option<String>,
    pub location_country: Option<String>,
    pub posted_date: Option<String>,
    pub source: Option<String>,
}

/// Per-source context copied onto every chunk cut from it.
#[derive(Debug, Clone, Default)]
pub struct ChunkOptions {
    pub location_city: Option<String>,
    pub location_state: Option<String>,
    pub location_country: Option<String>,
    pub posted_date: Option<String>,
    pub source: Option<String>,
}

/// Cuts `text` into overlapping chunks. Empty windows are skipped without
/// consuming a chunk index, so indices are always a dense 0-based sequence.
/// Without a mapper the chunks carry no skill tags; chunking itself never
/// requires a catalog.
pub fn chunk_text(
    text: &str,
    source_type: SourceType,
    source_id: &str,
    mapper: Option<&SkillMapper>,
    opts: &ChunkOptions,
) -> Vec<Chunk> {
    let cleaned = sanitize(text);
    let mut chunks = Vec::new();
    let mut index = 0u32;
    let mut cursor = 0usize;

    // Sanitized text is printable ASCII, so byte offsets are char offsets.
    while cursor < cleaned.len() {
        let end = (cursor + CHUNK_SIZE).min(cleaned.len());
        let window = cleaned[cursor..end].trim();
        if !window.is_empty() {
            chunks.push(Chunk {
                chunk_id: format!("{source_id}-{index}"),
                source_type,
                source_id: source_id.to_string(),
                chunk_index: index,
                text: window.to_string(),
                tokens_estimate: tokens_estimate(window),
                top_skills: extract_skills(window, mapper),
                location_city: opts.location_city.clone(),
                location_state: opts.location_state.clone(),
                location_country: opts.location_country.clone(),
                posted_date: opts.posted_date.clone(),
                source: opts.source.clone(),
            });
            index += 1;
        }
        cursor += CHUNK_SIZE - CHUNK_OVERLAP;
    }
    chunks
}

/// Strips `<...>` markup, drops non-printable-ASCII, collapses whitespace.
fn sanitize(text: &str) -> String {
    let mut untagged = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        untagged.push_str(&rest[..start]);
        match rest[start..].find('>') {
            Some(end) => {
                untagged.push(' ');
                rest = &rest[start + end + 1..];
            }
            None => {
                // No closing bracket; keep the tail verbatim.
                untagged.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    untagged.push_str(rest);

    let printable: String = untagged
        .chars()
        .map(|c| if (' '..='~').contains(&c) { c } else { ' ' })
        .collect();

    printable.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cheap proxy for tokenizer counts: one token per four characters,
/// rounded up. An approximation, not a contract.
fn tokens_estimate(text: &str) -> u32 {
    ((text.len() + 3) / 4) as u32
}

/// Maps every token through the skill catalog and keeps the five most
/// frequent canonical names. Ties keep first-encountered order (the sort
/// is stable).
fn extract_skills(text: &str, mapper: Option<&SkillMapper>) -> Vec<String> {
    let Some(mapper) = mapper else {
        return Vec::new();
    };

    let mut counts: Vec<(String, u32)> = Vec::new();
    let tokens = text
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '.' | ';'))
        .filter(|t| !t.is_empty());
    for token in tokens {
        if let Some(record) = mapper.match_skill(token).matched {
            match counts.iter_mut().find(|(name, _)| *name == record.skill_name) {
                Some((_, n)) => *n += 1,
                None => counts.push((record.skill_name, 1)),
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(TOP_SKILLS)
        .map(|(name, _)| name)
        .collect()
}
