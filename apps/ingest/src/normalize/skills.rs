//! Skill catalog normalization.

use super::{pick, pick_list, GenericRow};
use crate::matching::SkillRecord;

const ID_FIELDS: &[&str] = &["skill_id", "id"];
const NAME_FIELDS: &[&str] = &["skill_name", "name", "skill"];
const CATEGORY_FIELDS: &[&str] = &["skill_category", "category"];
const ALIAS_FIELDS: &[&str] = &["aliases"];

/// Normalizes raw skill rows into the catalog the `SkillMapper` is built
/// from.
pub fn normalize_skills(rows: &[GenericRow]) -> Vec<SkillRecord> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| SkillRecord {
            skill_id: pick(row, ID_FIELDS).unwrap_or_else(|| format!("skill-{index}")),
            skill_name: pick(row, NAME_FIELDS).unwrap_or_else(|| "unknown".to_string()),
            skill_category: pick(row, CATEGORY_FIELDS),
            aliases: pick_list(row, ALIAS_FIELDS),
        })
        .collect()
}
