//! Dashboard reductions over a history snapshot (most-recent-first).

use std::collections::HashMap;

use serde::Serialize;

use crate::models::analysis::AnalysisRecord;

/// Number of entries in the missing-skill frequency table.
pub const TOP_MISSING_SKILLS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillCount {
    pub skill: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScorePoint {
    pub date: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub top_missing_skills: Vec<SkillCount>,
    pub score_series: Vec<ScorePoint>,
}

impl DashboardSummary {
    pub fn from_snapshot(records: &[AnalysisRecord]) -> Self {
        Self {
            total: records.len(),
            top_missing_skills: top_missing_skills(records, TOP_MISSING_SKILLS),
            score_series: score_series(records),
        }
    }
}

/// "SQL (3 yrs)" -> "SQL". Everything from the first `(` is dropped.
fn clean_skill(skill: &str) -> &str {
    skill.split('(').next().unwrap_or_default().trim()
}

/// Counts cleaned missing skills across all records and returns the `limit` most frequent.
///
/// Ties keep first-encounter order: counts are accumulated in insertion order and then
/// stable-sorted by descending count.
pub fn top_missing_skills(records: &[AnalysisRecord], limit: usize) -> Vec<SkillCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<SkillCount> = Vec::new();

    for skill in records.iter().flat_map(|r| r.missing_skills.iter()) {
        let cleaned = clean_skill(skill);
        if cleaned.is_empty() {
            continue;
        }
        match index.get(cleaned) {
            Some(&slot) => counts[slot].count += 1,
            None => {
                index.insert(cleaned, counts.len());
                counts.push(SkillCount {
                    skill: cleaned.to_string(),
                    count: 1,
                });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}

/// Date part of a display timestamp: everything before the first space or comma.
fn date_label(timestamp: &str) -> &str {
    timestamp
        .split([' ', ','])
        .next()
        .unwrap_or_default()
}

/// Chronological (oldest first) `(date, score)` series. No gap filling.
pub fn score_series(records: &[AnalysisRecord]) -> Vec<ScorePoint> {
    records
        .iter()
        .rev()
        .map(|r| ScorePoint {
            date: date_label(&r.timestamp).to_string(),
            score: r.skill_match,
        })
        .collect()
}
