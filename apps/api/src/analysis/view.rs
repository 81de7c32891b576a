//! History filtering and sorting for presentation.
//!
//! Stage order is fixed: bucket filter, then search filter, then sort. Stage counts are
//! reported so "N items after filter" is reproducible.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::analysis::AnalysisRecord;

pub const EXCELLENT_MIN: f64 = 75.0;
pub const MODERATE_MIN: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBucket {
    Excellent,
    Moderate,
    NeedsImprovement,
}

impl ScoreBucket {
    /// `>= 75` excellent, `50..75` moderate, below that needs improvement.
    /// Out-of-range scores fall into the nearest extreme.
    pub fn classify(score: f64) -> Self {
        if score >= EXCELLENT_MIN {
            ScoreBucket::Excellent
        } else if score >= MODERATE_MIN {
            ScoreBucket::Moderate
        } else {
            ScoreBucket::NeedsImprovement
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFilter {
    #[default]
    All,
    Excellent,
    Moderate,
    NeedsImprovement,
}

impl ScoreFilter {
    pub fn matches(&self, score: f64) -> bool {
        let bucket = ScoreBucket::classify(score);
        match self {
            ScoreFilter::All => true,
            ScoreFilter::Excellent => bucket == ScoreBucket::Excellent,
            ScoreFilter::Moderate => bucket == ScoreBucket::Moderate,
            ScoreFilter::NeedsImprovement => bucket == ScoreBucket::NeedsImprovement,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Timestamp,
    SkillMatch,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewConfig {
    #[serde(default, rename = "bucket")]
    pub score_bucket: ScoreFilter,
    #[serde(default, rename = "search")]
    pub search_text: String,
    #[serde(default, rename = "sort")]
    pub sort_by: SortKey,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryView {
    pub total: usize,
    pub after_bucket: usize,
    pub after_search: usize,
    pub records: Vec<AnalysisRecord>,
}

/// Case-insensitive substring match on filename or job description.
fn matches_search(record: &AnalysisRecord, needle_lower: &str) -> bool {
    needle_lower.is_empty()
        || record.resume_filename.to_lowercase().contains(needle_lower)
        || record.job_description.to_lowercase().contains(needle_lower)
}

/// Newest first by chronological value. Records without one go last.
fn by_recency(a: &AnalysisRecord, b: &AnalysisRecord) -> Ordering {
    b.created_at.cmp(&a.created_at)
}

fn by_score(a: &AnalysisRecord, b: &AnalysisRecord) -> Ordering {
    b.skill_match
        .partial_cmp(&a.skill_match)
        .unwrap_or(Ordering::Equal)
}

/// Applies `config` to `records` and returns a new, ordered subsequence.
/// The input is never modified.
pub fn apply(records: &[AnalysisRecord], config: &ViewConfig) -> HistoryView {
    let mut selected: Vec<&AnalysisRecord> = records
        .iter()
        .filter(|r| config.score_bucket.matches(r.skill_match))
        .collect();
    let after_bucket = selected.len();

    let needle = config.search_text.to_lowercase();
    selected.retain(|r| matches_search(r, &needle));
    let after_search = selected.len();

    // Vec::sort_by is stable: equal keys keep snapshot order.
    match config.sort_by {
        SortKey::SkillMatch => selected.sort_by(|a, b| by_score(a, b)),
        SortKey::Timestamp => selected.sort_by(|a, b| by_recency(a, b)),
    }

    HistoryView {
        total: records.len(),
        after_bucket,
        after_search,
        records: selected.into_iter().cloned().collect(),
    }
}
