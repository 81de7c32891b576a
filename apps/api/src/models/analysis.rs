use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Learning links for one missing skill, keyed by provider ("YouTube", "Coursera", ...).
pub type ProviderLinks = BTreeMap<String, String>;

/// Canonical analysis record. Built only by `analysis::normalize`; never mutated once
/// it enters a `HistoryStore`.
///
/// Serialises with the same snake_case keys the normalizer reads, so a record can be
/// fed back through `normalize` and come out equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "uid", skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub resume_filename: String,
    pub job_description: String,
    pub skill_match: f64,
    pub missing_skills: Vec<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub suggestions: Vec<String>,
    pub summary: String,
    /// Display rendering, e.g. "16-10-2026 14:05:09". Never used for ordering.
    pub timestamp: String,
    /// Chronological value used for ordering. Absent when the payload carried none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub learning_resources: BTreeMap<String, ProviderLinks>,
    /// Only present on fresh analysis responses; persisted rows drop it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_text: Option<String>,
}

impl AnalysisRecord {
    /// Assigns the owner to a record that arrived without one.
    /// A record that already names an owner keeps it.
    pub fn owned_by(mut self, owner: &str) -> Self {
        if self.owner.is_none() {
            self.owner = Some(owner.to_string());
        }
        self
    }

    /// Score clamped to 0–100 for presentation. The stored value is left as-is.
    pub fn display_score(&self) -> f64 {
        self.skill_match.clamp(0.0, 100.0)
    }
}
