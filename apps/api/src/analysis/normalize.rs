//! Normalizer — turns one raw analysis payload of arbitrary shape into an `AnalysisRecord`.
//!
//! Never fails. Missing or malformed fields degrade to documented defaults:
//! numbers to `0`, sequences to empty, `resume_filename`/`job_description` to `"N/A"`,
//! everything else to the empty string.
//!
//! Field-name variants are resolved through the alias tables below, first present key wins.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::models::analysis::{AnalysisRecord, ProviderLinks};

/// Display format for timestamps, e.g. `16-10-2026 14:05:09` (UTC).
pub const DISPLAY_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

pub const PLACEHOLDER: &str = "N/A";

pub const SKILL_MATCH_KEYS: &[&str] = &["skill_match", "skill_match_pct", "skillMatch"];
pub const MISSING_SKILLS_KEYS: &[&str] = &["missing_skills", "missingSkills"];
pub const RESUME_FILENAME_KEYS: &[&str] = &["resume_filename", "resumeFilename"];
pub const JOB_DESCRIPTION_KEYS: &[&str] = &["job_description", "jobDescription"];
pub const OWNER_KEYS: &[&str] = &["uid", "owner"];
pub const CREATED_AT_KEYS: &[&str] = &["created_at", "createdAt"];
pub const RESUME_TEXT_KEYS: &[&str] = &["resume_text", "resumeText"];

/// Builds the canonical record for `raw`. `normalize(&to_json(normalize(x))) == normalize(x)`.
pub fn normalize(raw: &Value) -> AnalysisRecord {
    let created_at = first_present(raw, CREATED_AT_KEYS)
        .and_then(to_datetime)
        .or_else(|| raw.get("timestamp").and_then(to_datetime));

    let timestamp = match raw.get("timestamp").and_then(Value::as_str) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => created_at
            .map(|t| t.format(DISPLAY_FORMAT).to_string())
            .unwrap_or_default(),
    };

    AnalysisRecord {
        id: raw.get("id").and_then(to_identifier),
        owner: first_present(raw, OWNER_KEYS).and_then(to_identifier),
        resume_filename: string_or(first_present(raw, RESUME_FILENAME_KEYS), PLACEHOLDER),
        job_description: string_or(first_present(raw, JOB_DESCRIPTION_KEYS), PLACEHOLDER),
        skill_match: first_present(raw, SKILL_MATCH_KEYS)
            .map(coerce_number)
            .unwrap_or(0.0),
        missing_skills: coerce_list(first_present(raw, MISSING_SKILLS_KEYS)),
        strengths: coerce_list(raw.get("strengths")),
        weaknesses: coerce_list(raw.get("weaknesses")),
        suggestions: coerce_list(raw.get("suggestions")),
        summary: string_or(raw.get("summary"), ""),
        timestamp,
        created_at,
        learning_resources: coerce_resources(raw.get("learning_resources")),
        resume_text: first_present(raw, RESUME_TEXT_KEYS)
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

/// First alias whose value exists and is not `null`.
fn first_present<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .find(|v| !v.is_null())
}

/// Coerces a score. Anything unparseable or non-finite becomes `0`.
pub fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(0.0)
            }
        }
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Coerces a skill/strength/weakness/suggestion field into a list.
///
/// - arrays pass through in order, without dedup (scalars stringified, other values dropped)
/// - strings containing `\n` split on newlines, other strings split on commas;
///   pieces are trimmed and empty pieces dropped
/// - anything else is empty
pub fn coerce_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => {
            let sep = if s.contains('\n') { '\n' } else { ',' };
            s.split(sep)
                .map(str::trim)
                .filter(|piece| !piece.is_empty())
                .map(str::to_string)
                .collect()
        }
        _ => Vec::new(),
    }
}

fn string_or(value: Option<&Value>, default: &str) -> String {
    value
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

fn to_identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Four-digit years only; anything else does not survive an RFC 3339 round trip.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1..=9999;

/// Accepts RFC 3339, the display format, or epoch milliseconds.
fn to_datetime(value: &Value) -> Option<DateTime<Utc>> {
    let parsed = match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, DISPLAY_FORMAT)
                    .ok()
                    .map(|naive| naive.and_utc())
            }),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    };
    parsed.filter(|t| YEAR_RANGE.contains(&t.year()))
}

fn coerce_resources(value: Option<&Value>) -> BTreeMap<String, ProviderLinks> {
    let Some(Value::Object(skills)) = value else {
        return BTreeMap::new();
    };
    skills
        .iter()
        .filter_map(|(skill, providers)| {
            let providers = providers.as_object()?;
            let links: ProviderLinks = providers
                .iter()
                .filter_map(|(name, url)| Some((name.clone(), url.as_str()?.to_string())))
                .collect();
            Some((skill.clone(), links))
        })
        .collect()
}
