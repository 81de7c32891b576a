//! Fresh analysis flow: analyze, normalize, persist, then show it in the session.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::analysis::normalize::normalize;
use crate::analyzer_client::ResumeUpload;
use crate::errors::AppError;
use crate::models::analysis::AnalysisRecord;
use crate::models::history::{merge_row, storable_payload};
use crate::state::AppState;

pub const SAVE_FAILED_NOTICE: &str = "Analysis complete, but failed to save to cloud.";

#[derive(Debug, Clone)]
pub struct AnalysisSubmission {
    pub uid: String,
    pub job_description: String,
    pub resume: ResumeUpload,
}

impl AnalysisSubmission {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.uid.trim().is_empty() {
            return Err(AppError::Validation("uid cannot be empty".to_string()));
        }
        if self.job_description.trim().is_empty() {
            return Err(AppError::Validation(
                "job_description cannot be empty".to_string(),
            ));
        }
        if self.resume.bytes.is_empty() {
            return Err(AppError::Validation("resume file is empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub record: AnalysisRecord,
    pub saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Adds what the caller knows about the analysis to the service's raw payload.
fn stamp(raw: Value, submission: &AnalysisSubmission, now: DateTime<Utc>) -> Value {
    let mut doc = match raw {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    doc.remove("id");
    doc.remove("timestamp");
    doc.insert(
        "resume_filename".to_string(),
        Value::String(submission.resume.file_name.clone()),
    );
    doc.insert(
        "job_description".to_string(),
        Value::String(submission.job_description.clone()),
    );
    doc.insert("uid".to_string(), Value::String(submission.uid.clone()));
    doc.insert("created_at".to_string(), Value::String(now.to_rfc3339()));
    Value::Object(doc)
}

/// Runs one analysis end to end.
///
/// Analyzer failures are errors. A failed save is not: the unsaved record comes back
/// with a notice and the session is left untouched.
pub async fn submit_analysis(
    state: &AppState,
    submission: AnalysisSubmission,
) -> Result<AnalysisResponse, AppError> {
    submission.validate()?;
    let uid = submission.uid.clone();

    let raw = state
        .analyzer
        .analyze(&submission.resume, &submission.job_description)
        .await?;
    let fresh = normalize(&stamp(raw, &submission, Utc::now()));

    let payload = storable_payload(serde_json::to_value(&fresh).map_err(anyhow::Error::from)?);
    let row = match state.store.insert_history(&uid, &payload).await {
        Ok(row) => row,
        Err(e) => {
            warn!("Saving analysis for {uid} failed: {e}");
            return Ok(AnalysisResponse {
                record: fresh,
                saved: false,
                notice: Some(SAVE_FAILED_NOTICE.to_string()),
            });
        }
    };

    // Same path a later refresh takes, so the session shows what the store will return.
    let persisted = normalize(&merge_row(row.id, &uid, row.created_at, payload));
    if let Some(session) = state.sessions.get(&uid).await {
        if let Err(e) = session.append(persisted.clone()).await {
            warn!("Could not add saved analysis to session for {uid}: {e}");
        }
    }
    info!("Saved analysis {} for {uid}", row.id);

    Ok(AnalysisResponse {
        record: AnalysisRecord {
            resume_text: fresh.resume_text,
            ..persisted
        },
        saved: true,
        notice: None,
    })
}
