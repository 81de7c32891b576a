use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::aggregate::DashboardSummary;
use crate::analysis::view::{apply, ScoreBucket, ViewConfig};
use crate::analyzer_client::ResumeUpload;
use crate::errors::AppError;
use crate::history::store::HistoryStore;
use crate::history::submit::{submit_analysis, AnalysisResponse, AnalysisSubmission};
use crate::models::analysis::AnalysisRecord;
use crate::state::AppState;

pub const REFRESH_FAILED_NOTICE: &str = "Could not fetch cloud history.";

/// `Query` whose rejection is reported in the JSON error body.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ValidQuery<T>(pub T);

#[derive(Deserialize)]
pub struct UidQuery {
    pub uid: String,
}

#[derive(Deserialize)]
pub struct SessionRequest {
    pub uid: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub uid: String,
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryItem {
    #[serde(flatten)]
    pub record: AnalysisRecord,
    pub bucket: ScoreBucket,
    pub display_score: f64,
}

impl From<AnalysisRecord> for HistoryItem {
    fn from(record: AnalysisRecord) -> Self {
        Self {
            bucket: ScoreBucket::classify(record.skill_match),
            display_score: record.display_score(),
            record,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryListResponse {
    pub total: usize,
    pub after_bucket: usize,
    pub after_search: usize,
    pub records: Vec<HistoryItem>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub deleted: u64,
}

async fn session_for(state: &AppState, uid: &str) -> Result<Arc<HistoryStore>, AppError> {
    state
        .sessions
        .get(uid)
        .await
        .ok_or_else(|| AppError::NoSession(uid.to_string()))
}

/// POST /api/v1/sessions
///
/// Login: opens the session and loads history. A failed load is reported as a notice;
/// the session stays open with whatever snapshot it had.
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    if req.uid.trim().is_empty() {
        return Err(AppError::Validation("uid cannot be empty".to_string()));
    }
    let session = state.sessions.open(&req.uid).await;
    let notice = match session.refresh(state.store.as_ref()).await {
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("Login refresh for {} failed: {e}", req.uid);
            Some(REFRESH_FAILED_NOTICE.to_string())
        }
    };
    let records = session.snapshot().await.len();
    Ok(Json(SessionResponse {
        uid: req.uid,
        records,
        notice,
    }))
}

/// DELETE /api/v1/sessions/:uid
pub async fn handle_logout(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> StatusCode {
    state.sessions.close(&uid).await;
    StatusCode::NO_CONTENT
}

/// GET /api/v1/history?uid=..&bucket=..&search=..&sort=..
pub async fn handle_list_history(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<UidQuery>,
    ValidQuery(config): ValidQuery<ViewConfig>,
) -> Result<Json<HistoryListResponse>, AppError> {
    let snapshot = session_for(&state, &params.uid).await?.snapshot().await;
    let view = apply(&snapshot, &config);
    Ok(Json(HistoryListResponse {
        total: view.total,
        after_bucket: view.after_bucket,
        after_search: view.after_search,
        records: view.records.into_iter().map(HistoryItem::from).collect(),
    }))
}

/// DELETE /api/v1/history/:id?uid=..
///
/// The session only changes after the store confirmed the delete.
pub async fn handle_delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidQuery(params): ValidQuery<UidQuery>,
) -> Result<StatusCode, AppError> {
    let session = session_for(&state, &params.uid).await?;
    state.store.delete_history(&params.uid, &id).await?;
    session.remove(&id).await?;
    info!("Deleted history item {id} for {}", params.uid);
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/history?uid=..
pub async fn handle_clear_history(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<UidQuery>,
) -> Result<Json<ClearResponse>, AppError> {
    let session = session_for(&state, &params.uid).await?;
    let deleted = state.store.clear_history(&params.uid).await?;
    session.clear().await?;
    info!("Cleared {deleted} history items for {}", params.uid);
    Ok(Json(ClearResponse { deleted }))
}

/// GET /api/v1/dashboard?uid=..
pub async fn handle_dashboard(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<UidQuery>,
) -> Result<Json<DashboardSummary>, AppError> {
    let snapshot = session_for(&state, &params.uid).await?.snapshot().await;
    Ok(Json(DashboardSummary::from_snapshot(&snapshot)))
}

/// POST /api/v1/analyses (multipart: uid, job_description, file)
pub async fn handle_submit_analysis(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    let mut uid = None;
    let mut job_description = None;
    let mut resume = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "uid" => uid = Some(read_text(field).await?),
            "job_description" => job_description = Some(read_text(field).await?),
            "file" => {
                let file_name = field.file_name().unwrap_or("resume").to_string();
                let bytes: Bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read file: {e}")))?;
                resume = Some(ResumeUpload { file_name, bytes });
            }
            _ => {}
        }
    }

    let submission = AnalysisSubmission {
        uid: uid.ok_or_else(|| missing_field("uid"))?,
        job_description: job_description.ok_or_else(|| missing_field("job_description"))?,
        resume: resume.ok_or_else(|| missing_field("file"))?,
    };
    Ok(Json(submit_analysis(&state, submission).await?))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid text field: {e}")))
}

fn missing_field(name: &str) -> AppError {
    AppError::Validation(format!("missing multipart field '{name}'"))
}
