use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analyzer_client::AnalyzerError;
use crate::history::HistoryError;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No active session for '{0}'")]
    NoSession(String),

    #[error("Session closed while the request was in flight")]
    SessionClosed,

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Analyzer error: {0}")]
    Analyzer(#[from] AnalyzerError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            other => AppError::Store(other),
        }
    }
}

impl From<HistoryError> for AppError {
    fn from(err: HistoryError) -> Self {
        match err {
            // Handlers look the session up first, so this only happens on a concurrent logout.
            HistoryError::NoSession => AppError::SessionClosed,
            e @ HistoryError::OwnerMismatch { .. } => AppError::Validation(e.to_string()),
            HistoryError::Store(e) => AppError::from(e),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::NoSession(uid) => (
                StatusCode::CONFLICT,
                "NO_SESSION",
                format!("No active session for '{uid}'. Log in first."),
            ),
            AppError::SessionClosed => (
                StatusCode::CONFLICT,
                "NO_SESSION",
                "The session was closed. Log in again.".to_string(),
            ),
            AppError::Store(e) => {
                tracing::error!("Store error: {e}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "STORE_ERROR",
                    "The history store is unavailable".to_string(),
                )
            }
            AppError::Analyzer(AnalyzerError::Rejected(msg)) => {
                tracing::warn!("Analysis rejected: {msg}");
                (StatusCode::UNPROCESSABLE_ENTITY, "ANALYSIS_REJECTED", msg.clone())
            }
            AppError::Analyzer(e) => {
                tracing::error!("Analyzer error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "ANALYZER_ERROR",
                    "Error analyzing resume. Check backend connection.".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
