use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

use crate::errors::AppError;
use crate::models::feedback::{Feedback, FeedbackRequest};
use crate::state::AppState;

/// POST /api/v1/feedback
pub async fn handle_submit_feedback(
    State(state): State<AppState>,
    Json(req): Json<FeedbackRequest>,
) -> Result<StatusCode, AppError> {
    let feedback = Feedback::try_from(req)?;
    state.store.insert_feedback(&feedback).await?;
    info!(
        "Recorded {} feedback from {} ({}/5)",
        feedback.kind.as_str(),
        feedback.uid,
        feedback.rating
    );
    Ok(StatusCode::CREATED)
}
