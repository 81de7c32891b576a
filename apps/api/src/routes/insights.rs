use axum::{extract::State, Json};
use serde::Serialize;
use tracing::{info, warn};

use crate::analyzer_client::{OptimizeRequest, TrendingSkill};
use crate::errors::AppError;
use crate::state::AppState;

pub const TRENDS_FAILED_NOTICE: &str = "Could not load market trends.";

#[derive(Debug, Serialize)]
pub struct OptimizeResponse {
    pub optimized_text: String,
}

#[derive(Debug, Serialize)]
pub struct MarketTrendsResponse {
    pub top_skills: Vec<TrendingSkill>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// POST /api/v1/optimizations
///
/// Rewrites resume text against a job description, addressing the missing skills.
pub async fn handle_optimize(
    State(state): State<AppState>,
    Json(req): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>, AppError> {
    if req.resume_text.trim().is_empty() {
        return Err(AppError::Validation("resume_text cannot be empty".to_string()));
    }
    if req.job_description.trim().is_empty() {
        return Err(AppError::Validation("job_description cannot be empty".to_string()));
    }

    let optimized_text = state.analyzer.optimize(&req).await?;
    info!(
        "Optimized resume text against {} missing skills",
        req.missing_skills.len()
    );
    Ok(Json(OptimizeResponse { optimized_text }))
}

/// GET /api/v1/market-trends
///
/// Trends are supplementary: an unreachable service yields an empty list and a notice.
pub async fn handle_market_trends(State(state): State<AppState>) -> Json<MarketTrendsResponse> {
    match state.analyzer.market_trends().await {
        Ok(top_skills) => Json(MarketTrendsResponse {
            top_skills,
            notice: None,
        }),
        Err(e) => {
            warn!("Market trends unavailable: {e}");
            Json(MarketTrendsResponse {
                top_skills: Vec::new(),
                notice: Some(TRENDS_FAILED_NOTICE.to_string()),
            })
        }
    }
}
