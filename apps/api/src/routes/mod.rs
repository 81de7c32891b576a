pub mod feedback;
pub mod health;
pub mod insights;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::history::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Sessions
        .route("/api/v1/sessions", post(handlers::handle_login))
        .route("/api/v1/sessions/:uid", delete(handlers::handle_logout))
        // Analyses
        .route("/api/v1/analyses", post(handlers::handle_submit_analysis))
        // History
        .route(
            "/api/v1/history",
            get(handlers::handle_list_history).delete(handlers::handle_clear_history),
        )
        .route("/api/v1/history/:id", delete(handlers::handle_delete_item))
        .route("/api/v1/dashboard", get(handlers::handle_dashboard))
        // Analysis service passthroughs
        .route("/api/v1/optimizations", post(insights::handle_optimize))
        .route("/api/v1/market-trends", get(insights::handle_market_trends))
        // Feedback
        .route("/api/v1/feedback", post(feedback::handle_submit_feedback))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::analyzer_client::{
        AnalysisService, AnalyzerError, OptimizeRequest, ResumeUpload, TrendingSkill,
    };
    use crate::history::SessionRegistry;
    use crate::store::{DocumentStore, MemoryDocumentStore};

    /// Analysis is not exercised here; optimize echoes its input and trends can be taken down.
    struct StubAnalyzer {
        trends_down: bool,
    }

    #[async_trait]
    impl AnalysisService for StubAnalyzer {
        async fn analyze(&self, _: &ResumeUpload, _: &str) -> Result<Value, AnalyzerError> {
            Err(AnalyzerError::Rejected("not wired in route tests".to_string()))
        }

        async fn optimize(&self, request: &OptimizeRequest) -> Result<String, AnalyzerError> {
            Ok(format!(
                "## Summary\n{} (covers {})",
                request.resume_text,
                request.missing_skills.join(", ")
            ))
        }

        async fn market_trends(&self) -> Result<Vec<TrendingSkill>, AnalyzerError> {
            if self.trends_down {
                return Err(AnalyzerError::RetriesExhausted { attempts: 3 });
            }
            Ok(vec![TrendingSkill {
                skill: "Python".to_string(),
                rank: 1,
            }])
        }
    }

    async fn seeded_state() -> (AppState, Arc<MemoryDocumentStore>) {
        let store = Arc::new(MemoryDocumentStore::new());
        for (score, file, jd, skills) in [
            (80, "a.pdf", "Python developer", "SQL(3yrs), Go"),
            (40, "b.pdf", "Java engineer", "SQL"),
            (60, "c.pdf", "Data analyst", "Docker"),
        ] {
            store
                .insert_history(
                    "alice",
                    &json!({
                        "skill_match": score,
                        "resume_filename": file,
                        "job_description": jd,
                        "missing_skills": skills,
                    }),
                )
                .await
                .unwrap();
        }
        let state = AppState {
            store: store.clone(),
            analyzer: Arc::new(StubAnalyzer { trends_down: false }),
            sessions: Arc::new(SessionRegistry::new()),
        };
        (state, store)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn login(app: &Router) -> Value {
        let (status, body) = send(app, "POST", "/api/v1/sessions", Some(json!({"uid": "alice"}))).await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _) = seeded_state().await;
        let (status, body) = send(&build_router(state), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_history_requires_session() {
        let (state, _) = seeded_state().await;
        let (status, body) = send(&build_router(state), "GET", "/api/v1/history?uid=alice", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "NO_SESSION");
    }

    #[tokio::test]
    async fn test_login_then_filtered_history() {
        let (state, _) = seeded_state().await;
        let app = build_router(state);
        let body = login(&app).await;
        assert_eq!(body["records"], 3);

        let (status, body) = send(
            &app,
            "GET",
            "/api/v1/history?uid=alice&bucket=all&sort=skill_match",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let scores: Vec<f64> = body["records"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["skill_match"].as_f64().unwrap())
            .collect();
        assert_eq!(scores, vec![80.0, 60.0, 40.0]);
        assert_eq!(body["records"][0]["bucket"], "excellent");

        let (_, body) = send(&app, "GET", "/api/v1/history?uid=alice&search=PYTHON", None).await;
        assert_eq!(body["after_search"], 1);
        assert_eq!(body["records"][0]["resume_filename"], "a.pdf");
    }

    #[tokio::test]
    async fn test_dashboard_summary() {
        let (state, _) = seeded_state().await;
        let app = build_router(state);
        login(&app).await;

        let (status, body) = send(&app, "GET", "/api/v1/dashboard?uid=alice", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);
        assert_eq!(body["top_missing_skills"][0], json!({"skill": "SQL", "count": 2}));
        // Oldest first: inserted order was 80, 40, 60.
        let series: Vec<f64> = body["score_series"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["score"].as_f64().unwrap())
            .collect();
        assert_eq!(series, vec![80.0, 40.0, 60.0]);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let (state, store) = seeded_state().await;
        let app = build_router(state);
        login(&app).await;

        let (_, body) = send(&app, "GET", "/api/v1/history?uid=alice", None).await;
        let id = body["records"][0]["id"].as_str().unwrap().to_string();

        let (status, _) = send(&app, "DELETE", &format!("/api/v1/history/{id}?uid=alice"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, body) = send(&app, "GET", "/api/v1/history?uid=alice", None).await;
        assert_eq!(body["total"], 2);

        let (status, _) = send(&app, "DELETE", &format!("/api/v1/history/{id}?uid=alice"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, "DELETE", "/api/v1/history?uid=alice", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], 2);
        assert!(store.fetch_history("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_delete_leaves_session_unchanged() {
        let (state, store) = seeded_state().await;
        let app = build_router(state);
        login(&app).await;
        let (_, body) = send(&app, "GET", "/api/v1/history?uid=alice", None).await;
        let id = body["records"][0]["id"].as_str().unwrap().to_string();

        store.set_unavailable(true);
        let (status, _) = send(&app, "DELETE", &format!("/api/v1/history/{id}?uid=alice"), None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let (_, body) = send(&app, "GET", "/api/v1/history?uid=alice", None).await;
        assert_eq!(body["total"], 3);
    }

    #[tokio::test]
    async fn test_login_with_store_down_returns_notice() {
        let (state, store) = seeded_state().await;
        store.set_unavailable(true);
        let body = login(&build_router(state)).await;
        assert_eq!(body["records"], 0);
        assert_eq!(body["notice"], "Could not fetch cloud history.");
    }

    #[tokio::test]
    async fn test_logout_discards_session() {
        let (state, _) = seeded_state().await;
        let app = build_router(state);
        login(&app).await;
        let (status, _) = send(&app, "DELETE", "/api/v1/sessions/alice", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "GET", "/api/v1/dashboard?uid=alice", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_feedback_validation_and_persist() {
        let (state, store) = seeded_state().await;
        let app = build_router(state);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/feedback",
            Some(json!({"uid": "alice", "kind": "bug", "rating": 3, "text": "short"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/feedback",
            Some(json!({
                "uid": "alice",
                "kind": "rating",
                "rating": 5,
                "text": "History search works nicely"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(store.feedback_count().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_query_value_gets_json_error() {
        let (state, _) = seeded_state().await;
        let app = build_router(state);
        login(&app).await;
        let (status, body) = send(&app, "GET", "/api/v1/history?uid=alice&bucket=great", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, body) = send(&app, "GET", "/api/v1/dashboard", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_optimize_forwards_request() {
        let (state, _) = seeded_state().await;
        let app = build_router(state);
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/optimizations",
            Some(json!({
                "resume_text": "Built APIs",
                "job_description": "Backend engineer",
                "missing_skills": ["Docker", "SQL"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["optimized_text"], "## Summary\nBuilt APIs (covers Docker, SQL)");

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/optimizations",
            Some(json!({"resume_text": "  ", "job_description": "Backend engineer"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_market_trends() {
        let (state, _) = seeded_state().await;
        let (status, body) = send(&build_router(state), "GET", "/api/v1/market-trends", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["top_skills"], json!([{"skill": "Python", "rank": 1}]));
        assert!(body.get("notice").is_none());
    }

    #[tokio::test]
    async fn test_market_trends_down_returns_notice() {
        let (mut state, _) = seeded_state().await;
        state.analyzer = Arc::new(StubAnalyzer { trends_down: true });
        let (status, body) = send(&build_router(state), "GET", "/api/v1/market-trends", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["top_skills"], json!([]));
        assert_eq!(body["notice"], "Could not load market trends.");
    }
}
