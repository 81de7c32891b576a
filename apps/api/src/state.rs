use std::sync::Arc;

use crate::analyzer_client::AnalysisService;
use crate::history::SessionRegistry;
use crate::store::DocumentStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// External document store holding history rows and feedback.
    pub store: Arc<dyn DocumentStore>,
    /// External analysis service. Default: HttpAnalysisService against ANALYZER_URL.
    pub analyzer: Arc<dyn AnalysisService>,
    pub sessions: Arc<SessionRegistry>,
}
