/// Analyzer Client — the single point of entry for calls to the external analysis service.
///
/// The service takes a resume file plus a job description and returns a raw analysis
/// payload of loosely defined shape. Nothing here interprets that payload beyond
/// detecting an explicit `{"error": ...}` body; shaping is the normalizer's job.
/// The same service also rewrites resume text against a job description and publishes
/// a ranked list of in-demand skills.
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

const ANALYZE_PATH: &str = "/analyze_resume/";
const OPTIMIZE_PATH: &str = "/optimize_resume/";
const TRENDS_PATH: &str = "/market_trends";
const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Analysis rejected: {0}")]
    Rejected(String),

    #[error("Unexpected response: {0}")]
    Parse(String),

    #[error("Analyzer unreachable after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

/// Uploaded resume forwarded to the analysis service.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Input for a resume rewrite. `resume_text` is the text the analyzer extracted earlier.
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizeRequest {
    pub resume_text: String,
    pub job_description: String,
    #[serde(default)]
    pub missing_skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingSkill {
    pub skill: String,
    pub rank: u32,
}

#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(
        &self,
        resume: &ResumeUpload,
        job_description: &str,
    ) -> Result<Value, AnalyzerError>;

    /// Returns the rewritten resume sections as markdown.
    async fn optimize(&self, request: &OptimizeRequest) -> Result<String, AnalyzerError>;

    async fn market_trends(&self) -> Result<Vec<TrendingSkill>, AnalyzerError>;
}

#[derive(Clone)]
pub struct HttpAnalysisService {
    client: Client,
    base_url: String,
}

impl HttpAnalysisService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AnalyzerError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn form(resume: &ResumeUpload, job_description: &str) -> Form {
        let file = Part::bytes(resume.bytes.to_vec()).file_name(resume.file_name.clone());
        Form::new()
            .text("job_description", job_description.to_string())
            .part("file", file)
    }

    fn optimize_form(request: &OptimizeRequest) -> Form {
        Form::new()
            .text("resume_text", request.resume_text.clone())
            .text("job_description", request.job_description.clone())
            .text("missing_skills", request.missing_skills.join(", "))
    }

    /// Retries on 429, 5xx, and transport errors with exponential backoff.
    /// `build` is called once per attempt since multipart bodies are consumed on send.
    async fn send_with_retry<F>(&self, label: &str, build: F) -> Result<Value, AnalyzerError>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut last_error: Option<AnalyzerError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Analyzer {label} attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match build().send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(AnalyzerError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Analyzer {label} returned {}: {}", status, body);
                last_error = Some(AnalyzerError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<Value>(&body)
                    .ok()
                    .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
                    .unwrap_or(body);
                return Err(AnalyzerError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let payload: Value = response.json().await?;
            debug!("Analyzer {label} call succeeded");
            return check_payload(payload);
        }

        Err(last_error.unwrap_or(AnalyzerError::RetriesExhausted {
            attempts: MAX_ATTEMPTS,
        }))
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    async fn analyze(
        &self,
        resume: &ResumeUpload,
        job_description: &str,
    ) -> Result<Value, AnalyzerError> {
        let url = self.url(ANALYZE_PATH);
        debug!("Analyzing {}", resume.file_name);
        self.send_with_retry("analyze", || {
            self.client
                .post(&url)
                .multipart(Self::form(resume, job_description))
        })
        .await
    }

    async fn optimize(&self, request: &OptimizeRequest) -> Result<String, AnalyzerError> {
        let url = self.url(OPTIMIZE_PATH);
        let payload = self
            .send_with_retry("optimize", || {
                self.client.post(&url).multipart(Self::optimize_form(request))
            })
            .await?;
        optimized_text(&payload)
    }

    async fn market_trends(&self) -> Result<Vec<TrendingSkill>, AnalyzerError> {
        let url = self.url(TRENDS_PATH);
        let payload = self
            .send_with_retry("market trends", || self.client.get(&url))
            .await?;
        top_skills(&payload)
    }
}

/// The service reports analysis failures as a 200 with an `error` field.
fn check_payload(payload: Value) -> Result<Value, AnalyzerError> {
    if let Some(message) = payload.get("error").and_then(Value::as_str) {
        return Err(AnalyzerError::Rejected(message.to_string()));
    }
    if !payload.is_object() {
        return Err(AnalyzerError::Parse(
            "expected a JSON object from the analysis service".to_string(),
        ));
    }
    Ok(payload)
}

fn optimized_text(payload: &Value) -> Result<String, AnalyzerError> {
    payload
        .get("optimized_text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AnalyzerError::Parse("missing optimized_text".to_string()))
}

/// A missing `top_skills` list means no trends are published yet.
fn top_skills(payload: &Value) -> Result<Vec<TrendingSkill>, AnalyzerError> {
    match payload.get("top_skills") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(list) => serde_json::from_value(list.clone())
            .map_err(|e| AnalyzerError::Parse(format!("invalid top_skills: {e}"))),
    }
}
