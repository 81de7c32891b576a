use serde::{Deserialize, Serialize};

use crate::errors::AppError;

const MIN_TEXT_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Bug,
    Suggestion,
    Rating,
}

impl FeedbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKind::Bug => "bug",
            FeedbackKind::Suggestion => "suggestion",
            FeedbackKind::Rating => "rating",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub uid: String,
    pub kind: FeedbackKind,
    pub rating: u8,
    pub text: String,
}

/// Feedback that passed validation and is ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
    pub uid: String,
    pub kind: FeedbackKind,
    pub rating: u8,
    pub text: String,
}

impl TryFrom<FeedbackRequest> for Feedback {
    type Error = AppError;

    fn try_from(req: FeedbackRequest) -> Result<Self, Self::Error> {
        if req.uid.trim().is_empty() {
            return Err(AppError::Validation("uid cannot be empty".to_string()));
        }
        if !(1..=5).contains(&req.rating) {
            return Err(AppError::Validation(format!(
                "rating must be between 1 and 5, got {}",
                req.rating
            )));
        }
        let text = req.text.trim();
        if text.chars().count() < MIN_TEXT_CHARS {
            return Err(AppError::Validation(format!(
                "feedback text must be at least {MIN_TEXT_CHARS} characters"
            )));
        }
        Ok(Feedback {
            uid: req.uid,
            kind: req.kind,
            rating: req.rating,
            text: text.to_string(),
        })
    }
}
