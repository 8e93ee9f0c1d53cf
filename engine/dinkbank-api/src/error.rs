//! Error types for the DinkBank API

use crate::submissions::ValidationErrors;
use earnings_engine::EngineError;
use thiserror::Error;

/// Errors that can occur while serving a request
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Submission rejected: {0}")]
    SpamDetected(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Engine error: {0}")]
    Engine(EngineError),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::PlayerNotFound(slug) => ApiError::NotFound(format!("player '{slug}'")),
            EngineError::UnknownTier(_)
            | EngineError::UnknownEventType(_)
            | EngineError::MissingEventType(_)
            | EngineError::UnknownTour(_)
            | EngineError::UnknownTimeframe(_)
            | EngineError::UnknownGender(_) => ApiError::BadRequest(err.to_string()),
            other => ApiError::Engine(other),
        }
    }
}

impl ApiError {
    /// HTTP status for this error
    pub fn status_code(&self) -> warp::http::StatusCode {
        use warp::http::StatusCode;
        match self {
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::SpamDetected(_) | ApiError::Validation(_) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::RateLimited { .. } => "RATE_LIMITED",
            ApiError::SpamDetected(_) => "SUBMISSION_REJECTED",
            ApiError::Validation(_) => "VALIDATION_FAILED",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Engine(_) => "ENGINE_ERROR",
        }
    }
}

impl warp::reject::Reject for ApiError {}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
