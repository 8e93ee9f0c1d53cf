//! Error types for the earnings engine

use thiserror::Error;

/// Result type for earnings engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in the earnings engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Unknown contract tier: {0}")]
    UnknownTier(String),

    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    #[error("Event type required for {0} payouts")]
    MissingEventType(String),

    #[error("Unknown tour: {0}")]
    UnknownTour(String),

    #[error("Unknown timeframe: {0}")]
    UnknownTimeframe(String),

    #[error("Unknown gender: {0}")]
    UnknownGender(String),

    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("Invalid player {slug}: {reason}")]
    InvalidPlayer { slug: String, reason: String },

    #[error("Duplicate {kind}: {value}")]
    Duplicate { kind: &'static str, value: String },

    #[error("Dataset error: {0}")]
    Dataset(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Dataset(err.to_string())
    }
}
