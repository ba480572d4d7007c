use crate::types::UnavailableReason;
use thiserror::Error;

/// Errors returned by upstream collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("Rate limited")]
    RateLimited,

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Timed out")]
    Timeout,
}

impl FeedError {
    /// Component-level reason this failure is absorbed as.
    pub fn reason(&self) -> UnavailableReason {
        match self {
            FeedError::RateLimited => UnavailableReason::RateLimited,
            FeedError::Unavailable(_) => UnavailableReason::Failed,
            FeedError::Malformed(_) => UnavailableReason::Malformed,
            FeedError::Timeout => UnavailableReason::TimedOut,
        }
    }
}

/// Invalid configuration values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Weight for {0} must be finite and non-negative")]
    InvalidWeight(&'static str),

    #[error("At least one component weight must be positive")]
    ZeroWeights,

    #[error("Invalid {name}: {value}")]
    OutOfRange { name: &'static str, value: f64 },

    #[error("Label thresholds must satisfy 0 <= weak <= strong <= 1")]
    Thresholds,
}

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
