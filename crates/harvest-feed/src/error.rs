//! Feed Error Types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FeedError>;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{url} returned HTTP {status}")]
    Http { url: String, status: u16 },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FeedError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            FeedError::Network(_) => true,
            FeedError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Short message for display
    pub fn user_message(&self) -> &'static str {
        match self {
            FeedError::Network(_) | FeedError::Http { .. } => "Feed unavailable",
            FeedError::Decode(_) => "Feed returned unexpected data",
            FeedError::Config(_) => "Feed is not configured",
        }
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FeedError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            FeedError::Http {
                url: err.url().map(ToString::to_string).unwrap_or_default(),
                status: status.as_u16(),
            }
        } else {
            FeedError::Network(err.to_string())
        }
    }
}
