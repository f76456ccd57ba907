//! Checkout Error Types

use thiserror::Error;

use crate::workflow::Phase;

/// Result type alias
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Checkout-related errors
#[derive(Error, Debug)]
pub enum CheckoutError {
    /// Transport-level failure (DNS, connect, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Payment service answered with a non-success status
    #[error("{endpoint} returned HTTP {status}")]
    Http { endpoint: String, status: u16 },

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Plan price is not a usable amount
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    /// No plan with that name in the catalogue
    #[error("Unknown plan: {0}")]
    UnknownPlan(String),

    /// Operation needs a selected plan
    #[error("No plan selected")]
    NoPlanSelected,

    /// Operation is not allowed in the current phase
    #[error("Cannot {operation} while checkout is in {phase} phase")]
    InvalidTransition {
        phase: Phase,
        operation: &'static str,
    },

    /// Payment went through but the license call failed
    #[error("License issuance failed: {0}")]
    LicenseIssuance(String),

    /// Clipboard write failed
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// Poll task ended without a terminal status
    #[error("Status poller stopped unexpectedly")]
    PollerStopped,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CheckoutError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            CheckoutError::Network(_) => true,
            CheckoutError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            CheckoutError::Network(_) | CheckoutError::Http { .. } | CheckoutError::Decode(_) => {
                "Failed to create session".into()
            }
            CheckoutError::InvalidPrice(price) => format!("Plan price '{price}' is not valid."),
            CheckoutError::UnknownPlan(name) => format!("There is no plan called '{name}'."),
            CheckoutError::LicenseIssuance(_) => crate::workflow::LICENSE_FAILURE_MESSAGE.into(),
            CheckoutError::Clipboard(_) => "Failed to copy.".into(),
            _ => "Could not initialize payment.".into(),
        }
    }
}

impl From<reqwest::Error> for CheckoutError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CheckoutError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            CheckoutError::Http {
                endpoint: err.url().map(|u| u.path().to_string()).unwrap_or_default(),
                status: status.as_u16(),
            }
        } else {
            CheckoutError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(CheckoutError::Network("reset".into()).is_retryable());
        assert!(
            CheckoutError::Http { endpoint: "/x".into(), status: 503 }.is_retryable()
        );
        assert!(
            !CheckoutError::Http { endpoint: "/x".into(), status: 400 }.is_retryable()
        );
        assert!(!CheckoutError::NoPlanSelected.is_retryable());
    }

    #[test]
    fn test_creation_failures_share_one_message() {
        let http = CheckoutError::Http { endpoint: "/api/v1/payments/sessions".into(), status: 500 };
        assert_eq!(http.user_message(), "Failed to create session");
        assert_eq!(
            CheckoutError::Network("timeout".into()).user_message(),
            "Failed to create session"
        );
    }
}
