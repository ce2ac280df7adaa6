//! Error types for portal operations.

use crate::storage::StorageError;
use thiserror::Error;

/// Errors that can occur while talking to the portal or its local state.
#[derive(Debug, Error)]
pub enum PortalError {
    /// Network/HTTP request failed
    #[error("network error: {message}")]
    Network { message: String },

    /// Server returned a non-success status
    #[error("unexpected response: {message}")]
    UnexpectedResponse { message: String },

    /// Response body did not have the expected JSON shape
    #[error("parse error: {message}")]
    Parse { message: String },

    /// No auth token is present in the store
    #[error("no auth token in store")]
    NoToken,

    /// Local key-value store failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Base URL is not a valid URL
    #[error("invalid base url: {message}")]
    BaseUrl { message: String },
}

impl PortalError {
    /// Returns true if this error is potentially transient and the caller
    /// should retry with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PortalError::Network { .. }
                | PortalError::UnexpectedResponse { .. }
                | PortalError::Parse { .. }
        )
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(err: reqwest::Error) -> Self {
        PortalError::Network {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        PortalError::Parse {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for PortalError {
    fn from(err: url::ParseError) -> Self {
        PortalError::BaseUrl {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(PortalError::Network {
            message: "timeout".into()
        }
        .is_retryable());
        assert!(PortalError::Parse {
            message: "bad json".into()
        }
        .is_retryable());
        assert!(!PortalError::NoToken.is_retryable());
    }
}
