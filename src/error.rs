//! Error types for the portal client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("token store error: {0}")]
    TokenStore(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PortalError {
    /// Failures that say nothing about the validity of the request itself.
    pub fn is_transient(&self) -> bool {
        matches!(self, PortalError::Network(_) | PortalError::Server { .. })
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PortalError::Decode(err.to_string())
        } else {
            PortalError::Network(err.to_string())
        }
    }
}

impl From<std::io::Error> for PortalError {
    fn from(err: std::io::Error) -> Self {
        PortalError::TokenStore(err.to_string())
    }
}

pub type PortalResult<T> = Result<T, PortalError>;
