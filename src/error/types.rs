//! Core error types.

use thiserror::Error;

/// Coarse classification used for presentation and retry decisions made by
/// callers. This layer never retries on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 4xx responses from the backend (except 429).
    Client,
    /// 5xx responses from the backend.
    Server,
    /// 429 responses.
    RateLimit,
    /// Connection level failures.
    Network,
    /// Response bodies that could not be decoded.
    Parsing,
    /// Invalid configuration or caller input.
    Validation,
    /// The caller cancelled the exchange.
    Cancelled,
}

/// Errors surfaced by the adapter.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// The backend answered with a non-success status code.
    #[error("Transport error {status}: {body}")]
    TransportError { status: u16, body: String },

    /// The request never produced a response (connect, TLS, body read).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// A batch response body was not valid JSON.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Serialization of the outgoing request failed.
    #[error("JSON error: {0}")]
    JsonError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The caller's cancellation token fired before the exchange finished.
    #[error("Request cancelled")]
    Cancelled,
}

impl LlmError {
    /// HTTP status code carried by the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::TransportError { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TransportError { status: 429, .. } => ErrorCategory::RateLimit,
            Self::TransportError { status, .. } if *status >= 500 => ErrorCategory::Server,
            Self::TransportError { .. } => ErrorCategory::Client,
            Self::HttpError(_) => ErrorCategory::Network,
            Self::ParseError(_) | Self::JsonError(_) => ErrorCategory::Parsing,
            Self::ConfigurationError(_) | Self::InvalidInput(_) => ErrorCategory::Validation,
            Self::Cancelled => ErrorCategory::Cancelled,
        }
    }

    /// Whether a caller-side retry has a chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Server | ErrorCategory::RateLimit | ErrorCategory::Network
        )
    }

    pub(crate) fn transport(status: u16, body: impl Into<String>) -> Self {
        Self::TransportError {
            status,
            body: body.into(),
        }
    }
}
