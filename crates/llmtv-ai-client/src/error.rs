//! AI client error types.

use reqwest::StatusCode;
use thiserror::Error;

pub type AiResult<T> = Result<T, AiError>;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported model provider: {0}")]
    UnsupportedProvider(String),

    #[error("Service returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AiError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    pub fn generation_failed(message: impl Into<String>) -> Self {
        Self::GenerationFailed(message.into())
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    pub fn from_status(status: StatusCode, body: impl Into<String>) -> Self {
        Self::Http {
            status: status.as_u16(),
            body: body.into(),
        }
    }

    /// HTTP status of the failed call, if the service answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            AiError::Http { status, .. } => Some(*status),
            AiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether retrying the same call may succeed.
    ///
    /// Timeouts, transport failures, rate limiting (429) and server errors
    /// (5xx) are transient. IO errors count only when their kind points at a
    /// dropped or interrupted connection. Everything else fails immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            AiError::Timeout(_) => true,
            AiError::Http { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            AiError::Network(e) => {
                if let Some(status) = e.status() {
                    let code = status.as_u16();
                    return code == 408 || code == 429 || code >= 500;
                }
                e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
            }
            AiError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}
