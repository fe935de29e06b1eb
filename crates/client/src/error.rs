//! Error types for the Signet client.

use thiserror::Error;

/// Errors that can occur when using the Signet client.
#[derive(Debug, Error)]
pub enum Error {
    /// Connection error (network failure, DNS resolution, etc.).
    #[error("connection error: {0}")]
    Connection(String),

    /// HTTP error with status code.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Response deserialization error.
    #[error("failed to deserialize response: {0}")]
    Deserialization(String),
}

impl Error {
    /// Returns `true` if this error is retryable (network failures, 5xx).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Http { status, .. } => *status >= 500,
            Self::Deserialization(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_error_is_retryable() {
        assert!(Error::Connection("timeout".to_string()).is_retryable());
    }

    #[test]
    fn http_4xx_is_not_retryable() {
        let err = Error::Http {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert!(!err.is_retryable());
    }
}
