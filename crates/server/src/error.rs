use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, error};

use signet_pdf::PdfError;
use signet_state::StateError;
use signet_storage::StorageError;

/// Errors that can occur when running the Signet server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// No usable credential was presented.
    #[error("unauthorized")]
    Unauthorized,

    /// The caller is authenticated but not allowed to see this resource.
    #[error("forbidden")]
    Forbidden,

    /// The resource does not exist, or the presented token does not reach it.
    #[error("not found")]
    NotFound,

    /// The request itself is malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The uploaded document exceeds the configured size limit.
    #[error("document exceeds the {limit}-byte upload limit")]
    PayloadTooLarge { limit: usize },

    /// A state store failure.
    #[error(transparent)]
    State(#[from] StateError),

    /// A document storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A PDF pipeline failure.
    #[error(transparent)]
    Pdf(#[from] PdfError),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound
            | Self::Storage(StorageError::NotFound(_) | StorageError::InvalidPayload(_)) => {
                StatusCode::NOT_FOUND
            }
            Self::BadRequest(_)
            | Self::Pdf(
                PdfError::InvalidDocument(_) | PdfError::PasswordRequired | PdfError::WrongPassword,
            ) => StatusCode::BAD_REQUEST,
            Self::Pdf(PdfError::PageOutOfRange { .. }) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Config(_) | Self::Io(_) | Self::State(_) | Self::Storage(_) | Self::Pdf(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Denials stay opaque to callers; the distinction lives in the logs.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "request failed");
            "internal server error".to_owned()
        } else {
            debug!(status = %status, error = %self, "request rejected");
            match self {
                Self::Unauthorized => "unauthorized".to_owned(),
                Self::Forbidden => "forbidden".to_owned(),
                Self::NotFound
                | Self::Storage(StorageError::NotFound(_) | StorageError::InvalidPayload(_)) => {
                    "not found".to_owned()
                }
                other => other.to_string(),
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_401_and_403() {
        assert_eq!(ServerError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ServerError::Forbidden.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn undecodable_payload_maps_to_404() {
        let err = ServerError::Storage(StorageError::InvalidPayload("bad base64".to_owned()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn page_bounds_map_to_404() {
        let err = ServerError::Pdf(PdfError::PageOutOfRange { page: 9, count: 2 });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn password_errors_map_to_400() {
        assert_eq!(
            ServerError::Pdf(PdfError::PasswordRequired).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::Pdf(PdfError::WrongPassword).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
