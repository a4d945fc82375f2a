use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::models::{Envelope, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("malformed request: {0}")]
    BadRequest(String),

    #[error("booking not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::StoreUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Attaches the operation-level message shown to the client.
    pub fn context(self, message: &'static str) -> ApiError {
        ApiError {
            message,
            source: self,
        }
    }
}

/// An [`AppError`] rendered as a failure envelope.
#[derive(Debug)]
pub struct ApiError {
    pub message: &'static str,
    pub source: AppError,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.source.status_code();

        let body = match &self.source {
            AppError::NotFound(_) => Envelope::failure("Booking not found", None),
            AppError::Validation(e) => {
                tracing::warn!(error = %e, "{}", self.message);
                Envelope::failure(self.message, Some(e.to_string()))
            }
            AppError::BadRequest(e) => {
                tracing::warn!(error = %e, "{}", self.message);
                Envelope::failure(self.message, Some(self.source.to_string()))
            }
            AppError::Database(_) | AppError::StoreUnavailable(_) => {
                tracing::error!(error = %self.source, "{}", self.message);
                Envelope::failure(self.message, Some(self.source.to_string()))
            }
        };

        (status, Json(body)).into_response()
    }
}
