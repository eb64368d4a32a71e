//! Maps domain errors onto HTTP responses.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;
use sy_core::error::AppError;

/// Wrapper so `AppError` can be returned straight from handlers.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        ApiError(e)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) | AppError::NoPendingChoice => StatusCode::CONFLICT,
            AppError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self.0);
        }
        HttpResponse::build(status).json(serde_json::json!({
            "error": self.0.user_message(),
            "retryable": self.0.is_retryable(),
        }))
    }
}
