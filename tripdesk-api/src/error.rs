use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tripdesk_admin::ExportError;
use tripdesk_core::{CoreError, ValidationErrors};

use crate::auth::AuthError;

#[derive(Debug)]
pub enum AppError {
    ValidationError { message: String, fields: Option<ValidationErrors> },
    AuthenticationError(String),
    NotFoundError(String),
    TooManyRequests,
    /// Failure whose detail is logged while the client only sees `public`.
    OperationFailed { public: &'static str, detail: String },
    InternalServerError(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError { message: message.into(), fields: None }
    }

    pub fn invalid_fields(message: impl Into<String>, fields: ValidationErrors) -> Self {
        AppError::ValidationError { message: message.into(), fields: Some(fields) }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, fields) = match self {
            AppError::ValidationError { message, fields } => (StatusCode::BAD_REQUEST, message, fields),
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many login attempts, try again later".to_string(),
                None,
            ),
            AppError::OperationFailed { public, detail } => {
                tracing::error!("{}: {}", public, detail);
                (StatusCode::INTERNAL_SERVER_ERROR, public.to_string(), None)
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string(), None)
            }
        };

        let body = match fields {
            Some(fields) => json!({ "error": error_message, "fields": fields }),
            None => json!({ "error": error_message }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationFailed(fields) => AppError::invalid_fields("Invalid booking data", fields),
            CoreError::NotFound(id) => AppError::NotFoundError(format!("Booking {} not found", id)),
            CoreError::Persistence(detail) => AppError::InternalServerError(detail),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials(fields) => {
                AppError::invalid_fields("Email and password are required", fields)
            }
            AuthError::InvalidCredentials => AppError::AuthenticationError("Invalid credentials".into()),
            AuthError::InvalidToken => AppError::AuthenticationError("Invalid or expired token".into()),
            AuthError::Store(e) => e.into(),
            other => AppError::InternalServerError(other.to_string()),
        }
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        AppError::OperationFailed { public: "Export failed", detail: err.to_string() }
    }
}
