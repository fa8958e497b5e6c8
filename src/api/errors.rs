use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::errors::{DomainError, FieldError};

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    code: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<FieldError>,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    BadRequest(String),
    NotFound { code: &'static str, detail: String },
    Conflict { code: &'static str, detail: String },
    Validation { code: &'static str, errors: Vec<FieldError> },
    TooManyRequests(&'static str),
    ServiceUnavailable(String),
    Internal { code: &'static str, detail: String },
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal { code: "internal_error", detail: context.to_string() }
    }

    pub(crate) fn not_found(detail: impl Into<String>) -> Self {
        Self::NotFound { code: "not_found", detail: detail.into() }
    }

    pub(crate) fn conflict(detail: impl Into<String>) -> Self {
        Self::Conflict { code: "conflict", detail: detail.into() }
    }

    pub(crate) fn field(field: &str, message: &str) -> Self {
        Self::Validation {
            code: "validation_failed",
            errors: vec![FieldError::new(field, message)],
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let code = err.code();
        match err {
            DomainError::InvalidScope { .. } | DomainError::NotFound(_) => {
                ApiError::NotFound { code, detail: err.to_string() }
            }
            DomainError::UnknownContentType(tag) => ApiError::Validation {
                code,
                errors: vec![FieldError::new("kind", format!("unknown content type '{tag}'"))],
            },
            DomainError::Validation(errors) => ApiError::Validation { code, errors },
            DomainError::NotAnswerable(_) => ApiError::BadRequest(err.to_string()),
            DomainError::DuplicateSubmission | DomainError::DuplicateReview => {
                ApiError::Conflict { code, detail: err.to_string() }
            }
            DomainError::DanglingReference { .. } => {
                tracing::error!(error = %err, "Content registry consistency fault");
                ApiError::Internal { code, detail: "Content is unavailable".to_string() }
            }
            DomainError::Storage(message) => {
                tracing::error!(error = %message, "Blob storage failure");
                ApiError::ServiceUnavailable("File storage is unavailable".to_string())
            }
            DomainError::Internal(message) => ApiError::internal(message, "Internal error"),
            DomainError::Database(source) => ApiError::internal(source, "Database error"),
        }
    }
}

fn body(status: StatusCode, code: &'static str, detail: String, errors: Vec<FieldError>) -> Response {
    (status, Json(ErrorResponse { status: status.as_u16(), code, detail, errors })).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(message) => {
                let mut response = body(
                    StatusCode::UNAUTHORIZED,
                    "unauthorized",
                    message.to_string(),
                    Vec::new(),
                );
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            ApiError::Forbidden(message) => {
                body(StatusCode::FORBIDDEN, "forbidden", message.to_string(), Vec::new())
            }
            ApiError::BadRequest(message) => {
                body(StatusCode::BAD_REQUEST, "bad_request", message, Vec::new())
            }
            ApiError::NotFound { code, detail } => {
                body(StatusCode::NOT_FOUND, code, detail, Vec::new())
            }
            ApiError::Conflict { code, detail } => {
                body(StatusCode::CONFLICT, code, detail, Vec::new())
            }
            ApiError::Validation { code, errors } => body(
                StatusCode::UNPROCESSABLE_ENTITY,
                code,
                "Request validation failed".to_string(),
                errors,
            ),
            ApiError::TooManyRequests(message) => {
                body(StatusCode::TOO_MANY_REQUESTS, "rate_limited", message.to_string(), Vec::new())
            }
            ApiError::ServiceUnavailable(message) => {
                tracing::error!(error = %message, "Service unavailable");
                body(StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", message, Vec::new())
            }
            ApiError::Internal { code, detail } => {
                tracing::error!(error = %detail, "Internal server error");
                body(StatusCode::INTERNAL_SERVER_ERROR, code, detail, Vec::new())
            }
        }
    }
}
