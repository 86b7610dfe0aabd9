use axum::{
    Json,
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type AppResult<T> = Result<T, AppError>;

/// Logical failure kinds, independent of how they are sent over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidFormat,
    StorageFailure,
    PermissionDenied,
    MissingRequiredMetadata,
    DuplicateMetadata,
    InvalidArgument,
    Internal,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::InvalidFormat => "INVALID_FORMAT",
            ErrorKind::StorageFailure => "STORAGE_FAILURE",
            ErrorKind::PermissionDenied => "PERMISSION_DENIED",
            ErrorKind::MissingRequiredMetadata => "MISSING_REQUIRED_METADATA",
            ErrorKind::DuplicateMetadata => "DUPLICATE_METADATA",
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::Internal => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidFormat
            | ErrorKind::MissingRequiredMetadata
            | ErrorKind::DuplicateMetadata
            | ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorKind::StorageFailure | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error type shared by the transfer, admission and archive layers.
///
/// The `Display` text of every variant is safe to hand to a caller. Backend
/// causes ride along as `source` and only ever reach the logs.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("file not found")]
    NotFound(#[source] Option<BoxError>),

    #[error("invalid file format")]
    InvalidFormat(#[source] Option<BoxError>),

    #[error("internal storage error")]
    StorageFailure(#[source] Option<BoxError>),

    #[error("permission denied")]
    PermissionDenied(#[source] Option<BoxError>),

    #[error("{field} is required in the first frame")]
    MissingRequiredMetadata { field: &'static str },

    #[error("{field} must only be provided in the first frame")]
    DuplicateMetadata { field: &'static str },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("internal server error")]
    Internal(#[source] Option<BoxError>),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::InvalidFormat(_) => ErrorKind::InvalidFormat,
            AppError::StorageFailure(_) => ErrorKind::StorageFailure,
            AppError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            AppError::MissingRequiredMetadata { .. } => ErrorKind::MissingRequiredMetadata,
            AppError::DuplicateMetadata { .. } => ErrorKind::DuplicateMetadata,
            AppError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn not_found() -> Self {
        AppError::NotFound(None)
    }

    /// Wraps a backend failure that has no more specific classification.
    pub fn storage<E: Into<BoxError>>(cause: E) -> Self {
        AppError::StorageFailure(Some(cause.into()))
    }

    pub fn internal<E: Into<BoxError>>(cause: E) -> Self {
        AppError::Internal(Some(cause.into()))
    }

    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        AppError::InvalidArgument(message.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(Some(err.into()))
    }
}

// Extractor rejections only describe the caller's own input.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidArgument(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::InvalidArgument(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidArgument(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let message = self.to_string();

        match std::error::Error::source(&self) {
            Some(cause) if kind.status().is_server_error() => {
                tracing::error!(code = kind.code(), "{}: {:?}", message, cause)
            }
            Some(cause) => tracing::warn!(code = kind.code(), "{}: {}", message, cause),
            None if kind.status().is_server_error() => {
                tracing::error!(code = kind.code(), "{}", message)
            }
            None => tracing::debug!(code = kind.code(), "{}", message),
        }

        let body = Json(json!({
            "error": message,
            "code": kind.code(),
        }));

        (kind.status(), body).into_response()
    }
}
