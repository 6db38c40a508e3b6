//! Typed errors and HTTP mapping.

use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("duplicate {kind}: {name}")]
    Duplicate { kind: &'static str, name: String },
    #[error("invalid field {resource}.{field}: {reason}")]
    InvalidField {
        resource: String,
        field: String,
        reason: String,
    },
    #[error("config load: {0}")]
    Load(String),
    #[error("settings: {0}")]
    Settings(String),
}

/// One rejected field: the first failing field of a payload, or the field whose value collides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    InvalidId(String),
    #[error("{0}")]
    Validation(FieldError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    DuplicateKey(FieldError),
    #[error("unknown resource: {0}")]
    UnknownResource(String),
    #[error("{0}")]
    InvalidBody(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Machine-readable code returned to clients; `None` for internal failures.
    pub fn code(&self) -> Option<&str> {
        match self {
            AppError::InvalidId(_) => Some("INVALID_ID"),
            AppError::Validation(e) | AppError::DuplicateKey(e) => Some(e.code.as_str()),
            AppError::NotFound(_) => Some("NOT_FOUND"),
            AppError::UnknownResource(_) => Some("UNKNOWN_RESOURCE"),
            AppError::InvalidBody(_) => Some("INVALID_BODY"),
            AppError::PayloadTooLarge(_) => Some("PAYLOAD_TOO_LARGE"),
            AppError::Config(_) | AppError::Db(_) | AppError::Internal(_) => None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidId(_)
            | AppError::Validation(_)
            | AppError::DuplicateKey(_)
            | AppError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::UnknownResource(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Config(_) | AppError::Db(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Body extraction failures: over-limit bodies map to 413, anything else to `INVALID_BODY`.
impl From<BytesRejection> for AppError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge("Request body exceeds the size limit".into())
        } else {
            AppError::InvalidBody(rejection.body_text())
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self.code() {
            Some(code) => {
                tracing::debug!(code, error = %self, "request rejected");
                ErrorBody {
                    error: self.to_string(),
                    code: Some(code.to_string()),
                }
            }
            None => {
                tracing::error!(error = ?self, "internal error");
                ErrorBody {
                    error: format!("Internal server error: {}", self),
                    code: None,
                }
            }
        };
        (status, Json(body)).into_response()
    }
}
