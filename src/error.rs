use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// AppError
///
/// The single failure type surfaced by the core (hasher, tokens, gate, auth service,
/// validation pipeline) and rendered to HTTP by `IntoResponse`.
/// Every variant is recoverable by the caller; none of them crash the process.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("input too large")]
    InputTooLarge,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("token malformed")]
    TokenMalformed,

    #[error("token signature invalid")]
    SignatureInvalid,

    #[error("token expired")]
    TokenExpired,

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("username taken")]
    UsernameTaken,

    /// Rendered exactly like `InvalidCredentials` so usernames cannot be enumerated.
    #[error("user not found")]
    UserNotFound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("validation timeout")]
    ValidatorTimeout,

    #[error("not found")]
    NotFound,

    /// Operator-only cause; the client sees a generic message.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

/// StoreError
///
/// What the credential and entity store adapters report back to the core.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("conflict")]
    Conflict,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// ErrorBody
///
/// JSON envelope for every failed request.
#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    error: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InputTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::TokenMalformed
            | AppError::SignatureInvalid
            | AppError::TokenExpired
            | AppError::Unauthorized
            | AppError::UserNotFound
            | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::UsernameTaken => StatusCode::CONFLICT,
            AppError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ValidatorTimeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The text a client is allowed to see.
    pub fn public_message(&self) -> String {
        match self {
            AppError::UserNotFound | AppError::InvalidCredentials => {
                "invalid credentials".to_string()
            }
            AppError::TokenMalformed | AppError::SignatureInvalid | AppError::TokenExpired => {
                "unauthorized".to_string()
            }
            AppError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Internal(cause) => tracing::error!(cause = %cause, "request failed"),
            AppError::UserNotFound | AppError::InvalidCredentials => {
                tracing::warn!("rejected login attempt")
            }
            other => tracing::debug!(error = %other, "request rejected"),
        }

        let body = ErrorBody {
            status: "error",
            error: self.public_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
