//! # Centralized Error Handling
//!
//! This module defines the application-wide error type [`AppError`] used consistently
//! across all backend modules. It follows the `thiserror` pattern for ergonomic error handling.
//!
//! ## Error Categories
//!
//! 1. **Client Errors** (4xx) - User/input issues
//!    - [`InvalidInput`](AppError::InvalidInput) → 400 Bad Request
//!    - [`Auth`](AppError::Auth) → 401 Unauthorized (code depends on [`AuthFailure`])
//!    - [`NotFound`](AppError::NotFound) → 404 Not Found
//!    - [`Conflict`](AppError::Conflict) → 409 Conflict
//!
//! 2. **Server Errors** (5xx) - Internal/system issues
//!    - [`Config`](AppError::Config) → 500 Internal Server Error
//!    - [`Upstream`](AppError::Upstream) → 502 Bad Gateway (LLM service, PDF sidecar)
//!    - [`Internal`](AppError::Internal) → 500 Internal Server Error
//!    - [`Encoding`](AppError::Encoding) / [`Decoding`](AppError::Decoding) → 500
//!
//! ## Wire Format
//!
//! Every error renders as:
//!
//! ```text
//! { "ok": false, "error": "Invalid email", "code": "INVALID_INPUT" }
//! ```
//!
//! ## Error Conversion
//!
//! - `From<anyhow::Error>` - Convert anyhow errors to AppError
//! - `From<sqlx::Error>` - Convert database errors to AppError
//! - `From<serde_json::Error>` - Convert JSON errors to AppError

use crate::dto::ErrorResponse;
use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use thiserror::Error;

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Why a request could not be authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No session cookie on a protected route
    MissingToken,
    /// Cookie present but the JWT failed verification
    InvalidToken,
    /// Token is valid but its user no longer exists
    UserNotFound,
    /// Token is valid but the account was deleted
    UserInactive,
    /// Login with unknown username or wrong password
    InvalidCredentials,
    /// Login to a deleted account
    InactiveLogin,
    /// Wrong current password on password change
    WrongPassword,
}

impl AuthFailure {
    /// Machine-readable code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            AuthFailure::MissingToken => "UNAUTHORIZED",
            AuthFailure::InvalidToken => "INVALID_TOKEN",
            AuthFailure::UserNotFound => "USER_NOT_FOUND",
            AuthFailure::UserInactive => "USER_INACTIVE",
            AuthFailure::InvalidCredentials => "LOGIN_INVALID_CREDENTIALS",
            AuthFailure::InactiveLogin => "LOGIN_INACTIVE_USER",
            AuthFailure::WrongPassword => "INVALID_PASSWORD",
        }
    }

    /// Message sent to clients.
    pub fn message(&self) -> &'static str {
        match self {
            AuthFailure::MissingToken => "User not authenticated",
            AuthFailure::InvalidToken => "Invalid or expired token",
            AuthFailure::UserNotFound => "User not found",
            AuthFailure::UserInactive => "User account is inactive",
            AuthFailure::InvalidCredentials => "Invalid username or password",
            AuthFailure::InactiveLogin => "This account has been deactivated",
            AuthFailure::WrongPassword => "Current password is incorrect",
        }
    }
}

/// Application-wide error type covering all error scenarios.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error during startup or a missing setting at request time.
    ///
    /// **HTTP Status**: 500 Internal Server Error
    #[error("Configuration error: {0}")]
    Config(String),

    /// External service error (LLM API, PDF sidecar process).
    ///
    /// **HTTP Status**: 502 Bad Gateway
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Authentication failure.
    ///
    /// **HTTP Status**: 401 Unauthorized
    #[error("Authentication failed: {}", .0.code())]
    Auth(AuthFailure),

    /// Invalid user input validation error.
    ///
    /// **HTTP Status**: 400 Bad Request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Uniqueness or state conflict (duplicate account, questions already answered).
    ///
    /// **HTTP Status**: 409 Conflict
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Requested resource not found.
    ///
    /// **HTTP Status**: 404 Not Found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Data encoding error (JSON serialization, CSV output).
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Data decoding error (malformed model output, sidecar output).
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// Internal server error (unexpected failures).
    ///
    /// **HTTP Status**: 500 Internal Server Error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Internal(_) | AppError::Encoding(_) | AppError::Decoding(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG",
            AppError::Upstream(_) => "UPSTREAM",
            AppError::Auth(failure) => failure.code(),
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::Conflict(_) => "CONFLICT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Encoding(_) => "ENCODING",
            AppError::Decoding(_) => "DECODING",
            AppError::Internal(_) => "INTERNAL",
        }
    }

    /// Get a user-friendly error message.
    ///
    /// For internal errors, returns a generic message to avoid exposing implementation details.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::Auth(failure) => failure.message().to_string(),
            AppError::Upstream(_) => "Extraction service temporarily unavailable".to_string(),
            AppError::Config(_) | AppError::Internal(_) | AppError::Encoding(_) | AppError::Decoding(_) => {
                "An internal error occurred".to_string()
            }
        }
    }
}

/// Implement Axum's `IntoResponse` for automatic error handling.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Full error goes to the server log, clients only see user_message()
        match status {
            s if s.is_client_error() => tracing::debug!("Client error: {}", self),
            s if s.is_server_error() => tracing::error!("Server error: {}", self),
            _ => tracing::warn!("Unexpected error: {}", self),
        }

        let body = Json(ErrorResponse::new(self.user_message(), self.code()));

        (status, body).into_response()
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Convert `sqlx::Error` to `AppError`.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Database record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                AppError::Internal(format!("Database error: {}", db_err.message()))
            }
            _ => AppError::Internal(format!("Database error: {}", err)),
        }
    }
}

/// Convert `serde_json::Error` to `AppError`.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decoding(format!("JSON error: {}", err))
    }
}
