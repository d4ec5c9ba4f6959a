//! # HTTP Request Handlers
//!
//! Axum HTTP request handlers organized by feature domain.
//!
//! ## Handler Modules
//!
//! - **[`auth`]**: Signup, login, logout, session check, security questions
//! - **[`account`]**: Profile update, password reset, account deletion
//! - **[`receipts`]**: Receipt upload/extraction, storage, listing, export
//! - **[`statements`]**: Statement PDF page count, extraction, transaction storage
//!
//! ## Handler Architecture
//!
//! All handlers follow Axum's extractor pattern and return `Result<_, AppError>`:
//!
//! ```rust,ignore
//! async fn handler(
//!     State(pool): State<DbPool>,                  // Shared state via FromRef
//!     Extension(current): Extension<CurrentUser>,  // Set by require_auth
//!     Json(payload): Json<RequestBody>,            // Request body
//! ) -> Result<Json<ApiResponse>, AppError> {
//!     Ok(Json(ApiResponse::message("Done")))
//! }
//! ```
//!
//! `AppError` renders as `{ "ok": false, "error": ..., "code": ... }`.
//!
//! ## Request/Response Flow
//!
//! ```text
//! Client Request
//!     ↓
//! CORS → Cookies → Request stamp → Logging → Trace
//!     ↓
//! require_auth (protected routes only)
//!     ↓
//! Handler
//! ```

pub mod account;
pub mod auth;
pub mod receipts;
pub mod statements;

#[cfg(test)]
pub(crate) mod test_support;

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use lib_core::AppError;

pub(crate) const UPLOAD_TOO_LARGE: &str = "File exceeds the upload size limit";

/// Wrap an unexpected library error as a 500.
pub(crate) fn internal(err: impl std::fmt::Display) -> AppError {
    AppError::Internal(err.to_string())
}

/// Map a multipart read failure; bodies over the upload limit get a size message.
pub(crate) fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::InvalidInput(UPLOAD_TOO_LARGE.to_string())
    } else {
        AppError::InvalidInput(format!("Invalid multipart body: {err}"))
    }
}
