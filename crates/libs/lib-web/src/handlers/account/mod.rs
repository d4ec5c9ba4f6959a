//! # Account Handlers
//!
//! Profile and password maintenance, and account deletion, for the logged-in
//! user. All routes sit behind `require_auth`.

use super::internal;
use crate::middleware::CurrentUser;
use crate::utils::clear_auth_cookie;
use axum::extract::{Extension, Json, State};
use lib_auth::{hash_password, verify_password};
use lib_core::dto::{ApiResponse, ResetPasswordRequest, UpdateProfileRequest};
use lib_core::model::store::UserRepository;
use lib_core::{AppError, AuthFailure, Config, DbPool};
use lib_utils::{sanitize_input, validate_email, validate_password};
use tower_cookies::Cookies;
use tracing::{info, instrument, warn};

/// Change the email address of the current user.
#[instrument(skip(pool, current, req), fields(user_id = %current.id()))]
pub async fn update_profile(
    State(pool): State<DbPool>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    let email = sanitize_input(&req.email);
    if email.is_empty() {
        return Err(AppError::InvalidInput("Email is required".to_string()));
    }
    validate_email(&email).map_err(AppError::InvalidInput)?;

    if UserRepository::email_taken_by_other(&pool, &email, current.id()).await? {
        warn!("[ACCOUNT] Email already in use");
        return Err(AppError::Conflict("Email already in use".to_string()));
    }

    UserRepository::update_email(&pool, current.id(), &email).await?;

    info!("[ACCOUNT] Email updated for {}", current.id());
    Ok(Json(ApiResponse::message("Profile updated successfully")))
}

/// Replace the password after checking the current one.
///
/// Policy failures are reported before the old password is checked.
#[instrument(skip(pool, current, req), fields(user_id = %current.id()))]
pub async fn reset_password(
    State(pool): State<DbPool>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    if req.new_password != req.confirm_new_password {
        return Err(AppError::InvalidInput("New passwords do not match".to_string()));
    }
    validate_password(&req.new_password).map_err(AppError::InvalidInput)?;

    if req.new_password == req.old_password {
        return Err(AppError::InvalidInput(
            "New password must be different from the old password".to_string(),
        ));
    }

    let matches = verify_password(&req.old_password, &current.user.password_hash).map_err(internal)?;
    if !matches {
        warn!("[ACCOUNT] Wrong current password for {}", current.id());
        return Err(AppError::Auth(AuthFailure::WrongPassword));
    }

    let password_hash = hash_password(&req.new_password).map_err(internal)?;
    UserRepository::update_password(&pool, current.id(), &password_hash).await?;

    info!("[ACCOUNT] Password changed for {}", current.id());
    Ok(Json(ApiResponse::message("Password reset successfully")))
}

/// Soft-delete the current user and end the session.
///
/// The row stays until `purge-inactive-users` removes it.
#[instrument(skip(pool, config, cookies, current), fields(user_id = %current.id()))]
pub async fn delete_account(
    State(pool): State<DbPool>,
    State(config): State<Config>,
    cookies: Cookies,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse>, AppError> {
    UserRepository::soft_delete(&pool, current.id()).await?;
    clear_auth_cookie(&cookies, &config);

    info!("[ACCOUNT] Account {} marked inactive", current.id());
    Ok(Json(ApiResponse::message("Account deleted")))
}

#[cfg(test)]
mod tests;
