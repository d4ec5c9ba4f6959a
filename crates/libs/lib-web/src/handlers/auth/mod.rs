//! # Authentication Handlers
//!
//! HTTP request handlers for user authentication endpoints.
//!
//! ## Overview
//!
//! - Signup with username, email, password and terms acceptance
//! - Login with username and password
//! - Logout (cookie cleared)
//! - Session check (`/api/auth/me`)
//! - Security questions, answered once after signup
//!
//! Successful signup and login set the `jwt` cookie. Nothing token-related is
//! returned in the body.

use super::internal;
use crate::middleware::CurrentUser;
use crate::utils::{clear_auth_cookie, set_auth_cookie};
use axum::extract::{Extension, Json, State};
use lib_auth::{generate_jwt, hash_password, hash_security_answer, verify_password};
use lib_core::dto::{
    ApiResponse, AuthCheckResponse, LoginData, LoginRequest, SecurityQuestionsRequest, SignupRequest,
};
use lib_core::model::models::{SecurityQuestionsForCreate, User, UserForCreate};
use lib_core::model::store::{SecurityQuestionRepository, UserRepository};
use lib_core::{AppError, AuthFailure, Config, DbPool};
use lib_utils::{sanitize_input, validate_email, validate_password, validate_username};
use tower_cookies::Cookies;
use tracing::{debug, error, info, instrument, warn};

/// Sign the session token for `user` and set it as the `jwt` cookie.
fn issue_session(cookies: &Cookies, config: &Config, user: &User) -> Result<(), AppError> {
    let token = generate_jwt(&user.id, &config.session_secret, config.session_ttl()).map_err(|e| {
        error!("[AUTH] JWT encoding failed: {}", e);
        internal(e)
    })?;
    set_auth_cookie(cookies, config, token);
    Ok(())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Signup handler - creates a new user account and logs it in.
///
/// # Validation
///
/// - Terms must be accepted
/// - Username: 3-20 letters or digits
/// - Email: valid format, at most 255 characters
/// - Password and confirmation must match and satisfy the password policy
/// - Username and email must both be unused
#[instrument(skip(pool, config, cookies, req), fields(username = %req.username))]
pub async fn signup(
    State(pool): State<DbPool>,
    State(config): State<Config>,
    cookies: Cookies,
    Json(req): Json<SignupRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    info!("[SIGNUP] New signup request");

    if !req.terms_accepted {
        warn!("[SIGNUP] Terms not accepted");
        return Err(AppError::InvalidInput("Terms must be accepted".to_string()));
    }

    let username = sanitize_input(&req.username);
    let email = sanitize_input(&req.email);
    validate_username(&username).map_err(AppError::InvalidInput)?;
    validate_email(&email).map_err(AppError::InvalidInput)?;

    if req.password != req.confirm_password {
        return Err(AppError::InvalidInput("Passwords do not match".to_string()));
    }
    validate_password(&req.password).map_err(AppError::InvalidInput)?;

    if UserRepository::username_or_email_taken(&pool, &username, &email).await? {
        warn!("[SIGNUP] Username or email already registered: {}", username);
        return Err(AppError::Conflict("Username or email already exists".to_string()));
    }

    debug!("[SIGNUP] Hashing password...");
    let password_hash = hash_password(&req.password).map_err(internal)?;

    let user = UserRepository::create(&pool, UserForCreate::new(username, email, password_hash))
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Username or email already exists".to_string())
            } else {
                error!("[SIGNUP] Failed to create user: {}", e);
                AppError::from(e)
            }
        })?;

    issue_session(&cookies, &config, &user)?;

    info!("[SIGNUP] User created: {} (id: {})", user.username, user.id);
    Ok(Json(ApiResponse::message(
        "Account registration completed successfully",
    )))
}

/// Login handler - authenticates an existing user by username and password.
///
/// Unknown users and wrong passwords get the same error. Deleted accounts
/// are only reported once the password has been verified.
#[instrument(skip(pool, config, cookies, req), fields(username = %req.username))]
pub async fn login(
    State(pool): State<DbPool>,
    State(config): State<Config>,
    cookies: Cookies,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginData>>, AppError> {
    info!("[LOGIN] Login attempt");

    let username = sanitize_input(&req.username);

    let Some(user) = UserRepository::find_by_username(&pool, &username).await? else {
        warn!("[LOGIN] User not found: {}", username);
        return Err(AppError::Auth(AuthFailure::InvalidCredentials));
    };

    let is_valid = verify_password(&req.password, &user.password_hash).map_err(|e| {
        error!("[LOGIN] Password verification error: {}", e);
        internal(e)
    })?;

    if !is_valid {
        warn!("[LOGIN] Invalid password for user: {}", user.username);
        return Err(AppError::Auth(AuthFailure::InvalidCredentials));
    }

    if !user.is_active() {
        warn!("[LOGIN] Deleted account: {}", user.username);
        return Err(AppError::Auth(AuthFailure::InactiveLogin));
    }

    issue_session(&cookies, &config, &user)?;

    info!("[LOGIN] User authenticated: {} (id: {})", user.username, user.id);
    Ok(Json(ApiResponse::with_data(
        "Logged in successfully",
        LoginData {
            security_questions_answered: user.security_questions_answered,
        },
    )))
}

pub async fn logout(State(config): State<Config>, cookies: Cookies) -> Json<ApiResponse> {
    clear_auth_cookie(&cookies, &config);
    Json(ApiResponse::message("Logged out successfully"))
}

/// Current user for the session cookie.
pub async fn me(Extension(current): Extension<CurrentUser>) -> Json<AuthCheckResponse> {
    Json(AuthCheckResponse::from(&current.user))
}

/// Store the three security questions for the current user.
///
/// Questions are HTML-escaped; answers are normalized and hashed, so they
/// can later be compared case-insensitively.
#[instrument(skip(pool, current, req), fields(user_id = %current.id()))]
pub async fn security_questions(
    State(pool): State<DbPool>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<SecurityQuestionsRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    let user_id = current.id();

    if current.user.security_questions_answered
        || SecurityQuestionRepository::exists_for_user(&pool, user_id).await?
    {
        return Err(AppError::Conflict("Security questions already answered".to_string()));
    }

    let [first, second, third] = <[_; 3]>::try_from(req.questions).map_err(|_| {
        AppError::InvalidInput("Exactly three security questions are required".to_string())
    })?;

    let mut entries = Vec::with_capacity(3);
    for entry in [first, second, third] {
        if entry.question.trim().is_empty() || entry.answer.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Each security question needs a question and an answer".to_string(),
            ));
        }
        let answer_hash = hash_security_answer(&entry.answer).map_err(internal)?;
        entries.push((sanitize_input(&entry.question), answer_hash));
    }

    let entries: [(String, String); 3] = entries
        .try_into()
        .map_err(|_| AppError::Internal("security question count changed".to_string()))?;

    SecurityQuestionRepository::create(
        &pool,
        SecurityQuestionsForCreate {
            user_id: user_id.to_string(),
            entries,
        },
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Security questions already answered".to_string())
        } else {
            AppError::from(e)
        }
    })?;

    info!("[SECURITY] Security questions saved for {}", user_id);
    Ok(Json(ApiResponse::message("Security questions saved successfully")))
}

#[cfg(test)]
mod tests;
