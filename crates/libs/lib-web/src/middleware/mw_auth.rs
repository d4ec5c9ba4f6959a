//! # Authentication Middleware
//!
//! Validates the `jwt` session cookie on protected routes and injects the
//! authenticated [`CurrentUser`] into the request extensions.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/api/auth/me", get(handlers::auth::me))
//!     .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth));
//! ```
//!
//! Handlers then take `Extension<CurrentUser>`.

use crate::server::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use lib_auth::{verify_jwt, AUTH_COOKIE_NAME};
use lib_core::model::models::User;
use lib_core::model::store::UserRepository;
use lib_core::{AppError, AuthFailure};
use tower_cookies::Cookies;
use tracing::{debug, warn};

/// The user behind the session cookie.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
}

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.user.id
    }
}

/// Authentication middleware for cookie sessions.
///
/// # Behavior
///
/// - **No cookie**: 401 `UNAUTHORIZED`
/// - **Bad or expired token**: 401 `INVALID_TOKEN`
/// - **Unknown user**: 401 `USER_NOT_FOUND`
/// - **Deleted account**: 401 `USER_INACTIVE`
/// - **Otherwise**: continues with `CurrentUser` in extensions
pub async fn require_auth(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = cookies
        .get(AUTH_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            debug!("[AUTH] No session cookie");
            AppError::Auth(AuthFailure::MissingToken)
        })?;

    let (user_id, _expires_at) = verify_jwt(&token, &state.config.session_secret).map_err(|e| {
        warn!("[AUTH] JWT validation failed: {}", e);
        AppError::Auth(AuthFailure::InvalidToken)
    })?;

    let Some(user) = UserRepository::find_active_by_id(&state.db, &user_id).await? else {
        // Tell a deleted account apart from one that never existed
        return Err(match UserRepository::find_by_id(&state.db, &user_id).await? {
            Some(_) => {
                warn!("[AUTH] Token for deleted account {}", user_id);
                AppError::Auth(AuthFailure::UserInactive)
            }
            None => {
                warn!("[AUTH] Token for unknown user {}", user_id);
                AppError::Auth(AuthFailure::UserNotFound)
            }
        });
    };

    debug!("[AUTH] Authenticated user: {} (id: {})", user.username, user.id);

    req.extensions_mut().insert(CurrentUser { user });

    Ok(next.run(req).await)
}
