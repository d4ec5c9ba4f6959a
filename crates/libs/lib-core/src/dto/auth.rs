//! # Authentication Data Transfer Objects
//!
//! Request and response structures for the `/api/auth` endpoints.
//!
//! ## Endpoints Using These DTOs
//!
//! - `POST /api/auth/signup` - [`SignupRequest`] -> `ApiResponse`
//! - `POST /api/auth/login` - [`LoginRequest`] -> `ApiResponse<LoginData>`
//! - `GET /api/auth/me` - [`AuthCheckResponse`]
//! - `POST /api/auth/security-questions` - [`SecurityQuestionsRequest`] -> `ApiResponse`
//!
//! ## Wire Format
//!
//! ```text
//! POST /api/auth/signup
//! Content-Type: application/json
//!
//! {
//!   "username": "alice",
//!   "password": "Str0ng!pass",
//!   "confirmPassword": "Str0ng!pass",
//!   "email": "alice@example.com",
//!   "termsAccepted": true
//! }
//! ```

use crate::model::store::models::User;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub email: String,
    #[serde(default)]
    pub terms_accepted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login payload. The frontend routes to the questions form when false.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub security_questions_answered: bool,
}

/// Public view of the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCheckResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub security_questions_answered: bool,
    pub application_environment_role: String,
    pub inactive_at: Option<String>,
}

impl From<&User> for AuthCheckResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            security_questions_answered: user.security_questions_answered,
            application_environment_role: user.application_environment_role.clone(),
            inactive_at: user
                .inactive_at
                .map(|at| lib_utils::format_time(at.and_utc())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityQuestion {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityQuestionsRequest {
    #[serde(default)]
    pub questions: Vec<SecurityQuestion>,
}
