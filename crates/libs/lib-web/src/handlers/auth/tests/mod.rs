//! # Auth Handler Tests
//!
//! Signup, login, session and security-question flows through the real router.

mod session;

use crate::handlers::test_support::*;
use axum::http::StatusCode;
use serde_json::json;
