//! # Authentication Library
//!
//! Password hashing, JWT session tokens, and the session cookie policy.

pub mod cookie;
pub mod error;
pub mod pwd;
pub mod token;

// Re-export commonly used types
pub use cookie::{CookiePolicy, AUTH_COOKIE_NAME};
pub use error::{Error, Result};
pub use pwd::{hash_password, hash_security_answer, normalize_answer, verify_password};
pub use token::{generate_jwt, verify_jwt, Claims};
