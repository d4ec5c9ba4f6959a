//! Small helpers shared by handlers and middleware.

pub mod cookies;

pub use cookies::{clear_auth_cookie, set_auth_cookie};
