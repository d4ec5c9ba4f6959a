//! # Utilities Library
//!
//! Shared utility functions for base64 encoding, environment variables, time,
//! input validation, and currency parsing.

pub mod b64;
pub mod currency;
pub mod envs;
pub mod time;
pub mod validation;

// Re-export commonly used functions
pub use b64::{b64_decode, b64_encode};
pub use currency::{format_cents, format_cents_to_usd, parse_currency};
pub use envs::{get_env, get_env_or, get_env_parse, Environment};
pub use time::{format_time, format_us_date, now_utc, parse_us_date, parse_utc};
pub use validation::{
    sanitize_input, validate_email, validate_max_length, validate_not_empty, validate_password,
    validate_username,
};
