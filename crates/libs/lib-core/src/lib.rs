//! # Core Library
//!
//! Configuration, error type, DTOs and the SQLite store shared by the web
//! layer and the maintenance utilities.

pub mod config;
pub mod dto;
pub mod error;
pub mod model;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AuthFailure, Result};
pub use model::store::{create_pool, DbPool};
