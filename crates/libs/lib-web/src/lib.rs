//! # Web Library
//!
//! HTTP handlers, middleware, server setup, and the extraction services.

pub mod handlers;
pub mod middleware;
pub mod server;
pub mod services;
pub mod utils;

pub use server::{create_router, start_server, AppState, ServerConfig};
