//! # Data Transfer Objects (DTOs)
//!
//! This module contains all data structures used for communication between
//! the frontend and backend via the REST API.
//!
//! Field names are camelCase on the wire, except where the frontend already
//! sends snake_case (`receipt_ids`).

pub mod account;
pub mod api;
pub mod auth;
pub mod receipts;
pub mod statements;

pub use account::*;
pub use api::*;
pub use auth::*;
pub use receipts::*;
pub use statements::*;
