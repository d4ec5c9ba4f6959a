//! # Model Layer
//!
//! Persistent entities and the repositories that load and store them.

pub mod store;

pub use store::models;
