//! Shared types and configuration for kardex.
//!
//! This crate provides common pieces used across the other crates:
//! - Page-window types for list endpoints
//! - Date-boundary normalization helpers for range queries
//! - Configuration management

pub mod config;
pub mod types;

pub use config::AppConfig;
pub use types::{PageRequest, Paginated};
