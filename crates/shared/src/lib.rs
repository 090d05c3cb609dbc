//! Shared types, errors, and configuration for the AIP planner.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for offices, hierarchy nodes, budget entries and cost lines
//! - Money helpers with centavo precision
//! - Application-wide error type that callers translate into user messages
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
