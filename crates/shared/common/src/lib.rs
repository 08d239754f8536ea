//! Common utilities shared across services.
//!
//! This crate provides:
//! - Unified error handling with HTTP responses
//! - Configuration structures loaded from the environment

pub mod config;
pub mod error;

pub use config::*;
pub use error::{AppError, AppResult};
