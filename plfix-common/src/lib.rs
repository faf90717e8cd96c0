//! # plfix Common Library
//!
//! Shared code for the plfix workspace including:
//! - Error types
//! - Configuration loading (TOML file, environment, compiled defaults)
//! - Run event types and the broadcast EventBus
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
