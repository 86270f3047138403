//! # Gatewatch Common Library
//!
//! Shared code for the gatewatch workspace:
//! - Error types
//! - Configuration resolution
//! - Event types and event bus
//! - Date/window helpers
//! - Database layer (camera registry, daily summaries)

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
