//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (extraction thresholds, cache retention, batch limits)
//! - The library `Config` struct and logging option types
//! - User preferences persisted in the preference store

mod constants;
mod preferences;
mod types;

// Re-export all constants
pub use constants::*;
pub use preferences::{clamp_concurrency, Preferences};
pub use types::{Config, LogFormat, LogLevel};
