//! Error handling.
//!
//! This module provides:
//! - Error type definitions for initialization, storage, host collaborators,
//!   extraction, image conversion and archiving
//! - Categorization of network errors into fetch failure kinds
//!
//! Failures are recovered close to where they happen and turned into result
//! data (`DownloadResult`, `BatchSummary`, `ZipOutcome`); these types only
//! travel between internal layers.

mod categorization;
mod types;

// Re-export public API
pub use categorization::{categorize_reqwest_error, categorize_status};
pub use types::{
    ArchiveError, ConvertError, DatabaseError, ExtractError, FetchErrorKind, HostError,
    InitializationError,
};
