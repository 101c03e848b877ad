//! Error type definitions.
//!
//! This module defines all error types used throughout the application.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

use crate::models::TabId;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Error creating the download directory.
    #[error("Download directory error: {0}")]
    DownloadDirError(String),
}

/// Error types for database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Error applying schema migrations.
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    /// Stored value could not be (de)serialized.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Categories of network fetch failures.
///
/// Mirrors the `reqwest` error taxonomy plus the HTTP status classes that
/// matter for media downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum FetchErrorKind {
    Builder,
    Redirect,
    Timeout,
    Request,
    Connect,
    Body,
    Decode,
    Forbidden,
    NotFound,
    ClientError,
    ServerError,
    Other,
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchErrorKind::Builder => "request builder error",
            FetchErrorKind::Redirect => "redirect error",
            FetchErrorKind::Timeout => "request timed out",
            FetchErrorKind::Request => "request error",
            FetchErrorKind::Connect => "connection failed",
            FetchErrorKind::Body => "response body error",
            FetchErrorKind::Decode => "response decode error",
            FetchErrorKind::Forbidden => "forbidden (403)",
            FetchErrorKind::NotFound => "not found (404)",
            FetchErrorKind::ClientError => "client error (4xx)",
            FetchErrorKind::ServerError => "server error (5xx)",
            FetchErrorKind::Other => "network error",
        }
    }
}

/// Failures reported by host collaborators: the download primitive, the
/// page bridge, and page-side runtimes.
///
/// Every variant is eventually flattened into an error string on a
/// `DownloadResult`; none crosses the command dispatcher as an `Err`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// A page-context operation was requested without a target tab.
    #[error("No active tab")]
    NoActiveTab,

    /// The target tab is gone (closed or never registered).
    #[error("No tab with id: {0}")]
    TabClosed(TabId),

    /// The page navigated away or the script could not run.
    #[error("Cannot access contents of the page: {0}")]
    Script(String),

    /// The page and background disagree on the RPC protocol.
    #[error("Unsupported page protocol version {found} (expected {expected})")]
    ProtocolMismatch {
        /// Version sent by the caller
        found: u32,
        /// Version the page side implements
        expected: u32,
    },

    /// Network fetch failed.
    #[error("Fetch failed ({kind}): {message}")]
    Fetch {
        /// Failure category
        kind: FetchErrorKind,
        /// Underlying error text
        message: String,
    },

    /// URL scheme or syntax not fetchable.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Writing the downloaded file failed.
    #[error("Download write failed: {0}")]
    Io(String),

    /// A page-context call exceeded its time budget.
    #[error("Page call timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl From<ReqwestError> for HostError {
    fn from(error: ReqwestError) -> Self {
        HostError::Fetch {
            kind: super::categorize_reqwest_error(&error),
            message: error.to_string(),
        }
    }
}

impl From<std::io::Error> for HostError {
    fn from(error: std::io::Error) -> Self {
        HostError::Io(error.to_string())
    }
}

/// Failures during extraction that skip one element without aborting the scan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// Canvas pixels are unreadable (cross-origin content was drawn into it).
    #[error("Canvas is tainted by cross-origin data")]
    TaintedCanvas,

    /// Canvas pixel buffer does not match its declared size or failed to encode.
    #[error("Canvas encode error: {0}")]
    CanvasEncode(String),
}

/// Image re-encoding failures.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Source bytes could not be decoded as an image.
    #[error("Image decode failed: {0}")]
    Decode(String),

    /// Re-encoding into the target format failed.
    #[error("Image encode failed: {0}")]
    Encode(String),

    /// `ConvertFormat::Original` is not a conversion target.
    #[error("No conversion target format")]
    NoTarget,
}

/// ZIP encoding failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    /// An entry, or the archive as a whole, exceeds the 4 GiB limit of the
    /// non-ZIP64 format.
    #[error("Archive exceeds 4 GiB: {0}")]
    TooLarge(String),

    /// More than 65535 entries (non-ZIP64 limit).
    #[error("Too many archive entries: {0}")]
    TooManyEntries(usize),

    /// Entry name longer than 65535 bytes.
    #[error("Entry name too long: {0} bytes")]
    NameTooLong(usize),
}
