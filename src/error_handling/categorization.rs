//! Error categorization.
//!
//! This module maps `reqwest` errors onto the fetch failure categories used in
//! download error messages.

use super::types::FetchErrorKind;

/// Categorizes a `reqwest::Error` into a `FetchErrorKind`.
///
/// HTTP status codes are checked first (they only appear on errors produced by
/// `error_for_status`), then the reqwest error class.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> FetchErrorKind {
    if let Some(status) = error.status() {
        match status.as_u16() {
            403 => return FetchErrorKind::Forbidden,
            404 => return FetchErrorKind::NotFound,
            _ if status.is_client_error() => return FetchErrorKind::ClientError,
            _ if status.is_server_error() => return FetchErrorKind::ServerError,
            _ => {
                // Non-standard status codes - fall through to check error type
            }
        }
    }

    if error.is_builder() {
        FetchErrorKind::Builder
    } else if error.is_redirect() {
        FetchErrorKind::Redirect
    } else if error.is_timeout() {
        FetchErrorKind::Timeout
    } else if error.is_connect() {
        FetchErrorKind::Connect
    } else if error.is_request() {
        FetchErrorKind::Request
    } else if error.is_body() {
        FetchErrorKind::Body
    } else if error.is_decode() {
        FetchErrorKind::Decode
    } else {
        FetchErrorKind::Other
    }
}

/// Categorizes a bare HTTP status for responses checked without
/// `error_for_status`.
pub fn categorize_status(status: u16) -> FetchErrorKind {
    match status {
        403 => FetchErrorKind::Forbidden,
        404 => FetchErrorKind::NotFound,
        400..=499 => FetchErrorKind::ClientError,
        500..=599 => FetchErrorKind::ServerError,
        _ => FetchErrorKind::Other,
    }
}
