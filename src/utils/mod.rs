//! Builders for the static selectors and patterns used by extraction.
//!
//! Both panic on invalid input: they are only called with string constants,
//! so a failure is a programming error caught by the first test that touches
//! the static.

use regex::Regex;
use scraper::Selector;

/// Parses a constant CSS selector.
///
/// # Panics
///
/// Panics if `selector_str` is not a valid selector.
pub fn parse_selector_unsafe(selector_str: &str, context: &str) -> Selector {
    Selector::parse(selector_str).unwrap_or_else(|e| {
        panic!(
            "Invalid CSS selector '{}' for {}: {}. This is a programming error.",
            selector_str, context, e
        )
    })
}

/// Compiles a constant regular expression.
///
/// # Panics
///
/// Panics if `pattern` does not compile.
pub fn compile_regex_unsafe(pattern: &str, context: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| {
        panic!(
            "Invalid regex pattern '{}' for {}: {}. This is a programming error.",
            pattern, context, e
        )
    })
}
