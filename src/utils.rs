//! Utility functions for timestamps, string manipulation, and file system operations.
//!
//! This module provides helper functions used throughout the application:
//! - Timestamp parsing for the many date layouts found in sitemaps and APIs
//! - Trailing time-window checks for dated sources
//! - String truncation and slugification for logging and file names
//! - File system validation for output directories

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use itertools::Itertools;
use std::fs as stdfs;
use std::io;
use tokio::fs;
use tracing::{info, instrument};

const SECONDS_PER_DAY: i64 = 86_400;

/// One accepted timestamp layout.
enum Layout {
    /// Carries a numeric offset (`-0700`).
    Offset(&'static str),
    /// Carries a zone abbreviation (`MST`, `GMT`), read as UTC.
    Named(&'static str),
    /// No zone at all, read as UTC.
    Naive(&'static str),
    /// Calendar date only, midnight UTC.
    Date(&'static str),
    Rfc3339,
}

/// Layouts in the order they are attempted.
const LAYOUTS: &[Layout] = &[
    Layout::Naive("%a %b %e %H:%M:%S %Y"),          // ANSI C
    Layout::Named("%a %b %e %H:%M:%S %Z %Y"),       // Unix date
    Layout::Offset("%a %b %d %H:%M:%S %z %Y"),      // Ruby date
    Layout::Named("%d %b %y %H:%M %Z"),             // RFC 822
    Layout::Offset("%d %b %y %H:%M %z"),            // RFC 822 numeric zone
    Layout::Named("%A, %d-%b-%y %H:%M:%S %Z"),      // RFC 850
    Layout::Named("%a, %d %b %Y %H:%M:%S %Z"),      // RFC 1123
    Layout::Offset("%a, %d %b %Y %H:%M:%S %z"),     // RFC 1123 numeric zone
    Layout::Rfc3339,
    Layout::Naive("%Y-%m-%d %H:%M:%S"),
    Layout::Date("%Y-%m-%d"),
];

impl Layout {
    fn parse(&self, value: &str) -> Option<i64> {
        match self {
            Layout::Offset(fmt) => DateTime::parse_from_str(value, fmt)
                .ok()
                .map(|d| d.timestamp()),
            // %Z skips any token, so a numeric offset must not be swallowed here
            Layout::Named(_) if has_numeric_offset(value) => None,
            Layout::Named(fmt) | Layout::Naive(fmt) => NaiveDateTime::parse_from_str(value, fmt)
                .ok()
                .map(|d| d.and_utc().timestamp()),
            Layout::Date(fmt) => NaiveDate::parse_from_str(value, fmt)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|d| d.and_utc().timestamp()),
            Layout::Rfc3339 => DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|d| d.timestamp()),
        }
    }
}

fn has_numeric_offset(value: &str) -> bool {
    value.split_whitespace().any(|token| {
        token.len() > 1
            && token.starts_with(['+', '-'])
            && token[1..].chars().all(|c| c.is_ascii_digit())
    })
}

/// Parse a source-provided date string of unknown layout into epoch seconds.
///
/// Layouts are tried in a fixed order and the first one that parses wins.
/// Anything unparseable yields `0`, which callers treat as "unknown" and
/// which [`within_window`] never accepts.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(parse_date("2024-02-26"), 1708905600);
/// assert_eq!(parse_date("yesterday-ish"), 0);
/// ```
pub fn parse_date(value: &str) -> i64 {
    let value = value.trim();
    if value.is_empty() {
        return 0;
    }
    LAYOUTS
        .iter()
        .find_map(|layout| layout.parse(value))
        .unwrap_or(0)
}

/// Whether `timestamp` falls inside the trailing window of `window_days`.
///
/// True iff `timestamp + (window_days + 1) days > now`. The extra day is a
/// fixed grace period at the window edge. An unknown timestamp (`0`) is never
/// inside any window.
pub fn within_window(timestamp: i64, window_days: u32) -> bool {
    within_window_at(timestamp, window_days, Utc::now())
}

/// [`within_window`] against an explicit clock.
pub fn within_window_at(timestamp: i64, window_days: u32, now: DateTime<Utc>) -> bool {
    if timestamp == 0 {
        return false;
    }
    let span = (i64::from(window_days) + 1).saturating_mul(SECONDS_PER_DAY);
    timestamp.saturating_add(span) > now.timestamp()
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Convert a source label to a file-name friendly slug.
///
/// Lowercases the text and joins runs of alphanumerics with single hyphens,
/// so both source names and root URLs make readable file names.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify("YC HACKER NEWS"), "yc-hacker-news");
/// assert_eq!(slugify("https://medium.com/sitemap/sitemap.xml"), "https-medium-com-sitemap-sitemap-xml");
/// ```
pub fn slugify(label: &str) -> String {
    label
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .join("-")
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> io::Result<()> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
