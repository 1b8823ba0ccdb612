//! Timestamp normalization for the heterogeneous stamps found in exports.
//!
//! Apple writes times like `2024-10-01 07:21:32 -0400`, ISO strings with a
//! `T` separator, and the occasional oddball. Every input normalizes to a
//! calendar date plus a UTC instant; nothing here is fatal, because one
//! malformed stamp must never abort a whole extraction.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;

static NON_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9]").expect("static pattern"));

/// The instant half of a normalized stamp. `Raw` carries the original
/// input when every parse branch failed (best-effort, non-fatal).
#[derive(Clone, Debug, PartialEq)]
pub enum Instant {
    Utc(DateTime<Utc>),
    Raw(String),
}

/// A normalized timestamp: a `YYYY-MM-DD` calendar date plus an instant.
#[derive(Clone, Debug, PartialEq)]
pub struct Stamp {
    pub date: String,
    pub instant: Instant,
}

impl Stamp {
    fn from_utc(dt: DateTime<Utc>) -> Self {
        Self {
            date: dt.format("%Y-%m-%d").to_string(),
            instant: Instant::Utc(dt),
        }
    }

    /// The UTC instant, when one could be recovered.
    pub fn utc(&self) -> Option<DateTime<Utc>> {
        match &self.instant {
            Instant::Utc(dt) => Some(*dt),
            Instant::Raw(_) => None,
        }
    }

    /// ISO-8601 rendering of the instant; the raw input when unparsed.
    pub fn iso(&self) -> String {
        match &self.instant {
            Instant::Utc(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
            Instant::Raw(raw) => raw.clone(),
        }
    }
}

/// Normalize a free-form timestamp string.
///
/// Attempts, in order:
/// - `YYYY-MM-DD HH:MM:SS ±HHMM` (with or without the space before the
///   offset; `T` and `Z` are substituted away first)
/// - the same without an offset, assumed UTC
/// - a digits-only fallback: strip all punctuation and parse the first 14
///   digits as `YYYYMMDDHHMMSS`, assumed UTC
///
/// If every branch fails the calendar date is the first 10 characters of
/// the input and the instant is the raw string.
pub fn normalize(input: &str) -> Stamp {
    let s = input.trim().replace('T', " ").replace('Z', "+0000");

    for fmt in ["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M:%S%z"] {
        if let Ok(dt) = DateTime::parse_from_str(&s, fmt) {
            return Stamp::from_utc(dt.with_timezone(&Utc));
        }
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S") {
        return Stamp::from_utc(ndt.and_utc());
    }

    let digits = NON_DIGIT.replace_all(&s, "");
    if digits.len() >= 14
        && let Ok(ndt) = NaiveDateTime::parse_from_str(&digits[..14], "%Y%m%d%H%M%S")
    {
        return Stamp::from_utc(ndt.and_utc());
    }

    Stamp {
        date: input.chars().take(10).collect(),
        instant: Instant::Raw(input.to_string()),
    }
}
