//! Shared utilities for CLI commands.

use anyhow::bail;
use chrono::{NaiveDate, NaiveDateTime};

/// Accepted datetime layouts, most specific first.
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Which instant of the day a bare date stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOnly {
    StartOfDay,
    EndOfDay,
}

/// Parse a local datetime or a bare date.
///
/// Supports:
/// - "2024-01-15T10:30:00", "2024-01-15T10:30"
/// - "2024-01-15 10:30:00", "2024-01-15 10:30"
/// - "2024-01-15", resolved per `date_only`
pub fn parse_datetime(s: &str, date_only: DateOnly) -> anyhow::Result<NaiveDateTime> {
    let s = s.trim();
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }

    let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") else {
        bail!(
            "Invalid datetime: {s}. Use YYYY-MM-DD, YYYY-MM-DDTHH:MM or YYYY-MM-DDTHH:MM:SS"
        );
    };

    let resolved = match date_only {
        DateOnly::StartOfDay => Some(NaiveDateTime::from(date)),
        DateOnly::EndOfDay => date.and_hms_nano_opt(23, 59, 59, 999_999_999),
    };
    match resolved {
        Some(dt) => Ok(dt),
        None => bail!("Datetime out of range: {s}"),
    }
}
