//! Core type definitions with validation.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for engine inputs.
///
/// The engine operations themselves never fail; these are only returned by
/// strict parsers and constructors that callers opt into.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The frequency string is not one of the known recurrence frequencies.
    #[error("unknown recurrence frequency: {value}")]
    UnknownFrequency { value: String },

    /// The weekday name or index could not be recognized.
    #[error("unknown weekday: {value}")]
    UnknownWeekday { value: String },

    /// The string is not a `YYYY-MM-DD` calendar date.
    #[error("invalid calendar date: {value}")]
    InvalidDate { value: String },

    /// A window whose end lies before its start.
    #[error("window end {end} is before start {start}")]
    InvertedWindow {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// A calendar view that cannot be represented (bad month, or past the supported range).
    #[error("no {view} view for {value}")]
    ViewOutOfRange { view: &'static str, value: String },
}

/// How often a recurring event repeats.
///
/// Parsing is case-insensitive and also accepts `bi-weekly` for
/// [`Frequency::BiWeekly`] and `annually` for [`Frequency::Yearly`]. An empty
/// string parses as [`Frequency::None`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Frequency {
    /// Not recurring.
    #[default]
    None,
    Daily,
    Weekly,
    BiWeekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// String representation used by the external data layer.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::BiWeekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Whether expansion can produce occurrences at all.
    #[must_use]
    pub const fn is_recurring(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "biweekly" | "bi-weekly" => Ok(Self::BiWeekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" | "annually" => Ok(Self::Yearly),
            _ => Err(ValidationError::UnknownFrequency {
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for Frequency {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Frequency {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Full lowercase English name of a weekday.
#[must_use]
pub const fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Parses a weekday from a full or three-letter English name, ignoring case.
pub fn parse_weekday(s: &str) -> Result<Weekday, ValidationError> {
    s.trim()
        .parse::<Weekday>()
        .map_err(|_| ValidationError::UnknownWeekday {
            value: s.to_string(),
        })
}

/// Maps a JavaScript-style day index (`0` = Sunday) to a weekday.
pub fn weekday_from_sunday_index(index: u8) -> Result<Weekday, ValidationError> {
    match index {
        0 => Ok(Weekday::Sun),
        1 => Ok(Weekday::Mon),
        2 => Ok(Weekday::Tue),
        3 => Ok(Weekday::Wed),
        4 => Ok(Weekday::Thu),
        5 => Ok(Weekday::Fri),
        6 => Ok(Weekday::Sat),
        _ => Err(ValidationError::UnknownWeekday {
            value: index.to_string(),
        }),
    }
}

/// Parses a strict `YYYY-MM-DD` calendar date.
pub fn parse_iso_date(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        value: s.to_string(),
    })
}
