//! Recurrence rules and their stored representation.
//!
//! The external data layer persists rules loosely: every field is optional,
//! frequencies are free strings and weekdays may be names or JavaScript day
//! indices. [`StoredRecurrenceRule`] mirrors that shape; converting it into a
//! [`RecurrenceRule`] never fails and falls back to documented defaults.

use chrono::{NaiveDate, Weekday};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{
    Frequency, parse_iso_date, parse_weekday, weekday_from_sunday_index, weekday_name,
};

/// How a base event repeats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredRecurrenceRule", into = "StoredRecurrenceRule")]
pub struct RecurrenceRule {
    pub frequency: Frequency,

    /// Multiplies the frequency's step. Zero is treated as one.
    pub interval: u32,

    /// Weekday restriction for weekly rules.
    ///
    /// `None` means unrestricted. An explicitly empty set makes a weekly rule
    /// produce nothing. A non-empty set does not change stepping: weekly
    /// occurrences stay on the base event's weekday.
    pub days_of_week: Option<Vec<Weekday>>,

    /// Last calendar day (inclusive) on which an occurrence may start.
    pub end_date: Option<NaiveDate>,
}

impl RecurrenceRule {
    /// Creates a rule with interval 1, no weekday restriction and no end date.
    pub const fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            days_of_week: None,
            end_date: None,
        }
    }

    #[must_use]
    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the weekday restriction, dropping duplicates.
    #[must_use]
    pub fn with_days_of_week(mut self, days: impl IntoIterator<Item = Weekday>) -> Self {
        let mut unique: Vec<Weekday> = Vec::new();
        for day in days {
            if !unique.contains(&day) {
                unique.push(day);
            }
        }
        self.days_of_week = Some(unique);
        self
    }

    #[must_use]
    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// The interval actually used for stepping.
    pub fn effective_interval(&self) -> u32 {
        self.interval.max(1)
    }
}

impl Default for RecurrenceRule {
    fn default() -> Self {
        Self::new(Frequency::None)
    }
}

/// A weekday as persisted: either a name or a Sunday-based index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredWeekday {
    Index(u8),
    Name(String),
}

impl StoredWeekday {
    fn resolve(&self) -> Option<Weekday> {
        let parsed = match self {
            Self::Index(index) => weekday_from_sunday_index(*index),
            Self::Name(name) => parse_weekday(name),
        };
        parsed
            .inspect_err(|err| tracing::trace!(error = %err, "dropping stored weekday"))
            .ok()
    }
}

/// A recurrence rule exactly as the external data layer stores it.
///
/// Fields of an unexpected JSON type are read as absent, and weekday entries
/// that are neither an index nor a name are dropped, so a stray value never
/// fails the whole rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecurrenceRule {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub frequency: Option<String>,

    /// A number, or a string holding one.
    #[serde(
        default,
        deserialize_with = "lenient_interval",
        skip_serializing_if = "Option::is_none"
    )]
    pub interval: Option<u32>,

    #[serde(
        default,
        deserialize_with = "lenient_weekdays",
        skip_serializing_if = "Option::is_none"
    )]
    pub days_of_week: Option<Vec<StoredWeekday>>,

    /// `YYYY-MM-DD`, or any string that starts with one (e.g. an ISO timestamp).
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<String>,
}

/// A stored value of the expected type, or anything else.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Expected(T),
    Other(IgnoredAny),
}

impl<T> Lenient<T> {
    fn expected(self, what: &str) -> Option<T> {
        match self {
            Self::Expected(value) => Some(value),
            Self::Other(_) => {
                tracing::trace!(field = what, "ignoring stored value of unexpected type");
                None
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredInterval {
    Number(u32),
    Text(String),
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Lenient<String>>::deserialize(deserializer)?;
    Ok(value.and_then(|value| value.expected("string")))
}

fn lenient_interval<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Lenient<StoredInterval>>::deserialize(deserializer)?;
    Ok(match value.and_then(|value| value.expected("interval")) {
        Some(StoredInterval::Number(interval)) => Some(interval),
        Some(StoredInterval::Text(text)) => text
            .trim()
            .parse()
            .inspect_err(|err| tracing::trace!(error = %err, "ignoring unparseable interval"))
            .ok(),
        None => None,
    })
}

fn lenient_weekdays<'de, D>(deserializer: D) -> Result<Option<Vec<StoredWeekday>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Lenient<Vec<Lenient<StoredWeekday>>>>::deserialize(deserializer)?;
    Ok(value.and_then(|value| value.expected("daysOfWeek")).map(|entries| {
        entries
            .into_iter()
            .filter_map(|entry| entry.expected("weekday"))
            .collect()
    }))
}

impl From<StoredRecurrenceRule> for RecurrenceRule {
    fn from(stored: StoredRecurrenceRule) -> Self {
        let frequency = stored.frequency.as_deref().map_or(Frequency::None, |raw| {
            raw.parse().unwrap_or_else(|err| {
                tracing::trace!(error = %err, "treating unknown frequency as non-recurring");
                Frequency::None
            })
        });

        let days_of_week = stored
            .days_of_week
            .map(|days| days.iter().filter_map(StoredWeekday::resolve).collect::<Vec<_>>());

        let end_date = stored.end_date.as_deref().and_then(parse_stored_end_date);

        let mut rule = Self::new(frequency).with_interval(stored.interval.unwrap_or(1).max(1));
        if let Some(days) = days_of_week {
            rule = rule.with_days_of_week(days);
        }
        rule.end_date = end_date;
        rule
    }
}

impl From<RecurrenceRule> for StoredRecurrenceRule {
    fn from(rule: RecurrenceRule) -> Self {
        Self {
            frequency: Some(rule.frequency.as_str().to_string()),
            interval: Some(rule.interval),
            days_of_week: rule.days_of_week.map(|days| {
                days.into_iter()
                    .map(|day| StoredWeekday::Name(weekday_name(day).to_string()))
                    .collect()
            }),
            end_date: rule.end_date.map(|date| date.format("%Y-%m-%d").to_string()),
        }
    }
}

fn parse_stored_end_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let prefix = raw.get(..10).unwrap_or(raw);
    parse_iso_date(prefix)
        .inspect_err(|err| tracing::trace!(error = %err, "ignoring unparseable end date"))
        .ok()
}
