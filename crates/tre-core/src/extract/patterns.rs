//! The ordered catalog of date patterns.
//!
//! Each [`PatternClass`] is a pure matcher over the source text. Classes are
//! tried in [`PatternClass::PRIORITY`] order and the first class that yields a
//! boundary-valid, calendar-valid candidate wins. Within a class the leftmost
//! candidate wins.

use std::ops::Range;
use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use regex::{Captures, Regex};

use crate::calendar::{checked_date, first_of_next_month, first_of_next_year, next_weekday};

use super::DateCandidate;

/// "next week", "next month", "next year".
static RELATIVE_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)next\s+(?P<unit>week|month|year)").unwrap());

/// Keyword followed by a year-first date.
static KEYWORD_ISO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:on|due|by)\s+(?P<year>\d{4})(?P<sep1>[-/])(?P<month>\d{1,2})(?P<sep2>[-/])(?P<day>\d{1,2})",
    )
    .unwrap()
});

/// Keyword followed by a slash date with a trailing year.
static KEYWORD_NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:on|due|by)\s+(?P<first>\d{1,2})/(?P<second>\d{1,2})/(?P<year>\d{4})")
        .unwrap()
});

static WEEKDAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:(?P<next>next)\s+)?(?P<weekday>monday|tuesday|wednesday|thursday|friday|saturday|sunday)",
    )
    .unwrap()
});

static RELATIVE_DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)today|tomorrow").unwrap());

static ISO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<year>\d{4})(?P<sep1>[-/])(?P<month>\d{1,2})(?P<sep2>[-/])(?P<day>\d{1,2})",
    )
    .unwrap()
});

static NUMERIC_WITH_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<first>\d{1,2})/(?P<second>\d{1,2})/(?P<year>\d{4})").unwrap()
});

static NUMERIC_WITHOUT_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<first>\d{1,2})/(?P<second>\d{1,2})").unwrap());

/// A family of date mentions, listed in descending priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternClass {
    /// "next week", "next month", "next year".
    RelativeRange,
    /// `on|due|by` followed by `YYYY-MM-DD`, `YYYY/MM/DD` or `MM/DD/YYYY`.
    KeywordDate,
    /// A weekday name, optionally preceded by "next".
    Weekday,
    /// "today", "tomorrow".
    RelativeDay,
    /// `YYYY-MM-DD` or `YYYY/MM/DD`.
    IsoDate,
    /// `MM/DD/YYYY` or `DD/MM/YYYY`.
    NumericWithYear,
    /// `MM/DD` or `DD/MM` in the reference year.
    NumericWithoutYear,
}

impl PatternClass {
    /// All classes, highest priority first.
    pub const PRIORITY: [Self; 7] = [
        Self::RelativeRange,
        Self::KeywordDate,
        Self::Weekday,
        Self::RelativeDay,
        Self::IsoDate,
        Self::NumericWithYear,
        Self::NumericWithoutYear,
    ];

    /// Finds the leftmost valid mention of this class in `text`.
    pub fn find(self, text: &str, today: NaiveDate) -> Option<DateCandidate> {
        match self {
            Self::RelativeRange => scan(text, &RELATIVE_RANGE_RE, self, |caps| {
                resolve_relative_range(&caps["unit"], today)
            }),
            Self::KeywordDate => leftmost([
                scan(text, &KEYWORD_ISO_RE, self, resolve_iso),
                scan(text, &KEYWORD_NUMERIC_RE, self, resolve_numeric_with_year),
            ]),
            Self::Weekday => scan(text, &WEEKDAY_RE, self, |caps| {
                resolve_weekday(&caps["weekday"], caps.name("next").is_some(), today)
            }),
            Self::RelativeDay => scan(text, &RELATIVE_DAY_RE, self, |caps| {
                resolve_relative_day(&caps[0], today)
            }),
            Self::IsoDate => scan(text, &ISO_RE, self, resolve_iso),
            Self::NumericWithYear => scan(text, &NUMERIC_WITH_YEAR_RE, self, resolve_numeric_with_year),
            Self::NumericWithoutYear => scan(text, &NUMERIC_WITHOUT_YEAR_RE, self, |caps| {
                resolve_numeric(&caps["first"], &caps["second"], today.year())
            }),
        }
    }

    /// Whether a match of this class already includes its leading keyword.
    pub const fn consumes_keyword(self) -> bool {
        matches!(self, Self::KeywordDate)
    }
}

/// Characters that may flank a date mention besides whitespace.
const BOUNDARY_PUNCTUATION: [char; 6] = [',', '.', '?', '!', ';', ':'];

fn is_boundary_char(c: char) -> bool {
    c.is_whitespace() || BOUNDARY_PUNCTUATION.contains(&c)
}

/// Whether the text before byte offset `start` ends at a token boundary.
pub(crate) fn is_leading_boundary(text: &str, start: usize) -> bool {
    text[..start].chars().next_back().is_none_or(is_boundary_char)
}

fn is_trailing_boundary(text: &str, end: usize) -> bool {
    text[end..].chars().next().is_none_or(is_boundary_char)
}

/// Walks every match of `re` left to right, including matches that overlap a
/// rejected one, and returns the first that is flanked by boundaries and
/// resolves to a real date.
fn scan<F>(text: &str, re: &Regex, class: PatternClass, mut resolve: F) -> Option<DateCandidate>
where
    F: FnMut(&Captures<'_>) -> Option<NaiveDate>,
{
    let mut from = 0;
    while from <= text.len() {
        let caps = re.captures_at(text, from)?;
        let whole = caps.get(0)?;
        let span: Range<usize> = whole.range();

        if is_leading_boundary(text, span.start) && is_trailing_boundary(text, span.end) {
            if let Some(date) = resolve(&caps) {
                return Some(DateCandidate {
                    span,
                    date,
                    consumed_keyword: class.consumes_keyword(),
                    class,
                });
            }
            tracing::trace!(
                candidate = whole.as_str(),
                ?class,
                "discarding candidate that is not a calendar date"
            );
        }

        from = span.start + text[span.start..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

fn leftmost<const N: usize>(candidates: [Option<DateCandidate>; N]) -> Option<DateCandidate> {
    candidates
        .into_iter()
        .flatten()
        .min_by_key(|candidate| candidate.span.start)
}

fn resolve_relative_range(unit: &str, today: NaiveDate) -> Option<NaiveDate> {
    match unit.to_ascii_lowercase().as_str() {
        "week" => next_weekday(today, Weekday::Mon),
        "month" => first_of_next_month(today),
        "year" => first_of_next_year(today),
        _ => None,
    }
}

/// A plain weekday is the next such day strictly after today; "next" adds a
/// further week on top of that.
fn resolve_weekday(name: &str, next: bool, today: NaiveDate) -> Option<NaiveDate> {
    let weekday: Weekday = name.parse().ok()?;
    let upcoming = next_weekday(today, weekday)?;
    if next {
        upcoming.checked_add_signed(Duration::try_days(7)?)
    } else {
        Some(upcoming)
    }
}

fn resolve_relative_day(word: &str, today: NaiveDate) -> Option<NaiveDate> {
    match word.to_ascii_lowercase().as_str() {
        "today" => Some(today),
        "tomorrow" => today.succ_opt(),
        _ => None,
    }
}

fn resolve_iso(caps: &Captures<'_>) -> Option<NaiveDate> {
    if caps["sep1"] != caps["sep2"] {
        return None;
    }
    let year = caps["year"].parse().ok()?;
    let month = caps["month"].parse().ok()?;
    let day = caps["day"].parse().ok()?;
    checked_date(year, month, day)
}

fn resolve_numeric_with_year(caps: &Captures<'_>) -> Option<NaiveDate> {
    let year = caps["year"].parse().ok()?;
    resolve_numeric(&caps["first"], &caps["second"], year)
}

/// Month-first unless the first group cannot be a month (> 12), in which
/// case the date is read day-first. `03/04` is therefore always March 4th.
fn resolve_numeric(first: &str, second: &str, year: i32) -> Option<NaiveDate> {
    let first: u32 = first.parse().ok()?;
    let second: u32 = second.parse().ok()?;
    let (month, day) = if first > 12 {
        (second, first)
    } else {
        (first, second)
    };
    checked_date(year, month, day)
}
