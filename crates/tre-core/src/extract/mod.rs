//! Implicit date extraction from free-form task text.
//!
//! Finds at most one date mention in the text, resolves it against an
//! injected reference date, and splices the mention (plus an adjacent
//! connecting keyword such as "by" or "on") out of the text.
//!
//! ```
//! use chrono::NaiveDate;
//! use tre_core::extract;
//!
//! let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let result = extract("Call tomorrow at noon", today);
//! assert_eq!(result.date, NaiveDate::from_ymd_opt(2024, 1, 2));
//! assert_eq!(result.residual, "Call at noon");
//! ```

mod patterns;

use std::ops::Range;

use chrono::NaiveDate;
use serde::Serialize;

pub use patterns::PatternClass;

use patterns::is_leading_boundary;

/// Words that are removed together with a date mention they directly precede.
const CONNECTING_KEYWORDS: [&str; 5] = ["on", "due", "by", "at", "for"];

/// A resolved date mention inside the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateCandidate {
    /// Byte range of the mention in the source text.
    pub span: Range<usize>,
    /// The calendar date the mention resolves to.
    pub date: NaiveDate,
    /// Whether `span` already covers a leading keyword ("on", "due", "by").
    pub consumed_keyword: bool,
    /// Which pattern produced the mention.
    pub class: PatternClass,
}

/// Outcome of [`extract`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    /// The resolved date, if the text mentioned one.
    pub date: Option<NaiveDate>,
    /// The text with the winning mention removed, or the input unchanged.
    pub residual: String,
}

/// Finds the highest-priority date mention in `text`.
pub fn find_date(text: &str, today: NaiveDate) -> Option<DateCandidate> {
    PatternClass::PRIORITY
        .into_iter()
        .find_map(|class| class.find(text, today))
}

/// Extracts a date mention from `text`, resolving relative phrases against `today`.
///
/// When nothing matches, the date is `None` and the text is returned untouched.
pub fn extract(text: &str, today: NaiveDate) -> Extraction {
    let Some(candidate) = find_date(text, today) else {
        return Extraction {
            date: None,
            residual: text.to_string(),
        };
    };

    let removed = removal_span(text, &candidate);
    tracing::trace!(
        mention = &text[removed.clone()],
        date = %candidate.date,
        class = ?candidate.class,
        "extracted date mention"
    );

    Extraction {
        date: Some(candidate.date),
        residual: splice(text, removed),
    }
}

/// Widens the candidate span to the left to swallow a connecting keyword
/// separated from the mention only by whitespace.
fn removal_span(text: &str, candidate: &DateCandidate) -> Range<usize> {
    let span = candidate.span.clone();
    if candidate.consumed_keyword {
        return span;
    }

    let before = &text[..span.start];
    let trimmed = before.trim_end();
    if trimmed.len() == before.len() {
        return span;
    }

    let keyword_start = CONNECTING_KEYWORDS.iter().find_map(|keyword| {
        let start = trimmed.len().checked_sub(keyword.len())?;
        let tail = trimmed.get(start..)?;
        (tail.eq_ignore_ascii_case(keyword) && is_leading_boundary(text, start)).then_some(start)
    });

    match keyword_start {
        Some(start) => start..span.end,
        None => span,
    }
}

/// Removes `range` from `text` and collapses whitespace runs to single spaces.
fn splice(text: &str, range: Range<usize>) -> String {
    let joined = format!("{}{}", &text[..range.start], &text[range.end..]);
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}
