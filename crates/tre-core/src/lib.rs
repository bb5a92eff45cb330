//! Temporal resolution engine.
//!
//! This crate contains the pure, deterministic date logic behind task
//! creation and calendar rendering:
//! - Extraction: finding an implicit date in free-form task text
//! - Expansion: turning a recurrence rule into concrete occurrences for a view
//! - Calendar arithmetic with an explicit end-of-month clamp policy
//!
//! Nothing here reads a clock; the reference date is always passed in.

pub mod calendar;
pub mod expand;
pub mod extract;
pub mod recurrence;
pub mod types;

pub use expand::{
    DEFAULT_MAX_OCCURRENCES, ExpandOptions, Occurrence, RecurringEvent, Window, expand,
    expand_many, expand_with, visible_occurrences,
};
pub use extract::{DateCandidate, Extraction, PatternClass, extract, find_date};
pub use recurrence::{RecurrenceRule, StoredRecurrenceRule, StoredWeekday};
pub use types::{Frequency, ValidationError};
