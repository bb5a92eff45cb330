//! Recurrence expansion into concrete occurrences within a query window.
//!
//! # Algorithm Summary
//!
//! 1. Map the rule to a fixed step: a number of days (daily, weekly,
//!    bi-weekly) or a number of calendar months (monthly, yearly).
//! 2. Occurrence `k` starts at `base.start + k * step`, always computed from
//!    the base event so a month-end clamp never shifts later occurrences.
//! 3. Skip straight to the first `k` that can reach the window, then walk
//!    forward until the cursor passes the window end or the rule's end date.
//! 4. Every occurrence keeps the base event's duration verbatim.
//!
//! The walk is bounded by an iteration cap derived from the window width,
//! so a malformed rule can only shorten the result, never hang.

use chrono::{Duration, NaiveDate, NaiveDateTime, Weekday};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::calendar::{add_months_clamped, months_between, previous_or_same_weekday};
use crate::recurrence::RecurrenceRule;
use crate::types::{Frequency, ValidationError};

/// Default hard ceiling on occurrences returned by one expansion.
pub const DEFAULT_MAX_OCCURRENCES: usize = 10_000;

/// One concrete instance of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occurrence {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Occurrence {
    pub const fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Length of the occurrence. Negative if the base event was stored inverted.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether any part of the occurrence falls inside `window`.
    pub fn overlaps(&self, window: &Window) -> bool {
        self.start <= window.end() && self.end >= window.start()
    }
}

/// An inclusive `[start, end]` range a calendar view renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl Window {
    /// Creates a window, rejecting one whose end precedes its start.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvertedWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// The single-day view containing `date`.
    pub fn day(date: NaiveDate) -> Result<Self, ValidationError> {
        Self::days(date, date, "day")
    }

    /// The seven-day view containing `date`, starting on `week_start`.
    pub fn week(date: NaiveDate, week_start: Weekday) -> Result<Self, ValidationError> {
        let out_of_range = || ValidationError::ViewOutOfRange {
            view: "week",
            value: date.to_string(),
        };
        let first = previous_or_same_weekday(date, week_start).ok_or_else(out_of_range)?;
        let last = first
            .checked_add_signed(Duration::days(6))
            .ok_or_else(out_of_range)?;
        Self::days(first, last, "week")
    }

    /// The month view for `year`/`month`.
    pub fn month(year: i32, month: u32) -> Result<Self, ValidationError> {
        let out_of_range = || ValidationError::ViewOutOfRange {
            view: "month",
            value: format!("{year:04}-{month:02}"),
        };
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(out_of_range)?;
        let last = add_months_clamped(first, 1)
            .and_then(|next| next.pred_opt())
            .ok_or_else(out_of_range)?;
        Self::days(first, last, "month")
    }

    /// Whole days from the start of `first` to the last instant of `last`.
    fn days(first: NaiveDate, last: NaiveDate, view: &'static str) -> Result<Self, ValidationError> {
        let end = last
            .and_hms_nano_opt(23, 59, 59, 999_999_999)
            .ok_or_else(|| ValidationError::ViewOutOfRange {
                view,
                value: last.to_string(),
            })?;
        Self::new(NaiveDateTime::from(first), end)
    }

    pub const fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub const fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Whether `instant` lies inside the window, both ends included.
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Tuning for [`expand_with`].
#[derive(Debug, Clone)]
pub struct ExpandOptions {
    /// Hard ceiling on occurrences returned, applied on top of the
    /// window-derived iteration cap.
    /// Default: 10000.
    pub max_occurrences: usize,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            max_occurrences: DEFAULT_MAX_OCCURRENCES,
        }
    }
}

/// Distance between consecutive occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Days(i64),
    Months(i64),
}

impl Step {
    /// `None` when the rule cannot produce occurrences.
    fn for_rule(rule: &RecurrenceRule) -> Option<Self> {
        let interval = i64::from(rule.effective_interval());
        match rule.frequency {
            Frequency::None => None,
            Frequency::Daily => Some(Self::Days(interval)),
            Frequency::Weekly => {
                if rule.days_of_week.as_ref().is_some_and(Vec::is_empty) {
                    return None;
                }
                Some(Self::Days(7 * interval))
            }
            Frequency::BiWeekly => Some(Self::Days(14 * interval)),
            Frequency::Monthly => Some(Self::Months(interval)),
            Frequency::Yearly => Some(Self::Months(12 * interval)),
        }
    }

    /// Start of occurrence `index`, measured from the anchor.
    fn nth(self, anchor: NaiveDateTime, index: i64) -> Option<NaiveDateTime> {
        match self {
            Self::Days(days) => {
                anchor.checked_add_signed(Duration::try_days(days.checked_mul(index)?)?)
            }
            Self::Months(months) => {
                let date = add_months_clamped(anchor.date(), months.checked_mul(index)?)?;
                Some(date.and_time(anchor.time()))
            }
        }
    }

    /// An index at or just before the first occurrence inside the window.
    fn first_index(self, anchor: NaiveDateTime, window: &Window) -> i64 {
        if window.start() <= anchor {
            return 0;
        }
        match self {
            Self::Days(days) => (window.start() - anchor).num_days() / days,
            Self::Months(months) => months_between(anchor.date(), window.start().date()) / months,
        }
    }

    /// Upper bound on loop iterations for one window.
    ///
    /// One per step the window spans, plus the inclusive end point, plus
    /// slack for the occurrence skipped just before the window.
    fn iteration_cap(self, window: &Window) -> usize {
        let span = window.end() - window.start();
        let steps = match self {
            Self::Days(days) => {
                let whole_days = (span.num_seconds() + 86_399) / 86_400;
                (whole_days + days - 1) / days
            }
            Self::Months(months) => {
                (months_between(window.start().date(), window.end().date()) + months - 1) / months
            }
        };
        usize::try_from(steps).unwrap_or(0).saturating_add(3)
    }
}

/// Expands `base` under `rule` into the occurrences starting inside `window`
/// with default options.
///
/// A missing or non-recurring rule yields nothing: the caller decides
/// separately whether the base event itself is visible.
pub fn expand(base: &Occurrence, rule: Option<&RecurrenceRule>, window: &Window) -> Vec<Occurrence> {
    expand_with(base, rule, window, &ExpandOptions::default())
}

/// Expands `base` under `rule` into the occurrences starting inside `window`.
pub fn expand_with(
    base: &Occurrence,
    rule: Option<&RecurrenceRule>,
    window: &Window,
    options: &ExpandOptions,
) -> Vec<Occurrence> {
    let Some(rule) = rule else {
        return Vec::new();
    };
    let Some(step) = Step::for_rule(rule) else {
        return Vec::new();
    };

    let duration = base.duration();
    let cap = step.iteration_cap(window);
    let mut index = step.first_index(base.start, window);
    let mut occurrences = Vec::new();
    let mut hit_cap = true;

    for _ in 0..cap {
        let Some(start) = step.nth(base.start, index) else {
            hit_cap = false;
            break;
        };
        if start > window.end() || rule.end_date.is_some_and(|end| start.date() > end) {
            hit_cap = false;
            break;
        }
        if window.contains(start) {
            if occurrences.len() >= options.max_occurrences {
                tracing::debug!(
                    max = options.max_occurrences,
                    "occurrence limit reached, truncating expansion"
                );
                hit_cap = false;
                break;
            }
            let Some(end) = start.checked_add_signed(duration) else {
                hit_cap = false;
                break;
            };
            occurrences.push(Occurrence { start, end });
        }
        index += 1;
    }

    if hit_cap {
        tracing::debug!(cap, ?step, "iteration cap reached, returning partial expansion");
    }

    occurrences
}

/// Everything `base` shows inside `window`: the expansion for a recurring
/// rule, otherwise the base event itself when it overlaps the window.
pub fn visible_occurrences(
    base: &Occurrence,
    rule: Option<&RecurrenceRule>,
    window: &Window,
    options: &ExpandOptions,
) -> Vec<Occurrence> {
    if rule.and_then(Step::for_rule).is_some() {
        return expand_with(base, rule, window, options);
    }
    if rule.is_some_and(|rule| rule.frequency.is_recurring()) {
        // Weekly rule with an explicitly empty weekday set
        return Vec::new();
    }
    if base.overlaps(window) {
        vec![*base]
    } else {
        Vec::new()
    }
}

/// A stored event paired with its optional recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringEvent {
    #[serde(flatten)]
    pub base: Occurrence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<RecurrenceRule>,
}

/// Resolves the visible occurrences of many events for one window in
/// parallel. The result is indexed like `events`.
pub fn expand_many(
    events: &[RecurringEvent],
    window: &Window,
    options: &ExpandOptions,
) -> Vec<Vec<Occurrence>> {
    events
        .par_iter()
        .map(|event| visible_occurrences(&event.base, event.rule.as_ref(), window, options))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveTime;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(h, min, 0).unwrap())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn meeting(y: i32, m: u32, d: u32) -> Occurrence {
        Occurrence::new(at(y, m, d, 9, 0), at(y, m, d, 10, 30))
    }

    fn starts(occurrences: &[Occurrence]) -> Vec<NaiveDate> {
        occurrences.iter().map(|o| o.start.date()).collect()
    }

    #[test]
    fn window_rejects_inverted_range() {
        let err = Window::new(at(2024, 1, 2, 0, 0), at(2024, 1, 1, 0, 0)).unwrap_err();
        assert!(matches!(err, ValidationError::InvertedWindow { .. }));
    }

    #[test]
    fn day_window_covers_whole_day() {
        let window = Window::day(date(2024, 1, 1)).unwrap();
        assert_eq!(window.start(), at(2024, 1, 1, 0, 0));
        assert!(window.contains(at(2024, 1, 1, 23, 59)));
        assert!(!window.contains(at(2024, 1, 2, 0, 0)));
    }

    #[test]
    fn week_window_starts_on_requested_weekday() {
        // 2024-01-03 is a Wednesday
        let monday = Window::week(date(2024, 1, 3), Weekday::Mon).unwrap();
        assert_eq!(monday.start(), at(2024, 1, 1, 0, 0));
        assert_eq!(monday.end().date(), date(2024, 1, 7));

        let sunday = Window::week(date(2024, 1, 3), Weekday::Sun).unwrap();
        assert_eq!(sunday.start(), at(2023, 12, 31, 0, 0));
        assert_eq!(sunday.end().date(), date(2024, 1, 6));
    }

    #[test]
    fn month_window_spans_calendar_month() {
        let window = Window::month(2024, 2).unwrap();
        assert_eq!(window.start(), at(2024, 2, 1, 0, 0));
        assert_eq!(window.end().date(), date(2024, 2, 29));
        assert!(Window::month(2024, 13).is_err());
    }

    #[test]
    fn no_rule_or_none_frequency_yields_nothing() {
        let base = meeting(2024, 1, 1);
        let window = Window::month(2024, 1).unwrap();
        assert!(expand(&base, None, &window).is_empty());
        let rule = RecurrenceRule::new(Frequency::None);
        assert!(expand(&base, Some(&rule), &window).is_empty());
    }

    #[test]
    fn daily_preserves_duration() {
        let base = meeting(2024, 1, 1);
        let rule = RecurrenceRule::new(Frequency::Daily);
        let window = Window::new(at(2024, 1, 1, 0, 0), at(2024, 1, 5, 23, 59)).unwrap();
        let occurrences = expand(&base, Some(&rule), &window);
        assert_eq!(occurrences.len(), 5);
        for occurrence in &occurrences {
            assert_eq!(occurrence.duration(), Duration::minutes(90));
        }
        assert_eq!(occurrences[4].start, at(2024, 1, 5, 9, 0));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let base = meeting(2024, 1, 1);
        let rule = RecurrenceRule::new(Frequency::Daily);
        let window = Window::new(at(2024, 1, 2, 9, 0), at(2024, 1, 3, 9, 0)).unwrap();
        assert_eq!(
            starts(&expand(&base, Some(&rule), &window)),
            vec![date(2024, 1, 2), date(2024, 1, 3)]
        );
    }

    #[test]
    fn weekly_and_biweekly_steps() {
        let base = meeting(2024, 1, 1);
        let window = Window::month(2024, 1).unwrap();

        let weekly = RecurrenceRule::new(Frequency::Weekly);
        assert_eq!(
            starts(&expand(&base, Some(&weekly), &window)),
            vec![
                date(2024, 1, 1),
                date(2024, 1, 8),
                date(2024, 1, 15),
                date(2024, 1, 22),
                date(2024, 1, 29)
            ]
        );

        let biweekly = RecurrenceRule::new(Frequency::BiWeekly);
        assert_eq!(
            starts(&expand(&base, Some(&biweekly), &window)),
            vec![date(2024, 1, 1), date(2024, 1, 15), date(2024, 1, 29)]
        );
    }

    #[test]
    fn interval_multiplies_step() {
        let base = meeting(2024, 1, 1);
        let window = Window::month(2024, 1).unwrap();
        let rule = RecurrenceRule::new(Frequency::Weekly).with_interval(2);
        assert_eq!(
            starts(&expand(&base, Some(&rule), &window)),
            vec![date(2024, 1, 1), date(2024, 1, 15), date(2024, 1, 29)]
        );

        let rule = RecurrenceRule::new(Frequency::Daily).with_interval(10);
        assert_eq!(
            starts(&expand(&base, Some(&rule), &window)),
            vec![date(2024, 1, 1), date(2024, 1, 11), date(2024, 1, 21), date(2024, 1, 31)]
        );
    }

    #[test]
    fn weekly_ignores_non_empty_weekday_set() {
        let base = meeting(2024, 1, 1);
        let window = Window::week(date(2024, 1, 8), Weekday::Mon).unwrap();
        let rule = RecurrenceRule::new(Frequency::Weekly)
            .with_days_of_week([Weekday::Tue, Weekday::Thu]);
        assert_eq!(starts(&expand(&base, Some(&rule), &window)), vec![date(2024, 1, 8)]);
    }

    #[test]
    fn weekly_with_empty_weekday_set_yields_nothing() {
        let base = meeting(2024, 1, 1);
        let window = Window::month(2024, 1).unwrap();
        let rule = RecurrenceRule::new(Frequency::Weekly).with_days_of_week([]);
        assert!(expand(&base, Some(&rule), &window).is_empty());
        let options = ExpandOptions::default();
        assert!(visible_occurrences(&base, Some(&rule), &window, &options).is_empty());
    }

    #[test]
    fn monthly_clamps_without_drifting() {
        let base = meeting(2024, 1, 31);
        let rule = RecurrenceRule::new(Frequency::Monthly);
        let window = Window::new(at(2024, 1, 1, 0, 0), at(2024, 6, 30, 23, 59)).unwrap();
        assert_eq!(
            starts(&expand(&base, Some(&rule), &window)),
            vec![
                date(2024, 1, 31),
                date(2024, 2, 29),
                date(2024, 3, 31),
                date(2024, 4, 30),
                date(2024, 5, 31),
                date(2024, 6, 30)
            ]
        );
    }

    #[test]
    fn yearly_clamps_leap_day() {
        let base = meeting(2024, 2, 29);
        let rule = RecurrenceRule::new(Frequency::Yearly);
        let window = Window::new(at(2024, 1, 1, 0, 0), at(2028, 12, 31, 0, 0)).unwrap();
        assert_eq!(
            starts(&expand(&base, Some(&rule), &window)),
            vec![
                date(2024, 2, 29),
                date(2025, 2, 28),
                date(2026, 2, 28),
                date(2027, 2, 28),
                date(2028, 2, 29)
            ]
        );
    }

    #[test]
    fn distant_base_is_fast_forwarded() {
        let base = meeting(2000, 1, 1);
        let rule = RecurrenceRule::new(Frequency::Daily);
        let window = Window::day(date(2024, 7, 4)).unwrap();
        let occurrences = expand(&base, Some(&rule), &window);
        assert_eq!(occurrences, vec![meeting(2024, 7, 4)]);

        let rule = RecurrenceRule::new(Frequency::Monthly).with_interval(5);
        // 2000-01 + 295 months = 2024-08
        let window = Window::month(2024, 8).unwrap();
        assert_eq!(starts(&expand(&base, Some(&rule), &window)), vec![date(2024, 8, 1)]);
    }

    #[test]
    fn nothing_before_base_start() {
        let base = meeting(2024, 1, 15);
        let rule = RecurrenceRule::new(Frequency::Daily);
        let window = Window::new(at(2024, 1, 10, 0, 0), at(2024, 1, 16, 23, 59)).unwrap();
        assert_eq!(
            starts(&expand(&base, Some(&rule), &window)),
            vec![date(2024, 1, 15), date(2024, 1, 16)]
        );
    }

    #[test]
    fn end_date_is_inclusive_and_stops_expansion() {
        let base = meeting(2024, 1, 1);
        let rule = RecurrenceRule::new(Frequency::Daily).with_end_date(date(2024, 1, 3));
        let window = Window::month(2024, 1).unwrap();
        assert_eq!(
            starts(&expand(&base, Some(&rule), &window)),
            vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]
        );
    }

    #[test]
    fn end_date_before_base_yields_nothing() {
        let base = meeting(2024, 1, 10);
        let rule = RecurrenceRule::new(Frequency::Daily).with_end_date(date(2024, 1, 1));
        let window = Window::month(2024, 1).unwrap();
        assert!(expand(&base, Some(&rule), &window).is_empty());
    }

    #[test]
    fn max_occurrences_truncates() {
        let base = meeting(2024, 1, 1);
        let rule = RecurrenceRule::new(Frequency::Daily);
        let window = Window::month(2024, 1).unwrap();
        let options = ExpandOptions { max_occurrences: 3 };
        assert_eq!(expand_with(&base, Some(&rule), &window, &options).len(), 3);
    }

    #[test]
    fn iteration_cap_covers_window() {
        let window = Window::new(at(2024, 1, 1, 0, 0), at(2024, 1, 11, 0, 0)).unwrap();
        assert_eq!(Step::Days(1).iteration_cap(&window), 13);
        assert_eq!(Step::Days(7).iteration_cap(&window), 5);
        let window = Window::month(2024, 3).unwrap();
        assert_eq!(Step::Months(1).iteration_cap(&window), 3);
    }

    #[test]
    fn visible_occurrences_for_single_event() {
        let base = meeting(2024, 1, 10);
        let options = ExpandOptions::default();
        let inside = Window::month(2024, 1).unwrap();
        let outside = Window::month(2024, 2).unwrap();
        assert_eq!(visible_occurrences(&base, None, &inside, &options), vec![base]);
        assert!(visible_occurrences(&base, None, &outside, &options).is_empty());
    }

    #[test]
    fn overlap_catches_events_spanning_window_start() {
        let overnight = Occurrence::new(at(2024, 1, 1, 22, 0), at(2024, 1, 2, 2, 0));
        let window = Window::day(date(2024, 1, 2)).unwrap();
        assert!(overnight.overlaps(&window));
        assert!(!overnight.overlaps(&Window::day(date(2024, 1, 3)).unwrap()));
    }

    #[test]
    fn expand_many_preserves_input_order() {
        let window = Window::month(2024, 1).unwrap();
        let events = vec![
            RecurringEvent {
                base: meeting(2024, 1, 1),
                rule: Some(RecurrenceRule::new(Frequency::Weekly)),
            },
            RecurringEvent {
                base: meeting(2024, 1, 20),
                rule: None,
            },
            RecurringEvent {
                base: meeting(2023, 12, 1),
                rule: None,
            },
        ];
        let results = expand_many(&events, &window, &ExpandOptions::default());
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].len(), 5);
        assert_eq!(results[1], vec![meeting(2024, 1, 20)]);
        assert!(results[2].is_empty());
    }

    #[test]
    fn recurring_event_reads_stored_json() {
        let json = r#"{
            "start": "2024-01-31T09:00:00",
            "end": "2024-01-31T10:30:00",
            "rule": {"frequency": "monthly"}
        }"#;
        let event: RecurringEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.base, meeting(2024, 1, 31));
        assert_eq!(event.rule, Some(RecurrenceRule::new(Frequency::Monthly)));
    }

    #[test]
    fn recurring_event_survives_stray_rule_values() {
        let json = r#"{
            "start": "2024-01-01T09:00:00",
            "end": "2024-01-01T10:30:00",
            "rule": {"frequency": "weekly", "interval": "2", "daysOfWeek": ["monday", -1, null]}
        }"#;
        let event: RecurringEvent = serde_json::from_str(json).unwrap();
        let rule = event.rule.as_ref().unwrap();
        assert_eq!(rule.interval, 2);
        assert_eq!(rule.days_of_week, Some(vec![Weekday::Mon]));

        let window = Window::month(2024, 1).unwrap();
        assert_eq!(
            starts(&expand(&event.base, event.rule.as_ref(), &window)),
            vec![date(2024, 1, 1), date(2024, 1, 15), date(2024, 1, 29)]
        );
    }
}
