//! Calendar arithmetic with an explicit end-of-month clamp policy.
//!
//! Month shifts (a year is twelve of them) never carry overflow into the following month:
//! a day that does not exist in the target month is clamped to that month's
//! last day (Jan 31 + 1 month = Feb 28/29, Feb 29 + 1 year = Feb 28).

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Gregorian leap year rule.
pub const fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` (1-12) of `year`, or `None` for an invalid month.
pub const fn days_in_month(year: i32, month: u32) -> Option<u32> {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => Some(31),
        4 | 6 | 9 | 11 => Some(30),
        2 => Some(if is_leap_year(year) { 29 } else { 28 }),
        _ => None,
    }
}

/// Builds a date from loose numeric fields, rejecting anything that is not a
/// real Gregorian day.
pub fn checked_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let last = days_in_month(year, month)?;
    if day == 0 || day > last {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Shifts `date` by `months` calendar months, keeping the day of month and
/// clamping it to the last day of the target month.
pub fn add_months_clamped(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let index = (i64::from(date.year()) * 12 + i64::from(date.month0())).checked_add(months)?;
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = u32::try_from(index.rem_euclid(12)).ok()? + 1;
    let last = days_in_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, date.day().min(last))
}

/// The first date strictly after `from` that falls on `weekday`.
pub fn next_weekday(from: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    let target = i64::from(weekday.num_days_from_monday());
    let current = i64::from(from.weekday().num_days_from_monday());
    let ahead = match (target - current).rem_euclid(7) {
        0 => 7,
        n => n,
    };
    from.checked_add_signed(Duration::try_days(ahead)?)
}

/// The most recent date on or before `from` that falls on `weekday`.
pub fn previous_or_same_weekday(from: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    let target = i64::from(weekday.num_days_from_monday());
    let current = i64::from(from.weekday().num_days_from_monday());
    let back = (current - target).rem_euclid(7);
    from.checked_sub_signed(Duration::try_days(back)?)
}

/// First day of the month following `date`.
pub fn first_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    add_months_clamped(date.with_day(1)?, 1)
}

/// January 1st of the year following `date`.
pub fn first_of_next_year(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year().checked_add(1)?, 1, 1)
}

/// Whole calendar months from `from` to `to`, ignoring the day of month.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (i64::from(to.year()) - i64::from(from.year())) * 12 + i64::from(to.month())
        - i64::from(from.month())
}
