//! Calendar helpers for report ranges.
//!
//! Reports are computed backend-side one calendar month at a time, and the
//! dashboard never asks for (or shows) anything past today. Everything here
//! works on local naive dates: no timezone conversion happens anywhere.

use crate::date_range::{last_of_month, MonthRange};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

/// Canonical day format used on the wire and in report rows: "YYYY-MM-DD"
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Format a NaiveDate as "YYYY-MM-DD"
pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a date string in "YYYY-MM-DD" format
pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)?)
}

/// Current local wall-clock time.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// `date` at 00:00:00.000
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// `date` at 23:59:59.999
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + TimeDelta::milliseconds(MILLIS_PER_DAY - 1)
}

/// First-of-month dates for every calendar month from `start`'s month
/// through `end`'s month, ascending. Empty when `start > end`.
pub fn months_touched(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    MonthRange::new(start, end).collect()
}

/// Clamp `d` so it never exceeds the end of the day `now` falls on.
pub fn clamp_to(d: NaiveDateTime, now: NaiveDateTime) -> NaiveDateTime {
    d.min(end_of_day(now.date()))
}

/// [`clamp_to`] against the local clock.
pub fn clamp_to_today(d: NaiveDateTime) -> NaiveDateTime {
    clamp_to(d, now())
}

/// True when both dates fall in the same calendar month.
pub fn is_same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// Normalize a picked range against `now`.
///
/// Bounds are ordered and snapped to start-of-day / end-of-day, then both
/// are clamped so neither passes today. When the start lands in the current
/// month the end is additionally pulled down to `now`, so a "this month"
/// selection always means "up through now". Other months are left as
/// clamped.
pub fn normalize_selection_at(
    start: NaiveDateTime,
    end: NaiveDateTime,
    now: NaiveDateTime,
) -> (NaiveDateTime, NaiveDateTime) {
    let today = now.date();
    let (first, last) = if start.date() <= end.date() {
        (start.date(), end.date())
    } else {
        (end.date(), start.date())
    };

    let start = start_of_day(first.min(today));
    let mut end = clamp_to(end_of_day(last), now);
    if is_same_month(start.date(), today) {
        end = end.min(now);
    }
    (start, end)
}

/// [`normalize_selection_at`] against the local clock.
pub fn normalize_selection(start: NaiveDateTime, end: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    normalize_selection_at(start, end, now())
}

/// True when both bounds lie in the calendar month `now` falls in.
pub fn is_current_month(start: NaiveDate, end: NaiveDate, now: NaiveDateTime) -> bool {
    let today = now.date();
    is_same_month(start, today) && is_same_month(end, today)
}

/// "YYYY-MM-DD" for a single day, "YYYY-MM-DD to YYYY-MM-DD" otherwise.
pub fn display_range(start: &NaiveDate, end: &NaiveDate) -> String {
    if start == end {
        format_date(start)
    } else {
        format!("{} to {}", format_date(start), format_date(end))
    }
}

/// First of the current month (00:00) through today (23:59:59.999).
pub fn default_selection_at(now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let today = now.date();
    let first = today - TimeDelta::days(i64::from(today.day0()));
    (start_of_day(first), end_of_day(today))
}

/// A whole calendar month (`month` is 1-based), ending today when it is
/// the current month. None for an invalid year/month.
pub fn month_selection_at(
    year: i32,
    month: u32,
    now: NaiveDateTime,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let today = now.date();
    let last = if is_same_month(first, today) {
        today
    } else {
        last_of_month(first)
    };
    Some((start_of_day(first), end_of_day(last)))
}

/// True when `day` parses as a canonical date whose start of day lies in
/// `[start, end]`. Unparseable days are never in range.
pub fn day_in_range(day: &str, start: &NaiveDateTime, end: &NaiveDateTime) -> bool {
    match parse_date(day) {
        Ok(date) => {
            let at = start_of_day(date);
            at >= *start && at <= *end
        }
        Err(_) => false,
    }
}

/// The span a recompute for `month` should cover: the whole month, cut
/// off at today.
pub fn recompute_span(month: NaiveDate, now: NaiveDateTime) -> (NaiveDate, NaiveDate) {
    let to = last_of_month(month).min(now.date()).max(month);
    (month, to)
}
