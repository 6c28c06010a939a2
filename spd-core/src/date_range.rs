use chrono::{Datelike, Months, NaiveDate, TimeDelta};
use std::mem::replace;

/// A date range iterator that yields each date from the start date
/// through the end date (inclusive).
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct DateRange(pub NaiveDate, pub NaiveDate);

impl Iterator for DateRange {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 > self.1 {
            return None;
        }
        match self.0.succ_opt() {
            Some(next) => Some(replace(&mut self.0, next)),
            None => {
                // NaiveDate::MAX has no successor, so exhaust by pulling the end back
                let current = self.0;
                self.1 = current.pred_opt()?;
                Some(current)
            }
        }
    }
}

/// A month range iterator that yields the first day of every calendar
/// month from the start date's month through the end date's month
/// (inclusive). Yields nothing when start is after end.
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct MonthRange {
    next: Option<NaiveDate>,
    last: NaiveDate,
}

impl MonthRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        let next = (start <= end).then(|| first_of_month(start));
        Self {
            next,
            last: first_of_month(end),
        }
    }
}

impl Iterator for MonthRange {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.filter(|month| *month <= self.last)?;
        self.next = current.checked_add_months(Months::new(1));
        Some(current)
    }
}

/// First day of the calendar month containing `date`.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - TimeDelta::days(i64::from(date.day0()))
}

/// Last day of the calendar month containing `date`.
pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}
