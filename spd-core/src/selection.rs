use crate::dates::{
    default_selection_at, display_range, is_same_month, months_touched, normalize_selection_at,
    now,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Selection-group identifier the range picker expects on every range.
pub const SELECTION_KEY: &str = "selection";

/// The dashboard's inclusive date range.
///
/// Always replaced wholesale, never mutated in place. Built through
/// [`DateRangeSelection::picked_at`], so `start <= end` and neither bound
/// passes today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRangeSelection {
    start: NaiveDateTime,
    end: NaiveDateTime,
    key: &'static str,
    /// The end was pulled down to "now" and should follow the clock.
    tracks_now: bool,
}

impl DateRangeSelection {
    /// First of the current month through the end of today.
    pub fn default_at(now: NaiveDateTime) -> Self {
        let (start, end) = default_selection_at(now);
        Self {
            start,
            end,
            key: SELECTION_KEY,
            tracks_now: false,
        }
    }

    /// A user pick, normalized against `now`.
    pub fn picked_at(start: NaiveDateTime, end: NaiveDateTime, now: NaiveDateTime) -> Self {
        let (start, end) = normalize_selection_at(start, end, now);
        Self {
            start,
            end,
            key: SELECTION_KEY,
            tracks_now: end == now && is_same_month(start.date(), now.date()),
        }
    }

    /// Re-anchor a current-month selection whose end was clamped to "now",
    /// so a later fetch does not keep a stale end bound. Other selections
    /// come back unchanged.
    pub fn refreshed_at(&self, now: NaiveDateTime) -> Self {
        if self.tracks_now && is_same_month(self.start.date(), now.date()) && now > self.end {
            Self {
                end: now,
                ..self.clone()
            }
        } else {
            self.clone()
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date()
    }

    /// First-of-month dates of every month the range touches.
    pub fn months(&self) -> Vec<NaiveDate> {
        months_touched(self.start_date(), self.end_date())
    }

    pub fn display(&self) -> String {
        display_range(&self.start_date(), &self.end_date())
    }
}

impl Default for DateRangeSelection {
    fn default() -> Self {
        Self::default_at(now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::end_of_day;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_default_covers_month_to_date() {
        let selection = DateRangeSelection::default_at(at(2025, 4, 20, 9));
        assert_eq!(selection.start(), at(2025, 4, 1, 0));
        assert_eq!(selection.end(), end_of_day(NaiveDate::from_ymd_opt(2025, 4, 20).unwrap()));
        assert_eq!(selection.key(), SELECTION_KEY);
        assert_eq!(selection.months().len(), 1);
    }

    #[test]
    fn test_picked_range_is_normalized() {
        let now = at(2025, 4, 20, 9);
        let selection = DateRangeSelection::picked_at(at(2025, 3, 10, 15), at(2025, 5, 2, 0), now);
        assert_eq!(selection.start(), at(2025, 3, 10, 0));
        assert_eq!(selection.end(), end_of_day(now.date()));
        assert_eq!(selection.display(), "2025-03-10 to 2025-04-20");
        assert_eq!(
            selection.months(),
            vec![
                NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
            ]
        );
    }

    #[test]
    fn test_current_month_end_follows_clock() {
        let picked_now = at(2025, 4, 20, 9);
        let selection = DateRangeSelection::picked_at(at(2025, 4, 1, 0), at(2025, 4, 30, 0), picked_now);
        assert_eq!(selection.end(), picked_now);

        let later = at(2025, 4, 21, 8);
        assert_eq!(selection.refreshed_at(later).end(), later);

        let past = DateRangeSelection::picked_at(at(2025, 3, 1, 0), at(2025, 3, 5, 0), picked_now);
        assert_eq!(past.refreshed_at(later), past);
    }
}
