use crate::dates::{day_in_range, parse_date};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Field keys of a report row, in column order.
pub const REPORT_FIELDS: [&str; 5] = [
    "day",
    "total_energy_expected",
    "total_energy_observed",
    "total_irradiation_expected",
    "total_irradiation_observed",
];

/// One day's expected vs. observed totals for a plant.
///
/// Magnitudes the backend has not computed yet are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatapointReport {
    /// Canonical "YYYY-MM-DD"; unique within one plant's history.
    pub day: String,
    #[serde(default)]
    pub total_energy_expected: Option<f64>,
    #[serde(default)]
    pub total_energy_observed: Option<f64>,
    #[serde(default)]
    pub total_irradiation_expected: Option<f64>,
    #[serde(default)]
    pub total_irradiation_observed: Option<f64>,
}

impl DatapointReport {
    /// A row for `day` with nothing computed yet.
    pub fn pending(day: impl Into<String>) -> Self {
        Self {
            day: day.into(),
            total_energy_expected: None,
            total_energy_observed: None,
            total_irradiation_expected: None,
            total_irradiation_observed: None,
        }
    }

    /// The parsed day, if it is a valid canonical date.
    pub fn date(&self) -> Option<NaiveDate> {
        parse_date(&self.day).ok()
    }
}

/// Keep the rows whose day falls inside `[start, end]`, dropping rows with
/// unparseable days.
pub fn filter_by_range(
    rows: Vec<DatapointReport>,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> Vec<DatapointReport> {
    rows.into_iter()
        .filter(|row| day_in_range(&row.day, start, end))
        .collect()
}
