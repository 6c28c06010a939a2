//! Expected-vs-observed line series for the two report charts.

use serde::Serialize;
use spd_core::report::DatapointReport;

/// One x position on a chart. Missing magnitudes are charted as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub day: String,
    pub expected: f64,
    pub observed: f64,
}

fn series<F>(reports: &[DatapointReport], pick: F) -> Vec<ChartPoint>
where
    F: Fn(&DatapointReport) -> (Option<f64>, Option<f64>),
{
    let mut points: Vec<ChartPoint> = reports
        .iter()
        .map(|r| {
            let (expected, observed) = pick(r);
            ChartPoint {
                day: r.day.clone(),
                expected: expected.unwrap_or(0.0),
                observed: observed.unwrap_or(0.0),
            }
        })
        .collect();
    points.sort_by(|a, b| a.day.cmp(&b.day));
    points
}

pub fn energy_series(reports: &[DatapointReport]) -> Vec<ChartPoint> {
    series(reports, |r| (r.total_energy_expected, r.total_energy_observed))
}

pub fn irradiation_series(reports: &[DatapointReport]) -> Vec<ChartPoint> {
    series(reports, |r| {
        (r.total_irradiation_expected, r.total_irradiation_observed)
    })
}
