//! Query result structs that have no counterpart in the service API.

use serde::Serialize;

/// How much report history is stored for one plant.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReportCoverage {
    pub plant_uid: String,
    pub days: usize,
    pub first_day: Option<String>,
    pub last_day: Option<String>,
}
