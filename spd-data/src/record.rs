//! Field access by column key, shared by search and sort.

use spd_core::plant::Plant;
use spd_core::report::DatapointReport;
use std::borrow::Cow;

/// A non-null field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
}

impl FieldValue<'_> {
    /// The string form search matches against. Numbers use their plain
    /// decimal representation, no locale formatting.
    pub fn search_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(s) => Cow::Borrowed(s),
            FieldValue::Number(n) => Cow::Owned(n.to_string()),
        }
    }
}

/// A row whose fields can be looked up by key. `None` means null or an
/// unknown key.
pub trait Record {
    fn field(&self, key: &str) -> Option<FieldValue<'_>>;
}

impl Record for Plant {
    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "uid" | "id" => Some(FieldValue::Text(&self.uid)),
            "name" => Some(FieldValue::Text(&self.name)),
            _ => None,
        }
    }
}

impl Record for DatapointReport {
    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        let number = |v: Option<f64>| v.map(FieldValue::Number);
        match key {
            "day" => Some(FieldValue::Text(&self.day)),
            "total_energy_expected" => number(self.total_energy_expected),
            "total_energy_observed" => number(self.total_energy_observed),
            "total_irradiation_expected" => number(self.total_irradiation_expected),
            "total_irradiation_observed" => number(self.total_irradiation_observed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_search_text() {
        assert_eq!(FieldValue::Number(1000.0).search_text(), "1000");
        assert_eq!(FieldValue::Number(1234.5).search_text(), "1234.5");
        assert_eq!(FieldValue::Text("Alpha").search_text(), "Alpha");
    }

    #[test]
    fn test_report_fields() {
        let mut row = DatapointReport::pending("2025-04-01");
        row.total_energy_observed = Some(950.25);
        assert_eq!(row.field("day"), Some(FieldValue::Text("2025-04-01")));
        assert_eq!(row.field("total_energy_observed"), Some(FieldValue::Number(950.25)));
        assert_eq!(row.field("total_energy_expected"), None);
        assert_eq!(row.field("nonsense"), None);
    }
}
