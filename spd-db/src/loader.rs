//! Populating the mock database: demo plants and CSV imports.
//!
//! # CSV Formats
//!
//! - **Plants** (has headers): `uid,name`
//! - **Datapoints** (no headers): `plant_uid,day(YYYY-MM-DD),energy_expected,energy_observed,irradiation_expected,irradiation_observed`
//!   with blank magnitudes stored as NULL

use crate::Database;
use rusqlite::params;
use spd_core::dates::{format_date, parse_date};

/// Names of the plants a fresh demo database starts with.
pub const DEMO_PLANT_NAMES: [&str; 10] = [
    "Solar Plant Alpha",
    "Solar Plant Beta",
    "Solar Plant Gamma",
    "Solar Plant Delta",
    "Solar Plant Epsilon",
    "Solar Plant Zeta",
    "Solar Plant Eta",
    "Solar Plant Theta",
    "Solar Plant Iota",
    "Solar Plant Kappa",
];

fn magnitude(field: Option<&str>) -> anyhow::Result<Option<f64>> {
    match field.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Ok(Some(value.parse()?)),
    }
}

impl Database {
    /// Insert the demo plants when the database has none. Returns how many
    /// were added.
    pub fn seed_demo_plants(&self) -> anyhow::Result<usize> {
        if self.query_plants(1, 0, None)?.count > 0 {
            return Ok(0);
        }
        for name in DEMO_PLANT_NAMES {
            self.insert_plant(name)?;
        }
        log::info!("[SPD] loader: Seeded {} demo plants", DEMO_PLANT_NAMES.len());
        Ok(DEMO_PLANT_NAMES.len())
    }

    /// Load plants from a CSV string, replacing plants with the same uid.
    pub fn load_plants(&self, csv_data: &str) -> anyhow::Result<usize> {
        let conn = self.conn.borrow();
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_data.as_bytes());

        let mut count = 0;
        for result in rdr.records() {
            let r = result?;
            let uid = r.get(0).unwrap_or("").trim();
            let name = r.get(1).unwrap_or("").trim();
            if uid.is_empty() || name.is_empty() {
                continue;
            }
            conn.execute(
                "INSERT OR REPLACE INTO plants (uid, name) VALUES (?1, ?2)",
                params![uid, name],
            )?;
            count += 1;
        }
        log::info!("[SPD] loader: Loaded {} plants", count);
        Ok(count)
    }

    /// Load report rows from a CSV string. Rows with an invalid day are
    /// skipped; days are stored in canonical form.
    pub fn load_datapoints(&self, csv_data: &str) -> anyhow::Result<usize> {
        let conn = self.conn.borrow();
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(csv_data.as_bytes());

        let mut count = 0;
        let mut skipped = 0;
        for result in rdr.records() {
            let r = result?;
            let plant_uid = r.get(0).unwrap_or("").trim();
            let day = match parse_date(r.get(1).unwrap_or("")) {
                Ok(day) if !plant_uid.is_empty() => format_date(&day),
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            conn.execute(
                "INSERT OR REPLACE INTO datapoints
                 (plant_uid, day, total_energy_expected, total_energy_observed,
                  total_irradiation_expected, total_irradiation_observed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    plant_uid,
                    day,
                    magnitude(r.get(2))?,
                    magnitude(r.get(3))?,
                    magnitude(r.get(4))?,
                    magnitude(r.get(5))?,
                ],
            )?;
            count += 1;
        }
        log::info!(
            "[SPD] loader: Loaded {} datapoints, skipped {} invalid",
            count,
            skipped
        );
        Ok(count)
    }
}
