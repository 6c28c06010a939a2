//! Typed queries and mutations over the mock database.
//!
//! Days are stored in canonical "YYYY-MM-DD" form, so string comparison
//! orders them chronologically.

use crate::models::ReportCoverage;
use crate::Database;
use chrono::NaiveDate;
use rand::Rng;
use rusqlite::{params, OptionalExtension, Row};
use spd_core::api::PlantPage;
use spd_core::date_range::{first_of_month, last_of_month, DateRange};
use spd_core::dates::format_date;
use spd_core::plant::Plant;
use spd_core::report::DatapointReport;

/// Escape `%`, `_` and `\` so a search term matches literally under
/// `LIKE ... ESCAPE '\'`.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn report_from_row(row: &Row<'_>) -> rusqlite::Result<DatapointReport> {
    Ok(DatapointReport {
        day: row.get(0)?,
        total_energy_expected: row.get(1)?,
        total_energy_observed: row.get(2)?,
        total_irradiation_expected: row.get(3)?,
        total_irradiation_observed: row.get(4)?,
    })
}

/// A value in the mock generator's range, `[800, 2300)`.
fn mock_magnitude<R: Rng>(rng: &mut R) -> f64 {
    rng.gen::<f64>() * 1500.0 + 800.0
}

impl Database {
    // ───────────────────── Plants ─────────────────────

    /// One page of plants in insertion order. `search` matches name or uid
    /// as a case-insensitive substring.
    pub fn query_plants(
        &self,
        limit: usize,
        offset: usize,
        search: Option<&str>,
    ) -> anyhow::Result<PlantPage> {
        let conn = self.conn.borrow();
        let pattern = like_pattern(search.map(str::trim).unwrap_or(""));
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM plants
             WHERE name LIKE ?1 ESCAPE '\\' OR uid LIKE ?1 ESCAPE '\\'",
            params![pattern],
            |row| row.get(0),
        )?;
        let mut stmt = conn.prepare(
            "SELECT uid, name FROM plants
             WHERE name LIKE ?1 ESCAPE '\\' OR uid LIKE ?1 ESCAPE '\\'
             ORDER BY rowid
             LIMIT ?2 OFFSET ?3",
        )?;
        let items = stmt
            .query_map(params![pattern, limit as i64, offset as i64], |row| {
                Ok(Plant {
                    uid: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::info!(
            "[SPD] query: query_plants returned {} of {} records",
            items.len(),
            count
        );

        let count = count as usize;
        let stop = offset + items.len();
        Ok(PlantPage {
            count,
            next_cursor: (stop < count).then(|| stop.to_string()),
            prev_cursor: (offset > 0).then(|| offset.saturating_sub(limit).to_string()),
            items,
        })
    }

    pub fn query_plant(&self, uid: &str) -> anyhow::Result<Option<Plant>> {
        let conn = self.conn.borrow();
        let plant = conn
            .query_row(
                "SELECT uid, name FROM plants WHERE uid = ?1",
                params![uid],
                |row| {
                    Ok(Plant {
                        uid: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(plant)
    }

    /// Insert a plant under a fresh random uid.
    pub fn insert_plant(&self, name: &str) -> anyhow::Result<Plant> {
        let plant = Plant {
            uid: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
        };
        self.conn.borrow().execute(
            "INSERT INTO plants (uid, name) VALUES (?1, ?2)",
            params![plant.uid, plant.name],
        )?;
        log::info!("[SPD] query: inserted plant {} ({})", plant.name, plant.uid);
        Ok(plant)
    }

    /// None when no plant has that uid.
    pub fn rename_plant(&self, uid: &str, name: &str) -> anyhow::Result<Option<Plant>> {
        let changed = self.conn.borrow().execute(
            "UPDATE plants SET name = ?2 WHERE uid = ?1",
            params![uid, name],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        Ok(Some(Plant {
            uid: uid.to_string(),
            name: name.to_string(),
        }))
    }

    /// Remove a plant and its report history. False when it did not exist.
    pub fn remove_plant(&self, uid: &str) -> anyhow::Result<bool> {
        let mut conn = self.conn.borrow_mut();
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM plants WHERE uid = ?1", params![uid])?;
        let rows = tx.execute("DELETE FROM datapoints WHERE plant_uid = ?1", params![uid])?;
        tx.commit()?;
        log::info!(
            "[SPD] query: deleted plant {} ({} datapoints)",
            uid,
            rows
        );
        Ok(removed > 0)
    }

    // ───────────────────── Reports ─────────────────────

    /// Stored rows for the calendar month containing `month`, by day.
    pub fn query_report_month(
        &self,
        plant_uid: &str,
        month: NaiveDate,
    ) -> anyhow::Result<Vec<DatapointReport>> {
        let first = format_date(&first_of_month(month));
        let last = format_date(&last_of_month(month));
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT day, total_energy_expected, total_energy_observed,
                    total_irradiation_expected, total_irradiation_observed
             FROM datapoints
             WHERE plant_uid = ?1 AND day >= ?2 AND day <= ?3
             ORDER BY day",
        )?;
        let rows = stmt
            .query_map(params![plant_uid, first, last], report_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        log::info!(
            "[SPD] query: query_report_month {} {} returned {} records",
            plant_uid,
            first,
            rows.len()
        );
        Ok(rows)
    }

    /// Insert or replace report rows for a plant.
    pub fn upsert_datapoints(&self, plant_uid: &str, rows: &[DatapointReport]) -> anyhow::Result<usize> {
        let mut conn = self.conn.borrow_mut();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO datapoints
                 (plant_uid, day, total_energy_expected, total_energy_observed,
                  total_irradiation_expected, total_irradiation_observed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for row in rows {
                stmt.execute(params![
                    plant_uid,
                    row.day,
                    row.total_energy_expected,
                    row.total_energy_observed,
                    row.total_irradiation_expected,
                    row.total_irradiation_observed,
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// (Re)compute every day in `[from, to]` with fresh mock magnitudes.
    pub fn generate_datapoints(
        &self,
        plant_uid: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<usize> {
        let mut rng = rand::thread_rng();
        let rows: Vec<DatapointReport> = DateRange(from, to)
            .map(|day| DatapointReport {
                day: format_date(&day),
                total_energy_expected: Some(mock_magnitude(&mut rng)),
                total_energy_observed: Some(mock_magnitude(&mut rng)),
                total_irradiation_expected: Some(mock_magnitude(&mut rng)),
                total_irradiation_observed: Some(mock_magnitude(&mut rng)),
            })
            .collect();
        let count = self.upsert_datapoints(plant_uid, &rows)?;
        log::info!(
            "[SPD] query: generated {} datapoints for {} ({} to {})",
            count,
            plant_uid,
            format_date(&from),
            format_date(&to)
        );
        Ok(count)
    }

    pub fn query_coverage(&self, plant_uid: &str) -> anyhow::Result<ReportCoverage> {
        let conn = self.conn.borrow();
        let (days, first_day, last_day): (i64, Option<String>, Option<String>) = conn.query_row(
            "SELECT COUNT(*), MIN(day), MAX(day) FROM datapoints WHERE plant_uid = ?1",
            params![plant_uid],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        Ok(ReportCoverage {
            plant_uid: plant_uid.to_string(),
            days: days as usize,
            first_day,
            last_day,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_db() -> Database {
        let db = Database::new().unwrap();
        for name in ["Solar Plant Alpha", "Solar Plant Beta", "Wind_Farm 100%"] {
            db.insert_plant(name).unwrap();
        }
        db
    }

    #[test]
    fn query_plants_pages_in_insertion_order() {
        let db = sample_db();
        let first = db.query_plants(2, 0, None).unwrap();
        assert_eq!(first.count, 3);
        assert_eq!(first.items[0].name, "Solar Plant Alpha");
        assert_eq!(first.next_cursor.as_deref(), Some("2"));
        assert_eq!(first.prev_cursor, None);

        let second = db.query_plants(2, 2, None).unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.next_cursor, None);
        assert_eq!(second.prev_cursor.as_deref(), Some("0"));
    }

    #[test]
    fn query_plants_search_is_literal_and_case_insensitive() {
        let db = sample_db();
        assert_eq!(db.query_plants(10, 0, Some("solar")).unwrap().count, 2);
        assert_eq!(db.query_plants(10, 0, Some("100%")).unwrap().count, 1);
        assert_eq!(db.query_plants(10, 0, Some("_")).unwrap().count, 1);
        assert_eq!(db.query_plants(10, 0, Some("   ")).unwrap().count, 3);
    }

    #[test]
    fn rename_and_delete_report_missing_plants() {
        let db = sample_db();
        assert!(db.rename_plant("nope", "X").unwrap().is_none());
        assert!(!db.remove_plant("nope").unwrap());

        let uid = db.query_plants(1, 0, None).unwrap().items[0].uid.clone();
        let renamed = db.rename_plant(&uid, "Renamed").unwrap().unwrap();
        assert_eq!(db.query_plant(&uid).unwrap(), Some(renamed));
        assert!(db.remove_plant(&uid).unwrap());
        assert_eq!(db.query_plant(&uid).unwrap(), None);
    }

    #[test]
    fn generated_datapoints_fill_the_span() {
        let db = sample_db();
        let uid = db.query_plants(1, 0, None).unwrap().items[0].uid.clone();
        assert_eq!(db.generate_datapoints(&uid, ymd(2025, 3, 30), ymd(2025, 4, 3)).unwrap(), 5);

        let april = db.query_report_month(&uid, ymd(2025, 4, 15)).unwrap();
        assert_eq!(april.len(), 3);
        assert_eq!(april[0].day, "2025-04-01");
        for row in &april {
            let v = row.total_energy_observed.unwrap();
            assert!((800.0..2300.0).contains(&v), "value {} out of range", v);
        }

        let coverage = db.query_coverage(&uid).unwrap();
        assert_eq!(coverage.days, 5);
        assert_eq!(coverage.first_day.as_deref(), Some("2025-03-30"));
        assert_eq!(coverage.last_day.as_deref(), Some("2025-04-03"));
    }

    #[test]
    fn regenerating_replaces_rows() {
        let db = sample_db();
        let uid = db.query_plants(1, 0, None).unwrap().items[0].uid.clone();
        db.generate_datapoints(&uid, ymd(2025, 4, 1), ymd(2025, 4, 10)).unwrap();
        db.generate_datapoints(&uid, ymd(2025, 4, 5), ymd(2025, 4, 12)).unwrap();
        assert_eq!(db.query_coverage(&uid).unwrap().days, 12);
    }

    #[test]
    fn delete_removes_history() {
        let db = sample_db();
        let uid = db.query_plants(1, 0, None).unwrap().items[0].uid.clone();
        db.generate_datapoints(&uid, ymd(2025, 4, 1), ymd(2025, 4, 10)).unwrap();
        db.remove_plant(&uid).unwrap();
        assert_eq!(db.query_coverage(&uid).unwrap().days, 0);
    }
}
