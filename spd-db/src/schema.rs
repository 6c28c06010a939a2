//! SQL schema for the mock service database.

/// Tables:
/// - `plants`: one row per plant; listing order is insertion order (`rowid`)
/// - `datapoints`: one report row per plant and day, magnitudes nullable
pub fn create_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS plants (
        uid TEXT PRIMARY KEY,
        name TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS datapoints (
        plant_uid TEXT NOT NULL,
        day TEXT NOT NULL,
        total_energy_expected REAL,
        total_energy_observed REAL,
        total_irradiation_expected REAL,
        total_irradiation_observed REAL,
        PRIMARY KEY (plant_uid, day)
    );
    CREATE INDEX IF NOT EXISTS idx_datapoints_day ON datapoints(day);
    "#
}
