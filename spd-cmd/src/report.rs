//! `report` and `update`: a plant's daily report over a date range.

use crate::output::{render_table, write_csv};
use crate::RangeArgs;
use anyhow::{anyhow, bail, Context};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use log::info;
use spd_core::api::{ApiError, Backend};
use spd_core::date_range::first_of_month;
use spd_core::dates::{default_selection_at, end_of_day, month_selection_at, now, parse_date, start_of_day};
use spd_core::plant::Plant;
use spd_monitor::cache::PlantCache;
use spd_monitor::config::Timings;
use spd_monitor::dashboard::Dashboard;
use spd_monitor::fetch::DataState;
use spd_monitor::notify::LogNotifier;

/// Table options of the `report` command.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub search: Option<String>,
    pub sort: Option<String>,
    pub desc: bool,
    pub page: usize,
    pub page_size: usize,
    pub csv: Option<String>,
    pub chart: bool,
}

/// Find a plant by id, falling back to a case-insensitive exact name match.
pub async fn resolve_plant<B: Backend>(backend: &B, key: &str) -> anyhow::Result<Plant> {
    let key = key.trim();
    match backend.get_plant(key).await {
        Ok(plant) => return Ok(plant),
        Err(ApiError::NotFound(_)) => {}
        Err(e) => return Err(anyhow!("Failed to look up plant {}: {}", key, e)),
    }
    let mut cache = PlantCache::default();
    let plants = cache
        .ensure_fresh(backend)
        .await
        .map_err(|e| anyhow!("Failed to list plants: {}", e))?;
    plants
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(key))
        .cloned()
        .ok_or_else(|| anyhow!("No plant with id or name {:?}", key))
}

fn parse_month(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .with_context(|| format!("Invalid month {:?}, expected YYYY-MM", s))
}

/// The selection `range` asks for, as of `now`.
pub fn resolve_range(range: &RangeArgs, now: NaiveDateTime) -> anyhow::Result<(NaiveDateTime, NaiveDateTime)> {
    if let Some(month) = &range.month {
        let first = parse_month(month)?;
        return month_selection_at(first.year(), first.month(), now)
            .ok_or_else(|| anyhow!("Invalid month {:?}", month));
    }
    let (default_start, default_end) = default_selection_at(now);
    let to = range.to.as_deref().map(parse_date).transpose()?;
    let from = match (range.from.as_deref(), to) {
        (Some(from), _) => start_of_day(parse_date(from)?),
        (None, Some(to)) => start_of_day(first_of_month(to)),
        (None, None) => default_start,
    };
    let to = to.map(end_of_day).unwrap_or(default_end);
    Ok((from, to))
}

pub async fn run_report<B: Backend + 'static>(
    backend: B,
    plant: &str,
    range: &RangeArgs,
    options: &ReportOptions,
) -> anyhow::Result<()> {
    let plant = resolve_plant(&backend, plant).await?;
    let (start, end) = resolve_range(range, now())?;
    let mut dashboard = Dashboard::new(backend, LogNotifier::default(), Timings::default())
        .with_page_size(options.page_size);

    let state = dashboard.open(&plant.uid, start, end).await;
    println!("{} ({})", plant.name, plant.uid);
    println!("{}", dashboard.fetcher().range().display());
    if state != DataState::Loaded {
        println!("No data for the selected range");
        return Ok(());
    }

    let table = dashboard.table_mut();
    if let Some(term) = &options.search {
        table.search(term);
    }
    if let Some(key) = &options.sort {
        if !table.click_column(key) {
            bail!("Cannot sort by {:?}", key);
        }
        if options.desc {
            table.click_column(key);
        }
    }
    table.change_page(options.page);
    print!("{}", render_table(table.columns(), &table.view()));

    if let Some(path) = &options.csv {
        let rows = dashboard.fetcher().reports();
        write_csv(path, &rows)?;
        println!("Wrote {} rows to {}", rows.len(), path);
    }
    if options.chart {
        let charts = serde_json::json!({
            "energy": dashboard.energy_chart(),
            "irradiation": dashboard.irradiation_chart(),
        });
        println!("{}", serde_json::to_string_pretty(&charts)?);
    }
    Ok(())
}

pub async fn run_update<B: Backend + 'static>(backend: B, plant: &str, range: &RangeArgs) -> anyhow::Result<()> {
    let plant = resolve_plant(&backend, plant).await?;
    let (start, end) = resolve_range(range, now())?;
    let mut dashboard = Dashboard::new(backend, LogNotifier::default(), Timings::default());
    dashboard.select(&plant.uid, start, end);

    let range = dashboard.fetcher().range().display();
    info!("[SPD] update: recomputing {} for {}", range, plant.uid);
    let state = dashboard
        .manual_update(|| println!("Datapoints updated for {} ({})", plant.name, range))
        .await;
    match state {
        DataState::Loaded => println!("{} rows available", dashboard.table().view().total_items),
        _ => bail!("Update of {} left no data for {}", plant.name, range),
    }
    Ok(())
}
