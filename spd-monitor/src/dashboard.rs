//! The plant dashboard: date range, report table and the two charts.

use crate::config::{Clock, SystemClock, Timings, DEFAULT_PAGE_SIZE};
use crate::fetch::{DataState, ReportFetcher};
use crate::notify::Notifier;
use crate::table::DataTable;
use spd_core::api::Backend;
use spd_core::report::{DatapointReport, REPORT_FIELDS};
use spd_data::chart::{energy_series, irradiation_series, ChartPoint};
use spd_data::sort::Column;
use std::rc::Rc;

/// Columns of the report table, all sortable.
pub fn report_columns() -> Vec<Column> {
    vec![
        Column::new("day", "Day"),
        Column::new("total_energy_expected", "Energy expected"),
        Column::new("total_energy_observed", "Energy observed"),
        Column::new("total_irradiation_expected", "Irradiation expected"),
        Column::new("total_irradiation_observed", "Irradiation observed"),
    ]
}

pub struct Dashboard<B, N> {
    fetcher: ReportFetcher<B, N>,
    table: DataTable<DatapointReport>,
}

impl<B: Backend + 'static, N: Notifier + 'static> Dashboard<B, N> {
    pub fn new(backend: B, notifier: N, timings: Timings) -> Self {
        Self::with_clock(backend, notifier, timings, Rc::new(SystemClock))
    }

    pub fn with_clock(backend: B, notifier: N, timings: Timings, clock: Rc<dyn Clock>) -> Self {
        Self {
            fetcher: ReportFetcher::with_clock(backend, notifier, timings, clock),
            table: DataTable::new(
                report_columns(),
                &REPORT_FIELDS,
                DEFAULT_PAGE_SIZE,
                timings.search_debounce,
            ),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.table.set_page_size(page_size);
        self
    }

    pub fn fetcher(&self) -> &ReportFetcher<B, N> {
        &self.fetcher
    }

    pub fn table(&self) -> &DataTable<DatapointReport> {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut DataTable<DatapointReport> {
        &mut self.table
    }

    pub fn state(&self) -> DataState {
        self.fetcher.state()
    }

    /// Copy the fetcher's current rows into the table.
    pub fn sync(&mut self) {
        self.table.set_items(self.fetcher.reports());
    }

    pub fn energy_chart(&self) -> Vec<ChartPoint> {
        energy_series(&self.fetcher.reports())
    }

    pub fn irradiation_chart(&self) -> Vec<ChartPoint> {
        irradiation_series(&self.fetcher.reports())
    }

    /// Fetch `plant_id` over `[start, end]` right away and show the result.
    pub async fn open(
        &mut self,
        plant_id: &str,
        start: chrono::NaiveDateTime,
        end: chrono::NaiveDateTime,
    ) -> DataState {
        let state = self.fetcher.load(plant_id, start, end).await;
        self.sync();
        state
    }

    /// Point the dashboard at `plant_id` over `[start, end]` without
    /// fetching.
    pub fn select(&mut self, plant_id: &str, start: chrono::NaiveDateTime, end: chrono::NaiveDateTime) {
        self.fetcher.set_selection(plant_id, start, end);
        self.sync();
    }

    pub async fn manual_update<F: FnOnce()>(&mut self, on_done: F) -> DataState {
        let state = self.fetcher.manual_update(on_done).await;
        self.sync();
        state
    }
}
