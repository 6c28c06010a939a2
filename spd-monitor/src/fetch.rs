//! Loading a plant's daily report for the selected date range.
//!
//! The backend serves reports one calendar month at a time, so a fetch asks
//! for every month the range touches, in order, then keeps the rows that
//! fall inside the range. A range that comes back with no rows at all gets
//! one automatic recompute (per month, clamped to today) and one retry;
//! whatever the retry returns is final.
//!
//! Plant and range changes are debounced. Each change starts a new
//! generation, and a fetch only commits its result if no newer change
//! happened while it was in flight.

use crate::config::{Clock, SystemClock, Timings};
use crate::notify::Notifier;
use crate::timer::Debouncer;
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use serde::Serialize;
use spd_core::api::{ApiError, ApiResult, Backend, RecomputeRequest, ReportRequest};
use spd_core::dates::recompute_span;
use spd_core::report::{filter_by_range, DatapointReport};
use spd_core::selection::DateRangeSelection;
use std::cell::RefCell;
use std::rc::Rc;

const FETCH_FAILED: &str = "Failed to fetch data report";
const NO_PLANT: &str = "No plant ID available";
const UPDATE_PENDING: &str = "Updating datapoints...";
const UPDATE_DONE: &str = "Datapoints updated for selected range";
const UPDATE_FAILED: &str = "Failed to update datapoints";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataState {
    Initial,
    Loading,
    Empty,
    Loaded,
}

#[derive(Debug)]
struct FetchContext {
    plant_id: Option<String>,
    range: DateRangeSelection,
    state: DataState,
    reports: Vec<DatapointReport>,
    /// Set once an automatic recompute ran for the current plant and range.
    auto_recomputed: bool,
    generation: u64,
}

/// What one fetch was started for.
#[derive(Debug, Clone)]
struct Ticket {
    plant_id: String,
    range: DateRangeSelection,
    generation: u64,
}

/// Rows gathered across the month chunks of one attempt.
struct Gathered {
    raw: usize,
    in_range: Vec<DatapointReport>,
}

struct Inner<B, N> {
    backend: B,
    notifier: N,
    timings: Timings,
    clock: Rc<dyn Clock>,
    ctx: RefCell<FetchContext>,
    fetch_timer: RefCell<Debouncer>,
}

/// Owns the report collection for the dashboard. Clones share state.
pub struct ReportFetcher<B, N> {
    inner: Rc<Inner<B, N>>,
}

impl<B, N> Clone for ReportFetcher<B, N> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<B: Backend + 'static, N: Notifier + 'static> ReportFetcher<B, N> {
    pub fn new(backend: B, notifier: N, timings: Timings) -> Self {
        Self::with_clock(backend, notifier, timings, Rc::new(SystemClock))
    }

    pub fn with_clock(backend: B, notifier: N, timings: Timings, clock: Rc<dyn Clock>) -> Self {
        let range = DateRangeSelection::default_at(clock.now());
        Self {
            inner: Rc::new(Inner {
                backend,
                notifier,
                timings,
                ctx: RefCell::new(FetchContext {
                    plant_id: None,
                    range,
                    state: DataState::Initial,
                    reports: Vec::new(),
                    auto_recomputed: false,
                    generation: 0,
                }),
                fetch_timer: RefCell::new(Debouncer::new(timings.fetch_debounce)),
                clock,
            }),
        }
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    pub fn state(&self) -> DataState {
        self.inner.ctx.borrow().state
    }

    pub fn reports(&self) -> Vec<DatapointReport> {
        self.inner.ctx.borrow().reports.clone()
    }

    pub fn range(&self) -> DateRangeSelection {
        self.inner.ctx.borrow().range.clone()
    }

    pub fn plant_id(&self) -> Option<String> {
        self.inner.ctx.borrow().plant_id.clone()
    }

    /// True while a debounced fetch is waiting to start.
    pub fn fetch_scheduled(&self) -> bool {
        self.inner.fetch_timer.borrow().is_pending()
    }

    /// Show `plant_id`'s report. Without a plant the report settles empty
    /// right away; otherwise a fetch starts after the debounce delay.
    /// Selecting the plant already shown does nothing.
    pub fn select_plant(&self, plant_id: Option<&str>) {
        let plant_id = plant_id.filter(|p| !p.is_empty()).map(str::to_string);
        {
            let ctx = self.inner.ctx.borrow();
            if ctx.state != DataState::Initial && ctx.plant_id == plant_id {
                return;
            }
        }
        self.begin_cycle(|ctx| ctx.plant_id = plant_id);
        if self.plant_id().is_some() {
            self.schedule_fetch();
        } else {
            self.inner.fetch_timer.borrow_mut().cancel();
            self.settle_without_plant();
        }
    }

    /// Replace the range with a normalized user pick. Refetches (debounced)
    /// when a plant is selected.
    pub fn select_range(&self, start: NaiveDateTime, end: NaiveDateTime) {
        let range = DateRangeSelection::picked_at(start, end, self.inner.clock.now());
        self.begin_cycle(|ctx| ctx.range = range);
        if self.plant_id().is_some() {
            self.schedule_fetch();
        }
    }

    /// Set plant and range together and fetch immediately, skipping the
    /// debounce. For callers that are not reacting to user input.
    pub async fn load(&self, plant_id: &str, start: NaiveDateTime, end: NaiveDateTime) -> DataState {
        self.set_selection(plant_id, start, end);
        self.fetch().await
    }

    /// Set plant and range together without fetching; any scheduled fetch
    /// is dropped.
    pub fn set_selection(&self, plant_id: &str, start: NaiveDateTime, end: NaiveDateTime) {
        self.inner.fetch_timer.borrow_mut().cancel();
        let range = DateRangeSelection::picked_at(start, end, self.inner.clock.now());
        let plant_id = Some(plant_id.to_string()).filter(|p| !p.is_empty());
        self.begin_cycle(|ctx| {
            ctx.plant_id = plant_id;
            ctx.range = range;
        });
    }

    /// New plant or range: a new generation, a fresh auto-recompute
    /// allowance, and a loading state until the next fetch settles.
    fn begin_cycle<F: FnOnce(&mut FetchContext)>(&self, change: F) {
        let mut ctx = self.inner.ctx.borrow_mut();
        change(&mut ctx);
        ctx.generation += 1;
        ctx.auto_recomputed = false;
        ctx.reports.clear();
        if ctx.plant_id.is_some() {
            ctx.state = DataState::Loading;
        }
    }

    fn schedule_fetch(&self) {
        let this = self.clone();
        self.inner.fetch_timer.borrow_mut().schedule(async move {
            this.fetch().await;
        });
    }

    fn settle_without_plant(&self) -> DataState {
        {
            let mut ctx = self.inner.ctx.borrow_mut();
            ctx.state = DataState::Empty;
            ctx.reports.clear();
        }
        self.inner.notifier.error(NO_PLANT);
        DataState::Empty
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        self.inner.ctx.borrow().generation == ticket.generation
    }

    /// Commit `state` and `reports` unless a newer cycle started meanwhile.
    fn commit(&self, ticket: &Ticket, state: DataState, reports: Vec<DatapointReport>) -> DataState {
        let mut ctx = self.inner.ctx.borrow_mut();
        if ctx.generation != ticket.generation {
            debug!(
                "[SPD] fetch: dropping stale result for {} (generation {} < {})",
                ticket.plant_id, ticket.generation, ctx.generation
            );
            return ctx.state;
        }
        if state == DataState::Loaded {
            ctx.auto_recomputed = false;
        }
        ctx.state = state;
        ctx.reports = reports;
        state
    }

    /// Load the current plant and range, recomputing once if the backend
    /// has nothing yet. Returns the state the fetch settled in.
    pub async fn fetch(&self) -> DataState {
        let ticket = {
            let mut ctx = self.inner.ctx.borrow_mut();
            ctx.range = ctx.range.refreshed_at(self.inner.clock.now());
            let plant_id = ctx.plant_id.clone();
            match plant_id {
                Some(plant_id) => {
                    ctx.state = DataState::Loading;
                    Ticket {
                        plant_id,
                        range: ctx.range.clone(),
                        generation: ctx.generation,
                    }
                }
                None => {
                    drop(ctx);
                    return self.settle_without_plant();
                }
            }
        };

        loop {
            let gathered = match self.gather(&ticket).await {
                Ok(gathered) => gathered,
                Err(e) => return self.abort(&ticket, FETCH_FAILED, &e),
            };
            if !gathered.in_range.is_empty() {
                info!(
                    "[SPD] fetch: {} rows for {} ({})",
                    gathered.in_range.len(),
                    ticket.plant_id,
                    ticket.range.display()
                );
                return self.commit(&ticket, DataState::Loaded, gathered.in_range);
            }

            let recompute = {
                let mut ctx = self.inner.ctx.borrow_mut();
                if ctx.generation != ticket.generation {
                    return ctx.state;
                }
                let first_time = gathered.raw == 0 && !ctx.auto_recomputed;
                if first_time {
                    ctx.auto_recomputed = true;
                }
                first_time
            };
            if !recompute {
                info!(
                    "[SPD] fetch: no rows for {} ({})",
                    ticket.plant_id,
                    ticket.range.display()
                );
                return self.commit(&ticket, DataState::Empty, Vec::new());
            }

            info!(
                "[SPD] fetch: nothing computed for {} ({}), requesting recompute",
                ticket.plant_id,
                ticket.range.display()
            );
            if let Err(e) = self.recompute(&ticket).await {
                return self.abort(&ticket, FETCH_FAILED, &e);
            }
            tokio::time::sleep(self.inner.timings.retry_delay).await;
            if !self.is_current(&ticket) {
                return self.state();
            }
        }
    }

    /// Ask for every month chunk in order. Ordinary failures count as an
    /// empty chunk; a malformed response aborts.
    async fn gather(&self, ticket: &Ticket) -> ApiResult<Gathered> {
        let mut rows = Vec::new();
        for month in ticket.range.months() {
            let request = ReportRequest::for_month(&ticket.plant_id, month);
            match self.inner.backend.report_chunk(&request).await {
                Ok(chunk) => rows.extend(chunk),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(
                    "[SPD] fetch: report chunk {} for {} failed: {}",
                    request.date, ticket.plant_id, e
                ),
            }
        }
        let raw = rows.len();
        let in_range = filter_by_range(rows, &ticket.range.start(), &ticket.range.end());
        debug!(
            "[SPD] fetch: {} rows received, {} in range",
            raw,
            in_range.len()
        );
        Ok(Gathered { raw, in_range })
    }

    /// One recompute per touched month, whole month clamped to today.
    /// Per-month failures are logged and skipped.
    async fn recompute(&self, ticket: &Ticket) -> ApiResult<usize> {
        let mut succeeded = 0;
        for (from, to) in update_spans(&ticket.range, self.inner.clock.now()) {
            let request = RecomputeRequest::new(&ticket.plant_id, from, to);
            match self.inner.backend.request_recompute(&request).await {
                Ok(response) if response.ok => succeeded += 1,
                Ok(_) => warn!(
                    "[SPD] fetch: recompute {}..{} not accepted",
                    request.from_date, request.to_date
                ),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(
                    "[SPD] fetch: recompute {}..{} failed: {}",
                    request.from_date, request.to_date, e
                ),
            }
        }
        Ok(succeeded)
    }

    fn abort(&self, ticket: &Ticket, message: &str, error: &ApiError) -> DataState {
        log::error!("[SPD] fetch: {} for {}: {}", message, ticket.plant_id, error);
        let state = self.commit(ticket, DataState::Empty, Vec::new());
        if self.is_current(ticket) {
            self.inner.notifier.error(message);
        }
        state
    }

    /// Recompute the whole selected range on request, then refetch.
    ///
    /// `on_done` runs once the recompute requests have all been answered,
    /// before the post-update delay and refetch.
    pub async fn manual_update<F: FnOnce()>(&self, on_done: F) -> DataState {
        let ticket = {
            let mut ctx = self.inner.ctx.borrow_mut();
            let plant_id = ctx.plant_id.clone();
            let Some(plant_id) = plant_id else {
                drop(ctx);
                self.inner.notifier.error(NO_PLANT);
                return self.state();
            };
            ctx.state = DataState::Loading;
            Ticket {
                plant_id,
                range: ctx.range.clone(),
                generation: ctx.generation,
            }
        };

        let notice = self.inner.notifier.pending(UPDATE_PENDING);
        let result = self.recompute(&ticket).await;
        self.inner.notifier.dismiss(notice);
        match result {
            Ok(succeeded) => {
                info!(
                    "[SPD] fetch: manual update recomputed {} month(s) for {}",
                    succeeded, ticket.plant_id
                );
                self.inner.notifier.success(UPDATE_DONE);
            }
            Err(e) => return self.abort(&ticket, UPDATE_FAILED, &e),
        }
        on_done();

        tokio::time::sleep(self.inner.timings.retry_delay).await;
        if !self.is_current(&ticket) {
            return self.state();
        }
        self.fetch().await
    }
}

/// The `(from, to)` days a manual update of `range` asks for, month by
/// month.
pub fn update_spans(range: &DateRangeSelection, now: NaiveDateTime) -> Vec<(NaiveDate, NaiveDate)> {
    range
        .months()
        .into_iter()
        .map(|month| recompute_span(month, now))
        .collect()
}
