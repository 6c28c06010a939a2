//! An in-memory backend that records every call.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use spd_core::api::{
    ApiError, ApiResult, Backend, PlantPage, RecomputeRequest, RecomputeResponse, ReportRequest,
};
use spd_core::date_range::DateRange;
use spd_core::dates::format_date;
use spd_core::plant::{Plant, PlantDraft};
use spd_core::report::DatapointReport;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use crate::notify::{NoticeId, Notifier};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List { offset: usize, search: Option<String> },
    Get(String),
    Create(String),
    Update(String, String),
    Delete(String),
    Report(String),
    Recompute(String, String),
}

#[derive(Default)]
pub struct StubState {
    pub plants: Vec<Plant>,
    pub rows: HashMap<String, Vec<DatapointReport>>,
    pub native_search: bool,
    /// Recompute stores a full row for every day of the span.
    pub fill_on_recompute: bool,
    /// Report requests for these months fail with a transport error.
    pub failing_months: Vec<String>,
    /// Report requests answer with a decode error.
    pub malformed_reports: bool,
    pub report_delay: Duration,
    pub calls: Vec<Call>,
}

#[derive(Clone, Default)]
pub struct StubBackend {
    pub state: Rc<RefCell<StubState>>,
}

impl StubBackend {
    pub fn with_plants(names: &[&str]) -> Self {
        let stub = Self::default();
        stub.state.borrow_mut().plants = names
            .iter()
            .enumerate()
            .map(|(i, name)| Plant {
                uid: format!("p{}", i + 1),
                name: name.to_string(),
            })
            .collect();
        stub
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn report_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Report(date) => Some(date),
                _ => None,
            })
            .collect()
    }

    pub fn recompute_calls(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Recompute(from, to) => Some((from, to)),
                _ => None,
            })
            .collect()
    }

    pub fn list_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::List { .. }))
            .count()
    }

    /// Store computed rows for every day of `[from, to]`.
    pub fn fill(&self, plant_uid: &str, from: NaiveDate, to: NaiveDate) {
        let rows = DateRange(from, to).map(|day| full_row(&format_date(&day)));
        self.state
            .borrow_mut()
            .rows
            .entry(plant_uid.to_string())
            .or_default()
            .extend(rows);
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    fn known(&self, uid: &str) -> ApiResult<()> {
        if self.state.borrow().plants.iter().any(|p| p.uid == uid) {
            Ok(())
        } else {
            Err(ApiError::NotFound("Plant not found".into()))
        }
    }
}

pub fn full_row(day: &str) -> DatapointReport {
    DatapointReport {
        day: day.to_string(),
        total_energy_expected: Some(1000.0),
        total_energy_observed: Some(950.0),
        total_irradiation_expected: Some(1200.0),
        total_irradiation_observed: Some(1100.0),
    }
}

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    ymd(y, m, d).and_hms_opt(h, 0, 0).unwrap()
}

#[async_trait(?Send)]
impl Backend for StubBackend {
    fn supports_search(&self) -> bool {
        self.state.borrow().native_search
    }

    async fn list_plants(
        &self,
        limit: usize,
        offset: usize,
        search: Option<&str>,
    ) -> ApiResult<PlantPage> {
        self.record(Call::List {
            offset,
            search: search.map(str::to_string),
        });
        let state = self.state.borrow();
        let matching: Vec<Plant> = match search.filter(|_| state.native_search) {
            Some(term) => state
                .plants
                .iter()
                .filter(|p| p.name.to_lowercase().contains(&term.to_lowercase()))
                .cloned()
                .collect(),
            None => state.plants.clone(),
        };
        Ok(PlantPage::from_slice(&matching, limit, offset))
    }

    async fn get_plant(&self, uid: &str) -> ApiResult<Plant> {
        self.record(Call::Get(uid.to_string()));
        self.known(uid)?;
        let state = self.state.borrow();
        Ok(state.plants.iter().find(|p| p.uid == uid).cloned().unwrap())
    }

    async fn create_plant(&self, draft: &PlantDraft) -> ApiResult<Plant> {
        self.record(Call::Create(draft.name.clone()));
        let mut state = self.state.borrow_mut();
        let plant = Plant {
            uid: format!("p{}", state.plants.len() + 1),
            name: draft.name.clone(),
        };
        state.plants.push(plant.clone());
        Ok(plant)
    }

    async fn update_plant(&self, uid: &str, draft: &PlantDraft) -> ApiResult<Plant> {
        self.record(Call::Update(uid.to_string(), draft.name.clone()));
        self.known(uid)?;
        let mut state = self.state.borrow_mut();
        let plant = state.plants.iter_mut().find(|p| p.uid == uid).unwrap();
        plant.name = draft.name.clone();
        Ok(plant.clone())
    }

    async fn delete_plant(&self, uid: &str) -> ApiResult<()> {
        self.record(Call::Delete(uid.to_string()));
        self.known(uid)?;
        self.state.borrow_mut().plants.retain(|p| p.uid != uid);
        Ok(())
    }

    async fn report_chunk(&self, request: &ReportRequest) -> ApiResult<Vec<DatapointReport>> {
        self.record(Call::Report(request.date.clone()));
        let delay = self.state.borrow().report_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let state = self.state.borrow();
        if state.malformed_reports {
            return Err(ApiError::Decode("expected an array".into()));
        }
        if state.failing_months.contains(&request.date) {
            return Err(ApiError::Transport("Error: 503 Service Unavailable".into()));
        }
        let month_prefix = &request.date[..7];
        Ok(state
            .rows
            .get(&request.plant_id)
            .map(|rows| {
                rows.iter()
                    .filter(|r| r.day.starts_with(month_prefix))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn request_recompute(&self, request: &RecomputeRequest) -> ApiResult<RecomputeResponse> {
        self.record(Call::Recompute(request.from_date.clone(), request.to_date.clone()));
        let (from, to) = request
            .span()
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        if self.state.borrow().fill_on_recompute {
            self.fill(&request.plant_id, from, to);
        }
        Ok(RecomputeResponse { ok: true })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
    Pending(NoticeId, String),
    Dismissed(NoticeId),
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: RefCell<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|n| match n {
                Notice::Error(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.notices.borrow_mut().push(Notice::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.notices.borrow_mut().push(Notice::Error(message.to_string()));
    }

    fn pending(&self, message: &str) -> NoticeId {
        let mut notices = self.notices.borrow_mut();
        let id = notices.len() as NoticeId + 1;
        notices.push(Notice::Pending(id, message.to_string()));
        id
    }

    fn dismiss(&self, id: NoticeId) {
        self.notices.borrow_mut().push(Notice::Dismissed(id));
    }
}
