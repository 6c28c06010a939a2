//! The backend contract.
//!
//! Every data source (the REST service, the SQLite mock, test stubs)
//! implements [`Backend`]. Calls never panic across this boundary: each one
//! resolves to a payload or an [`ApiError`] the caller has to look at.

use crate::dates::{format_date, parse_date};
use crate::plant::{Plant, PlantDraft};
use crate::report::DatapointReport;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ApiResult<T> = Result<T, ApiError>;

/// Value-level failure of a backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Request rejected for its content (empty name, inverted range).
    Validation(String),
    /// The referenced plant does not exist (any more).
    NotFound(String),
    /// Network or backend failure; worth retrying later.
    Transport(String),
    /// The backend answered with something that could not be read.
    Decode(String),
}

impl ApiError {
    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation(msg)
            | ApiError::NotFound(msg)
            | ApiError::Transport(msg)
            | ApiError::Decode(msg) => msg,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    /// Malformed responses are programming/contract errors rather than
    /// ordinary failures, and abort whatever operation saw them.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ApiError::Decode(_))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Transport(msg) => write!(f, "Backend error: {}", msg),
            ApiError::Decode(msg) => write!(f, "Malformed response: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// One page of plants plus the total matching count.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlantPage {
    pub count: usize,
    pub items: Vec<Plant>,
    pub next_cursor: Option<String>,
    pub prev_cursor: Option<String>,
}

impl PlantPage {
    /// Page over an already-filtered collection; cursors are offsets.
    pub fn from_slice(all: &[Plant], limit: usize, offset: usize) -> Self {
        let count = all.len();
        let start = offset.min(count);
        let stop = offset.saturating_add(limit).min(count);
        Self {
            count,
            items: all[start..stop].to_vec(),
            next_cursor: (stop < count).then(|| stop.to_string()),
            prev_cursor: (start > 0).then(|| start.saturating_sub(limit).to_string()),
        }
    }
}

/// Request for one calendar month of report rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub plant_id: String,
    /// First day of the month, canonical form.
    pub date: String,
}

impl ReportRequest {
    pub fn for_month(plant_id: &str, month: NaiveDate) -> Self {
        Self {
            plant_id: plant_id.to_string(),
            date: format_date(&month),
        }
    }

    pub fn month(&self) -> anyhow::Result<NaiveDate> {
        parse_date(&self.date)
    }
}

/// Request to (re)generate report rows for a span of days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecomputeRequest {
    pub from_date: String,
    pub to_date: String,
    pub plant_id: String,
}

impl RecomputeRequest {
    pub fn new(plant_id: &str, from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from_date: format_date(&from),
            to_date: format_date(&to),
            plant_id: plant_id.to_string(),
        }
    }

    /// The parsed `(from, to)` span.
    pub fn span(&self) -> anyhow::Result<(NaiveDate, NaiveDate)> {
        Ok((parse_date(&self.from_date)?, parse_date(&self.to_date)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecomputeResponse {
    pub ok: bool,
}

/// Plant CRUD plus the report/recompute endpoints.
#[async_trait(?Send)]
pub trait Backend {
    /// Whether [`Backend::list_plants`] applies its search term itself.
    /// Callers fall back to a local cache when it does not.
    fn supports_search(&self) -> bool {
        true
    }

    async fn list_plants(
        &self,
        limit: usize,
        offset: usize,
        search: Option<&str>,
    ) -> ApiResult<PlantPage>;

    async fn get_plant(&self, uid: &str) -> ApiResult<Plant>;

    async fn create_plant(&self, draft: &PlantDraft) -> ApiResult<Plant>;

    async fn update_plant(&self, uid: &str, draft: &PlantDraft) -> ApiResult<Plant>;

    async fn delete_plant(&self, uid: &str) -> ApiResult<()>;

    /// Rows for the plant restricted to the requested calendar month;
    /// empty when nothing has been computed yet.
    async fn report_chunk(&self, request: &ReportRequest) -> ApiResult<Vec<DatapointReport>>;

    /// Fails with `Validation` when `from_date > to_date` and with
    /// `NotFound` for an unknown plant.
    async fn request_recompute(&self, request: &RecomputeRequest) -> ApiResult<RecomputeResponse>;
}
