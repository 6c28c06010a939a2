//! REST client for the plant/report service.
//!
//! Endpoints:
//! - `GET /plants` (bare array or `{count, next, previous, results}`)
//! - `GET|PUT|DELETE /plants/{uid}`, `POST /plants`
//! - `POST /datapoints/report` with `{plant_id, date}`
//! - `POST /datapoints/update` with `{from_date, to_date, plant_id}`

use crate::api::{
    ApiError, ApiResult, Backend, PlantPage, RecomputeRequest, RecomputeResponse, ReportRequest,
};
use crate::plant::{Plant, PlantDraft};
use crate::report::DatapointReport;
use async_trait::async_trait;
use log::{info, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Where the service listens in a default local setup.
pub const DEFAULT_API_URL: &str = "http://localhost:5001";

const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// Attempts per idempotent read unless configured otherwise.
pub const DEFAULT_MAX_TRIES: u32 = 3;
const INITIAL_BACKOFF_MILLIS: u64 = 1000;

/// `GET /plants` answers either with a paged envelope or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum PlantListing {
    Paged {
        count: usize,
        next: Option<String>,
        previous: Option<String>,
        results: Vec<Plant>,
    },
    Bare(Vec<Plant>),
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    native_search: bool,
    max_tries: u32,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            native_search: false,
            max_tries: DEFAULT_MAX_TRIES,
        })
    }

    /// Declare that the server filters `GET /plants` by `search` itself.
    pub fn with_native_search(mut self, native_search: bool) -> Self {
        self.native_search = native_search;
        self
    }

    /// Attempts per idempotent read before giving up (at least one).
    pub fn with_max_tries(mut self, max_tries: u32) -> Self {
        self.max_tries = max_tries.max(1);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send an idempotent request, retrying transport failures with
    /// exponential backoff.
    async fn send_with_retry<F>(&self, what: &str, build: F) -> ApiResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut sleep_millis = INITIAL_BACKOFF_MILLIS;
        let mut last_error = String::new();
        for attempt in 1..=self.max_tries {
            match build().send().await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    warn!(
                        "[SPD] http: attempt {}/{} for {} failed: {}",
                        attempt, self.max_tries, what, e
                    );
                    last_error = e.to_string();
                }
            }
            if attempt < self.max_tries {
                info!("[SPD] http: retrying {} in {} ms", what, sleep_millis);
                tokio::time::sleep(Duration::from_millis(sleep_millis)).await;
                sleep_millis *= 2;
            }
        }
        Err(ApiError::Transport(last_error))
    }

    async fn send_once(&self, request: RequestBuilder) -> ApiResult<Response> {
        request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))
    }
}

/// Map a non-2xx status to an error, preferring the body's `message`.
async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| body.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| {
            format!(
                "Error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or_default()
            )
            .trim_end()
            .to_string()
        });
    Err(match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation(message),
        _ => ApiError::Transport(message),
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let response = check_status(response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Decode(format!("Failed to parse response: {}", e)))
}

#[async_trait(?Send)]
impl Backend for HttpBackend {
    fn supports_search(&self) -> bool {
        self.native_search
    }

    async fn list_plants(
        &self,
        limit: usize,
        offset: usize,
        search: Option<&str>,
    ) -> ApiResult<PlantPage> {
        let url = self.url("/plants");
        let mut query = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
        if let Some(term) = search.filter(|t| !t.trim().is_empty()) {
            query.push(("search", term.to_string()));
        }
        let response = self
            .send_with_retry("plant list", || self.client.get(&url).query(&query))
            .await?;
        match read_json::<PlantListing>(response).await? {
            PlantListing::Paged {
                count,
                next,
                previous,
                results,
            } => Ok(PlantPage {
                count,
                items: results,
                next_cursor: next,
                prev_cursor: previous,
            }),
            PlantListing::Bare(all) => Ok(PlantPage::from_slice(&all, limit, offset)),
        }
    }

    async fn get_plant(&self, uid: &str) -> ApiResult<Plant> {
        let url = self.url(&format!("/plants/{}", uid));
        let response = self
            .send_with_retry("plant lookup", || self.client.get(&url))
            .await?;
        read_json(response).await
    }

    async fn create_plant(&self, draft: &PlantDraft) -> ApiResult<Plant> {
        let response = self
            .send_once(self.client.post(self.url("/plants")).json(draft))
            .await?;
        read_json(response).await
    }

    async fn update_plant(&self, uid: &str, draft: &PlantDraft) -> ApiResult<Plant> {
        let url = self.url(&format!("/plants/{}", uid));
        let response = self.send_once(self.client.put(url).json(draft)).await?;
        read_json(response).await
    }

    async fn delete_plant(&self, uid: &str) -> ApiResult<()> {
        let url = self.url(&format!("/plants/{}", uid));
        let response = self.send_once(self.client.delete(url)).await?;
        check_status(response).await.map(|_| ())
    }

    async fn report_chunk(&self, request: &ReportRequest) -> ApiResult<Vec<DatapointReport>> {
        let url = self.url("/datapoints/report");
        let response = self
            .send_with_retry("report chunk", || self.client.post(&url).json(request))
            .await?;
        read_json(response).await
    }

    async fn request_recompute(&self, request: &RecomputeRequest) -> ApiResult<RecomputeResponse> {
        let response = self
            .send_once(self.client.post(self.url("/datapoints/update")).json(request))
            .await?;
        read_json(response).await
    }
}
