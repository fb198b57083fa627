//! Provider HTTP client.
//!
//! Provides async methods for the route search and bus line detail
//! endpoints. Handles authentication, bounded concurrency, timeouts,
//! bounded retries and conversion to domain types.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::domain::{BusId, BusLineDetail, Coordinates, Itinerary};
use crate::planner::{DirectionsProvider, LineDetailProvider};

use super::convert::{convert_bus_lane_detail, convert_search_path};
use super::error::ProviderError;
use super::types::{BusLaneDetailResponse, SearchPathResponse};

/// Default base URL for the provider API.
const DEFAULT_BASE_URL: &str = "https://api.odsay.com/v1/api";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Configuration for the provider client.
#[derive(Debug, Clone)]
pub struct OdsayConfig {
    /// API key, sent as the `apiKey` query parameter
    pub api_key: String,
    /// Base URL for the API (defaults to production)
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries after a transient failure
    pub max_retries: u32,
    /// Wait before the first retry; grows linearly with each attempt
    pub retry_backoff: Duration,
}

impl OdsayConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 10,
            max_retries: 2,
            retry_backoff: Duration::from_millis(250),
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the retry policy. `max_retries = 0` disables retrying.
    pub fn with_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff = backoff;
        self
    }
}

/// Provider API client.
///
/// Uses a semaphore to limit concurrent requests and avoid rate limiting.
#[derive(Debug, Clone)]
pub struct OdsayClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    semaphore: Arc<Semaphore>,
    max_retries: u32,
    retry_backoff: Duration,
}

impl OdsayClient {
    /// Create a new client with the given configuration.
    pub fn new(config: OdsayConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff,
        })
    }

    /// Search public transit itineraries between two points.
    ///
    /// Itineraries come back in the provider's order.
    pub async fn search_routes(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<Vec<Itinerary>, ProviderError> {
        let response: SearchPathResponse = self
            .get_json(
                "searchPubTransPathR",
                &[
                    ("SX", origin.x.to_string()),
                    ("SY", origin.y.to_string()),
                    ("EX", destination.x.to_string()),
                    ("EY", destination.y.to_string()),
                ],
            )
            .await?;

        Ok(convert_search_path(&response)?)
    }

    /// Get the full station sequence and timetable of a bus line.
    pub async fn bus_lane_detail(&self, bus_id: BusId) -> Result<BusLineDetail, ProviderError> {
        let response: BusLaneDetailResponse = self
            .get_json("busLaneDetail", &[("busID", bus_id.to_string())])
            .await?;

        Ok(convert_bus_lane_detail(&response)?)
    }

    /// GET an endpoint, retrying transient failures.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.get_once(endpoint, params).await {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(endpoint, attempt, "transient provider failure, retrying: {e}");
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
                result => return result,
            }
        }
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| ProviderError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(endpoint, "provider request");

        let response = self
            .http
            .get(&url)
            .query(&[("apiKey", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(endpoint.to_string()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(ProviderError::from_transport)?;
        parse_body(&body)
    }
}

/// Parse a response body, turning an `error` payload into an API error.
///
/// The provider reports failures with HTTP 200 and an `error` member that
/// is either an object or a one-element array of objects.
fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, ProviderError> {
    let json_error = |e: serde_json::Error| ProviderError::Json {
        message: e.to_string(),
        body: Some(body.chars().take(500).collect()),
    };

    let value: serde_json::Value = serde_json::from_str(body).map_err(json_error)?;

    if let Some(error) = value.get("error") {
        let error = error.get(0).unwrap_or(error);
        let code = error.get("code").map(|c| match c {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        let message = error
            .get("msg")
            .or_else(|| error.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        let status = code
            .as_deref()
            .and_then(|c| c.parse::<u16>().ok())
            .filter(|s| (100..600).contains(s))
            .unwrap_or(0);
        return Err(ProviderError::Api { status, message });
    }

    serde_json::from_value(value).map_err(json_error)
}

impl LineDetailProvider for OdsayClient {
    async fn line_detail(&self, bus_id: BusId) -> Result<BusLineDetail, ProviderError> {
        self.bus_lane_detail(bus_id).await
    }
}

impl DirectionsProvider for OdsayClient {
    async fn itineraries(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<Vec<Itinerary>, ProviderError> {
        self.search_routes(origin, destination).await
    }
}
