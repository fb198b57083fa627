//! Mock provider for testing without API access.
//!
//! Serves itineraries and bus line details either from recorded JSON
//! responses on disk or from domain values built in code, and counts the
//! line-detail fetches it answers.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::domain::{BusId, BusLineDetail, Coordinates, Itinerary};
use crate::planner::{DirectionsProvider, LineDetailProvider};

use super::convert::{convert_bus_lane_detail, convert_search_path};
use super::error::ProviderError;
use super::types::{BusLaneDetailResponse, SearchPathResponse};

/// Mock provider that serves canned data.
#[derive(Debug, Clone, Default)]
pub struct MockOdsayClient {
    itineraries: Arc<Vec<Itinerary>>,
    lines: Arc<HashMap<BusId, BusLineDetail>>,
    failing: Arc<HashSet<BusId>>,
    latency: Option<Duration>,
    fetches: Arc<AtomicUsize>,
}

impl MockOdsayClient {
    /// Build a mock from domain values.
    pub fn from_parts(itineraries: Vec<Itinerary>, lines: Vec<BusLineDetail>) -> Self {
        Self {
            itineraries: Arc::new(itineraries),
            lines: Arc::new(lines.into_iter().map(|l| (l.bus_id, l)).collect()),
            ..Self::default()
        }
    }

    /// Load recorded responses from a directory.
    ///
    /// Expects `paths.json` (a route search response) and optionally a
    /// `lanes/` directory of bus line detail responses named `{busID}.json`.
    pub fn from_dir(data_dir: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let data_dir = data_dir.as_ref();

        let search: SearchPathResponse = read_json(&data_dir.join("paths.json"))?;
        let itineraries = convert_search_path(&search)?;

        let mut lines = Vec::new();
        let lanes_dir = data_dir.join("lanes");
        if lanes_dir.is_dir() {
            let entries = std::fs::read_dir(&lanes_dir).map_err(|e| mock_error(&lanes_dir, e))?;
            for entry in entries {
                let path = entry.map_err(|e| mock_error(&lanes_dir, e))?.path();
                if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
                    continue;
                }
                let response: BusLaneDetailResponse = read_json(&path)?;
                lines.push(convert_bus_lane_detail(&response)?);
            }
        }

        Ok(Self::from_parts(itineraries, lines))
    }

    /// Make line-detail requests for `bus_id` fail with a server error.
    pub fn with_failure(mut self, bus_id: BusId) -> Self {
        Arc::make_mut(&mut self.failing).insert(bus_id);
        self
    }

    /// Delay every line-detail answer, to let concurrent requests overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of line-detail requests answered so far, failures included.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl LineDetailProvider for MockOdsayClient {
    async fn line_detail(&self, bus_id: BusId) -> Result<BusLineDetail, ProviderError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.failing.contains(&bus_id) {
            return Err(ProviderError::Api {
                status: 503,
                message: format!("mock failure for bus {bus_id}"),
            });
        }

        self.lines
            .get(&bus_id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("bus line {bus_id}")))
    }
}

impl DirectionsProvider for MockOdsayClient {
    async fn itineraries(
        &self,
        _origin: Coordinates,
        _destination: Coordinates,
    ) -> Result<Vec<Itinerary>, ProviderError> {
        Ok(self.itineraries.as_ref().clone())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ProviderError> {
    let json = std::fs::read_to_string(path).map_err(|e| mock_error(path, e))?;
    serde_json::from_str(&json).map_err(|e| ProviderError::Json {
        message: format!("{}: {e}", path.display()),
        body: None,
    })
}

fn mock_error(path: &Path, e: std::io::Error) -> ProviderError {
    ProviderError::Api {
        status: 0,
        message: format!("failed to read mock data {}: {e}", path.display()),
    }
}
