//! One planning request, end to end.
//!
//! Itineraries are expanded into candidate routes, enriched concurrently
//! (in order) through a request-scoped lookup cache, filtered for
//! completeness, scored and ranked.

use std::future::Future;

use chrono::NaiveDateTime;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::BusLookupCache;
use crate::domain::{Coordinates, Itinerary, Route};
use crate::history::HistoricalModels;
use crate::odsay::ProviderError;

use super::config::EngineConfig;
use super::enrich::{Enricher, LineDetailProvider};
use super::expand::{CandidateRoutes, expand_itinerary};
use super::rank::{RankMode, filter_complete, rank};
use super::score::apply_score;

/// Source of itineraries between two points.
pub trait DirectionsProvider {
    /// Itineraries in the provider's order.
    fn itineraries(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> impl Future<Output = Result<Vec<Itinerary>, ProviderError>> + Send;
}

/// Error failing a whole request.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("directions request failed: {0}")]
    Directions(#[from] ProviderError),
}

/// Diagnostics for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanReport {
    /// Itineraries received.
    pub itineraries: usize,
    /// Itineraries that could not be expanded.
    pub rejected_itineraries: usize,
    /// Candidate routes generated and enriched.
    pub candidates: usize,
    /// Routes dropped for missing predictions.
    pub dropped_incomplete: usize,
    /// Line-detail fetches that failed.
    pub provider_failures: usize,
}

/// Ranked routes plus diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    pub routes: Vec<Route>,
    pub report: PlanReport,
}

/// Plans requests against a line-detail provider and historical tables.
pub struct Planner<'a, P> {
    provider: &'a P,
    models: &'a HistoricalModels,
    config: &'a EngineConfig,
}

impl<'a, P: LineDetailProvider> Planner<'a, P> {
    pub fn new(provider: &'a P, models: &'a HistoricalModels, config: &'a EngineConfig) -> Self {
        Self {
            provider,
            models,
            config,
        }
    }

    /// Score and rank the routes of the given itineraries.
    ///
    /// `now` is the predicted departure time of the first leg.
    pub async fn plan(
        &self,
        itineraries: &[Itinerary],
        now: NaiveDateTime,
        mode: RankMode,
    ) -> PlanOutcome {
        let mut report = PlanReport {
            itineraries: itineraries.len(),
            ..PlanReport::default()
        };

        let mut expanded: Vec<CandidateRoutes> = Vec::with_capacity(itineraries.len());
        for (index, itinerary) in itineraries.iter().enumerate() {
            match expand_itinerary(itinerary, now) {
                Ok(candidates) => expanded.push(candidates),
                Err(e) => {
                    warn!(itinerary = index, "itinerary rejected: {e}");
                    report.rejected_itineraries += 1;
                }
            }
        }

        let cache = BusLookupCache::new(&self.config.cache);
        let enricher = Enricher::new(
            self.models,
            self.provider,
            &cache,
            &self.config.occupancy,
        );

        let enriched: Vec<Route> = stream::iter(expanded.into_iter().flatten())
            .map(|route| enricher.enrich_route(route))
            .buffered(self.config.max_concurrent_routes.max(1))
            .collect()
            .await;
        report.candidates = enriched.len();
        report.provider_failures = enricher.provider_failures();

        let (mut routes, dropped) = filter_complete(enriched);
        report.dropped_incomplete = dropped;

        for route in &mut routes {
            apply_score(route, &self.config.scoring);
        }
        let routes = rank(routes, mode);

        info!(
            itineraries = report.itineraries,
            rejected = report.rejected_itineraries,
            candidates = report.candidates,
            dropped = report.dropped_incomplete,
            provider_failures = report.provider_failures,
            kept = routes.len(),
            %mode,
            "plan complete"
        );

        PlanOutcome { routes, report }
    }
}

impl<P: LineDetailProvider + DirectionsProvider> Planner<'_, P> {
    /// Ask the provider for itineraries between two points, then plan them.
    pub async fn plan_trip(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        now: NaiveDateTime,
        mode: RankMode,
    ) -> Result<PlanOutcome, PlanError> {
        let itineraries = self.provider.itineraries(origin, destination).await?;
        Ok(self.plan(&itineraries, now, mode).await)
    }
}
