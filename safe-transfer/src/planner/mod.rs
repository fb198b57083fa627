//! Route risk-scoring engine.
//!
//! Turns provider itineraries into concrete candidate routes, predicts how
//! crowded each station of each ride will be, scores sustained crowding
//! and risk with a sliding window, and ranks what is left.

mod config;
mod enrich;
mod expand;
mod pipeline;
mod rank;
mod score;

#[cfg(test)]
mod pipeline_tests;

pub use config::{EngineConfig, OccupancyConfig, ScoringConfig, Thresholds, WindowPass};
pub use enrich::{
    BusOccupancy, Enricher, LineDetailProvider, bus_prediction, compute_bus_occupancy,
    subway_prediction,
};
pub use expand::{
    CandidateRoutes, ExpandError, ExpandedLeg, expand_itinerary, expand_leg, expand_legs,
};
pub use pipeline::{DirectionsProvider, PlanError, PlanOutcome, PlanReport, Planner};
pub use rank::{RankMode, RiskLevel, filter_complete, rank, select};
pub use score::{apply_score, scan_windows, score_route, score_segment};
