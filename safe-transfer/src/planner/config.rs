//! Engine configuration: occupancy model constants, scoring passes and
//! request-level limits.

use crate::cache::CacheConfig;

/// Score thresholds for one window pass, checked highest level first.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds(Vec<(f64, f64)>);

impl Thresholds {
    /// Build from `(level, score)` pairs in any order.
    pub fn new(pairs: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let mut pairs: Vec<(f64, f64)> = pairs.into_iter().collect();
        pairs.sort_by(|a, b| b.0.total_cmp(&a.0));
        Self(pairs)
    }

    /// The score of the highest level strictly below `value`, if any.
    pub fn score_for(&self, value: f64) -> Option<f64> {
        self.0
            .iter()
            .find(|(level, _)| value > *level)
            .map(|(_, score)| *score)
    }
}

/// One sliding-window pass: window width and score thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowPass {
    pub window_secs: i64,
    pub thresholds: Thresholds,
}

impl WindowPass {
    pub fn new(window_secs: i64, thresholds: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Self {
            window_secs,
            thresholds: Thresholds::new(thresholds),
        }
    }
}

/// Parameters of the sliding-window risk score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// Sustained crowding, over predicted congestion.
    pub congestion: WindowPass,

    /// Sustained infection risk, over predicted risk ratio.
    pub risk: WindowPass,

    /// Long uninterrupted rides, over elapsed seconds.
    pub elapsed: WindowPass,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            congestion: WindowPass::new(600, [(0.25, 0.5), (0.5, 1.0), (0.75, 2.0), (1.0, 3.0)]),
            risk: WindowPass::new(600, [(0.5, 1.0), (0.75, 2.0), (1.0, 3.0)]),
            elapsed: WindowPass::new(900, [(900.0, 1.0)]),
        }
    }
}

/// Occupancy model constants.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyConfig {
    /// Upper clamp for a bus's occupancy (people).
    pub bus_max: f64,

    /// Occupancy at which a bus counts as fully congested.
    pub bus_capacity: f64,

    /// Upper clamp for the raw subway occupancy value (percent).
    pub subway_max: f64,

    /// People per percentage point of subway occupancy.
    pub subway_people_per_percent: f64,

    /// Raw subway occupancy at which a car counts as fully congested.
    pub subway_capacity: f64,
}

impl Default for OccupancyConfig {
    fn default() -> Self {
        Self {
            bus_max: 70.0,
            bus_capacity: 46.0,
            subway_max: 368.0,
            subway_people_per_percent: 1.6,
            subway_capacity: 100.0,
        }
    }
}

/// Configuration for one planning request.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    pub occupancy: OccupancyConfig,
    pub cache: CacheConfig,

    /// Routes enriched concurrently.
    pub max_concurrent_routes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            occupancy: OccupancyConfig::default(),
            cache: CacheConfig::default(),
            max_concurrent_routes: 8,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_occupancy(mut self, occupancy: OccupancyConfig) -> Self {
        self.occupancy = occupancy;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Set how many routes are enriched at once. Zero is treated as one.
    pub fn with_max_concurrent_routes(mut self, n: usize) -> Self {
        self.max_concurrent_routes = n;
        self
    }
}
