//! Candidate routes.
//!
//! A `Route` is one concrete way of travelling an itinerary: every leg with
//! several lane alternatives has been pinned to a single lane.

use serde::Serialize;

use super::{PathSegment, Station};

/// Route-level metadata copied from the provider's itinerary summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    /// First boarding stop.
    pub origin: String,
    /// Last alighting stop.
    pub destination: String,
    /// Total travel time in minutes, as reported by the provider.
    pub total_time: u32,
    /// Fare.
    pub payment: u32,
    /// Opaque map geometry reference, passed through for presentation.
    pub map_object: Option<String>,
}

/// A candidate route with its segments and, once scored, its risk figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    #[serde(flatten)]
    pub summary: RouteSummary,
    pub segments: Vec<PathSegment>,
    pub risk_score: Option<f64>,
    pub mean_risk: Option<f64>,
}

impl Route {
    pub fn new(summary: RouteSummary, segments: Vec<PathSegment>) -> Self {
        Self {
            summary,
            segments,
            risk_score: None,
            mean_risk: None,
        }
    }

    pub fn total_time(&self) -> u32 {
        self.summary.total_time
    }

    /// Segments ridden on a vehicle.
    pub fn transit_segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.segments.iter().filter(|s| !s.is_walk())
    }

    /// Every station of every transit segment, in travel order.
    pub fn transit_stations(&self) -> impl Iterator<Item = &Station> {
        self.transit_segments().flat_map(|s| s.stations.iter())
    }

    /// True if no transit station is missing its congestion estimate.
    pub fn is_complete(&self) -> bool {
        self.transit_segments().all(PathSegment::is_fully_enriched)
    }

    /// Sort key for risk ranking. Unscored routes count as zero risk.
    pub fn risk_key(&self) -> (f64, f64) {
        (
            self.risk_score.unwrap_or(0.0),
            self.mean_risk.unwrap_or(0.0),
        )
    }

    /// Sum of the warning counts of all segments.
    pub fn warning_count(&self) -> u32 {
        self.segments.iter().map(|s| s.warning_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BusId, LaneId, Prediction, SegmentKind, StationId};
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 8, 24)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap()
    }

    fn summary() -> RouteSummary {
        RouteSummary {
            origin: "Seoul Station".into(),
            destination: "City Hall".into(),
            total_time: 25,
            payment: 1250,
            map_object: None,
        }
    }

    fn bus_segment(enriched: bool) -> PathSegment {
        let mut seg = PathSegment::walk(2000, Duration::minutes(10), t0());
        seg.kind = SegmentKind::Bus;
        seg.lane = Some(LaneId::Bus {
            id: BusId(1),
            number: "100".into(),
            bus_type: 1,
        });
        let station = Station::new(StationId(1), "A", t0(), Duration::zero());
        seg.stations = vec![if enriched {
            station.with_prediction(Prediction {
                count: 10.0,
                congestion: 0.2,
                risk: 0.3,
            })
        } else {
            station
        }];
        seg.warning_count = if enriched { 0 } else { 1 };
        seg
    }

    #[test]
    fn completeness_ignores_walks() {
        let walk = PathSegment::walk(100, Duration::minutes(2), t0());
        let route = Route::new(summary(), vec![walk.clone(), bus_segment(true)]);
        assert!(route.is_complete());
        assert_eq!(route.transit_segments().count(), 1);
        assert_eq!(route.transit_stations().count(), 1);

        let route = Route::new(summary(), vec![walk, bus_segment(false)]);
        assert!(!route.is_complete());
        assert_eq!(route.warning_count(), 1);
    }

    #[test]
    fn risk_key_defaults_to_zero() {
        let mut route = Route::new(summary(), vec![]);
        assert_eq!(route.risk_key(), (0.0, 0.0));
        route.risk_score = Some(2.5);
        route.mean_risk = Some(0.4);
        assert_eq!(route.risk_key(), (2.5, 0.4));
    }

    #[test]
    fn serializes_flat_summary() {
        let json = serde_json::to_value(Route::new(summary(), vec![])).unwrap();
        assert_eq!(json["origin"], "Seoul Station");
        assert_eq!(json["total_time"], 25);
        assert!(json["risk_score"].is_null());
    }
}
