//! Route expansion: from a provider itinerary to concrete candidate routes.
//!
//! Each leg becomes a list of alternative segments (one per lane serving
//! it), with station times spread evenly over the leg's duration. The
//! candidate routes of an itinerary are the Cartesian product of those
//! lists, produced lazily by [`CandidateRoutes`].

use chrono::{Duration, NaiveDateTime};

use crate::domain::{
    Itinerary, PathSegment, RawLeg, Route, RouteSummary, SegmentKind, Station, TRAFFIC_BUS,
    TRAFFIC_SUBWAY, TRAFFIC_WALK,
};

/// Error expanding an itinerary. Any of these rejects the whole itinerary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpandError {
    #[error("leg {leg}: unsupported traffic type {traffic_type}")]
    UnsupportedLegType { leg: usize, traffic_type: i32 },

    #[error("leg {leg}: {station_count} station(s), a transit leg needs at least 2")]
    DegenerateLeg { leg: usize, station_count: usize },

    #[error("leg {leg}: no lane serves this transit leg")]
    NoLaneAlternatives { leg: usize },
}

/// The alternatives for one leg and the predicted time after it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedLeg {
    /// Empty when the leg contributes no segment (zero-length walks).
    pub alternatives: Vec<PathSegment>,
    pub next_time: NaiveDateTime,
}

/// Expand leg number `index` of an itinerary, starting at `start`.
pub fn expand_leg(
    leg: &RawLeg,
    index: usize,
    start: NaiveDateTime,
) -> Result<ExpandedLeg, ExpandError> {
    let duration = Duration::minutes(i64::from(leg.section_time));

    let kind = match leg.traffic_type {
        TRAFFIC_WALK => {
            // Zero-length walks are interchanges inside one station.
            if leg.distance == 0 {
                return Ok(ExpandedLeg {
                    alternatives: Vec::new(),
                    next_time: start,
                });
            }
            return Ok(ExpandedLeg {
                alternatives: vec![PathSegment::walk(leg.distance, duration, start)],
                next_time: start + duration,
            });
        }
        TRAFFIC_BUS => SegmentKind::Bus,
        TRAFFIC_SUBWAY => SegmentKind::Subway,
        other => {
            return Err(ExpandError::UnsupportedLegType {
                leg: index,
                traffic_type: other,
            });
        }
    };

    let station_count = leg.stations.len();
    if station_count < 2 {
        return Err(ExpandError::DegenerateLeg {
            leg: index,
            station_count,
        });
    }
    if leg.lanes.is_empty() {
        return Err(ExpandError::NoLaneAlternatives { leg: index });
    }

    let gaps = i32::try_from(station_count - 1).unwrap_or(i32::MAX);
    let per_station = duration / gaps;

    let stations: Vec<Station> = leg
        .stations
        .iter()
        .zip(0..)
        .map(|(s, i)| {
            let offset = per_station * i;
            Station::new(s.station_id, s.name.clone(), start + offset, offset)
        })
        .collect();

    let template = PathSegment {
        kind,
        distance: leg.distance,
        duration,
        start_time: start,
        stations,
        lane: None,
        start_name: leg.start_name.clone(),
        end_name: leg.end_name.clone(),
        way_code: leg.way_code,
        warning_count: 0,
    };

    let alternatives = leg
        .lanes
        .iter()
        .map(|lane| PathSegment {
            lane: Some(lane.clone()),
            ..template.clone()
        })
        .collect();

    Ok(ExpandedLeg {
        alternatives,
        next_time: start + duration,
    })
}

/// Expand every leg of an itinerary, returning the per-leg alternatives.
///
/// Legs that contribute no segment are left out.
pub fn expand_legs(
    itinerary: &Itinerary,
    start: NaiveDateTime,
) -> Result<Vec<Vec<PathSegment>>, ExpandError> {
    let mut time = start;
    let mut legs = Vec::with_capacity(itinerary.legs.len());

    for (index, leg) in itinerary.legs.iter().enumerate() {
        let expanded = expand_leg(leg, index, time)?;
        time = expanded.next_time;
        if !expanded.alternatives.is_empty() {
            legs.push(expanded.alternatives);
        }
    }

    Ok(legs)
}

/// Expand an itinerary into its candidate routes.
pub fn expand_itinerary(
    itinerary: &Itinerary,
    start: NaiveDateTime,
) -> Result<CandidateRoutes, ExpandError> {
    let legs = expand_legs(itinerary, start)?;
    Ok(CandidateRoutes::new(itinerary.summary.clone(), legs))
}

/// Lazy Cartesian product of per-leg alternatives.
///
/// Yields routes in odometer order: the last leg's alternative changes
/// fastest.
#[derive(Debug, Clone)]
pub struct CandidateRoutes {
    summary: RouteSummary,
    legs: Vec<Vec<PathSegment>>,
    /// Alternative chosen per leg for the next route; `None` once exhausted.
    cursor: Option<Vec<usize>>,
}

impl CandidateRoutes {
    pub fn new(summary: RouteSummary, legs: Vec<Vec<PathSegment>>) -> Self {
        let cursor = if legs.iter().any(Vec::is_empty) {
            None
        } else {
            Some(vec![0; legs.len()])
        };
        Self {
            summary,
            legs,
            cursor,
        }
    }

    /// Number of routes the full product contains.
    pub fn total(&self) -> usize {
        self.legs.iter().map(Vec::len).product()
    }
}

impl Iterator for CandidateRoutes {
    type Item = Route;

    fn next(&mut self) -> Option<Route> {
        let cursor = self.cursor.as_mut()?;

        let segments = cursor
            .iter()
            .zip(&self.legs)
            .map(|(&choice, alternatives)| alternatives[choice].clone())
            .collect();
        let route = Route::new(self.summary.clone(), segments);

        let mut exhausted = true;
        for (choice, alternatives) in cursor.iter_mut().zip(&self.legs).rev() {
            *choice += 1;
            if *choice < alternatives.len() {
                exhausted = false;
                break;
            }
            *choice = 0;
        }
        if exhausted {
            self.cursor = None;
        }

        Some(route)
    }
}
