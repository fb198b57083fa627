//! Congestion enrichment.
//!
//! Attaches predicted rider count, congestion and infection risk to every
//! station of every transit segment. Bus predictions replay the line's
//! historical boardings and alightings from its first stop up to the
//! rider's alighting stop; subway predictions read the hourly occupancy
//! table directly.
//!
//! Missing coverage never fails a route here. The station is left without
//! a prediction, the segment's warning count goes up, and the filter later
//! drops the route.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{NaiveDateTime, Timelike};
use tracing::{debug, warn};

use crate::cache::{BusLookupCache, BusLookupKey, BusLookupOutcome};
use crate::domain::{
    BusId, BusLineDetail, DayClass, Direction, LineStation, PathSegment, Prediction, Route,
    SegmentKind, ServiceDay, StationId, fractional_hour,
};
use crate::history::{HistoricalModels, RidershipKey, RidershipTable, RiskTable, SubwayKey};
use crate::odsay::ProviderError;

use super::config::OccupancyConfig;

/// Source of bus line details.
pub trait LineDetailProvider {
    /// Fetch the full station sequence and timetable of a bus line.
    fn line_detail(
        &self,
        bus_id: BusId,
    ) -> impl Future<Output = Result<BusLineDetail, ProviderError>> + Send;
}

/// Predicted occupancy of one bus at each station ridden.
#[derive(Debug, Clone, PartialEq)]
pub struct BusOccupancy {
    /// One entry per riding station, boarding station first. `None` where
    /// the ridership table had no row.
    pub occupancies: Vec<Option<f64>>,

    /// Ridership rows that were missing, before and after boarding.
    pub warnings: u32,
}

/// Replays the line's ridership up to the rider's alighting stop.
///
/// The bus is assumed to leave its first stop early enough to reach the
/// boarding station at `start`, with stations evenly spaced in time.
pub fn compute_bus_occupancy(
    line: &BusLineDetail,
    board: StationId,
    alight: StationId,
    start: NaiveDateTime,
    ridership: &RidershipTable,
) -> BusOccupancy {
    let date = start.date();
    let tps = line.time_per_station_hours();
    let now_hours = fractional_hour(start);
    let (before, riding) = line.split_at_ride(board, alight);

    let mut replay = RidershipReplay {
        ridership,
        route_no: &line.bus_no,
        is_weekend: DayClass::of(date).is_weekend(),
        factor: line.intervals.correction_factor(ServiceDay::of(date)),
        occupancy: 0.0,
        warnings: 0,
    };

    let mut clock = now_hours - tps * before.len() as f64;
    for station in before {
        replay.visit(station, clock);
        clock += tps;
    }

    let mut clock = now_hours;
    let occupancies = riding
        .iter()
        .map(|station| {
            let occupancy = replay.visit(station, clock);
            clock += tps;
            occupancy
        })
        .collect();

    BusOccupancy {
        occupancies,
        warnings: replay.warnings,
    }
}

struct RidershipReplay<'a> {
    ridership: &'a RidershipTable,
    route_no: &'a str,
    is_weekend: bool,
    /// Scales hourly counts to one bus.
    factor: f64,
    occupancy: f64,
    warnings: u32,
}

impl RidershipReplay<'_> {
    /// Applies one station's boardings and alightings at `clock` (hours).
    /// Returns the occupancy after the stop, or `None` if there is no row.
    fn visit(&mut self, station: &LineStation, clock: f64) -> Option<f64> {
        let key = RidershipKey {
            route_no: self.route_no.to_string(),
            is_weekend: self.is_weekend,
            local_station: station.local_id,
            hour: clock.trunc() as i32,
        };

        match self.ridership.get(&key) {
            Some(row) => {
                self.occupancy += row.ride * self.factor;
                self.occupancy -= row.alight * self.factor;
                Some(self.occupancy)
            }
            None => {
                self.warnings += 1;
                None
            }
        }
    }
}

/// Prediction for a bus carrying `occupancy` riders.
pub fn bus_prediction(occupancy: f64, config: &OccupancyConfig, risk: &RiskTable) -> Prediction {
    let count = occupancy.clamp(0.0, config.bus_max);
    Prediction {
        count,
        congestion: count / config.bus_capacity,
        risk: risk.lookup(count),
    }
}

/// Prediction for a subway car at raw occupancy `value` (percent).
pub fn subway_prediction(value: f64, config: &OccupancyConfig, risk: &RiskTable) -> Prediction {
    let value = value.clamp(0.0, config.subway_max);
    let count = value * config.subway_people_per_percent;
    Prediction {
        count,
        congestion: value / config.subway_capacity,
        risk: risk.lookup(count),
    }
}

/// Enriches transit segments for one request.
pub struct Enricher<'a, P> {
    models: &'a HistoricalModels,
    provider: &'a P,
    cache: &'a BusLookupCache,
    occupancy: &'a OccupancyConfig,
    provider_failures: AtomicUsize,
}

impl<'a, P: LineDetailProvider> Enricher<'a, P> {
    pub fn new(
        models: &'a HistoricalModels,
        provider: &'a P,
        cache: &'a BusLookupCache,
        occupancy: &'a OccupancyConfig,
    ) -> Self {
        Self {
            models,
            provider,
            cache,
            occupancy,
            provider_failures: AtomicUsize::new(0),
        }
    }

    /// Line-detail fetches that failed so far.
    pub fn provider_failures(&self) -> usize {
        self.provider_failures.load(Ordering::Relaxed)
    }

    /// Enrich every transit segment of a route.
    pub async fn enrich_route(&self, mut route: Route) -> Route {
        for segment in &mut route.segments {
            match segment.kind {
                SegmentKind::Walk => {}
                SegmentKind::Bus => self.enrich_bus(segment).await,
                SegmentKind::Subway => self.enrich_subway(segment),
            }
        }
        route
    }

    /// Enrich a bus segment, fetching its line through the cache.
    pub async fn enrich_bus(&self, segment: &mut PathSegment) {
        let (Some(bus_id), Some(first), Some(last)) = (
            segment.bus_id(),
            segment.first_station().map(|s| s.station_id),
            segment.last_station().map(|s| s.station_id),
        ) else {
            warn!(lane = ?segment.lane, "bus segment without bus lane or stations");
            segment.warning_count += 1;
            return;
        };

        let key = BusLookupKey {
            bus_id,
            first_station: first,
            last_station: last,
            start_time: segment.start_time,
        };

        match self.cache.get_or_lookup(key, self.lookup_bus(key)).await {
            Ok(bus) => {
                for (station, occupancy) in segment.stations.iter_mut().zip(&bus.occupancies) {
                    if let Some(occupancy) = *occupancy {
                        let prediction =
                            bus_prediction(occupancy, self.occupancy, &self.models.bus_risk);
                        *station = station.with_prediction(prediction);
                    }
                }
                segment.warning_count += bus.warnings;
            }
            Err(e) => {
                debug!(%bus_id, "bus segment left unenriched: {e}");
                segment.warning_count += 1;
            }
        }
    }

    async fn lookup_bus(&self, key: BusLookupKey) -> BusLookupOutcome {
        debug!(bus_id = %key.bus_id, start = %key.start_time, "fetching bus line detail");

        match self.provider.line_detail(key.bus_id).await {
            Ok(line) => {
                let bus = compute_bus_occupancy(
                    &line,
                    key.first_station,
                    key.last_station,
                    key.start_time,
                    &self.models.ridership,
                );
                if bus.warnings > 0 {
                    debug!(
                        bus_no = %line.bus_no,
                        missing = bus.warnings,
                        "ridership rows missing"
                    );
                }
                Ok(Arc::new(bus))
            }
            Err(e) => {
                warn!(bus_id = %key.bus_id, "line detail fetch failed: {e}");
                self.provider_failures.fetch_add(1, Ordering::Relaxed);
                Err(Arc::new(e))
            }
        }
    }

    /// Enrich a subway segment from the hourly occupancy table.
    pub fn enrich_subway(&self, segment: &mut PathSegment) {
        let Some(line) = segment.subway_line() else {
            warn!(lane = ?segment.lane, "subway segment without subway lane");
            segment.warning_count += 1;
            return;
        };

        let day = DayClass::of(segment.start_time.date());
        let way_code = segment.way_code.unwrap_or_default();
        let direction = Direction::for_line(line, way_code);
        let fallback = SubwayKey::sentinel(day, Direction::linear(way_code));
        let table = &self.models.subway;

        let mut warnings = 0;
        for station in &mut segment.stations {
            let hour = station.start_time.hour() as u8;
            let key = SubwayKey::new(day, station.station_id.to_string(), direction);

            let value = table
                .get(&key)
                .and_then(|hours| hours.get(hour))
                .or_else(|| {
                    debug!(station = %station.station_id, %line, "using default subway row");
                    table.get(&fallback).and_then(|hours| hours.get(hour))
                });

            match value {
                Some(value) => {
                    let prediction =
                        subway_prediction(value, self.occupancy, &self.models.subway_risk);
                    *station = station.with_prediction(prediction);
                }
                None => warnings += 1,
            }
        }

        if warnings > 0 {
            warn!(%line, missing = warnings, "no subway occupancy for some stations");
        }
        segment.warning_count += warnings;
    }
}
