//! Domain types for the route risk-scoring engine.
//!
//! Identifiers, calendar classifications, itineraries as parsed from the
//! provider, and the routes/segments/stations the pipeline produces.

mod calendar;
mod error;
mod ids;
mod itinerary;
mod line;
mod route;
mod segment;
mod station;

pub use calendar::{DayClass, Direction, ServiceDay, fractional_hour, parse_hour_label};
pub use error::DomainError;
pub use ids::{BusId, LaneId, LocalStationId, StationId, SubwayLine};
pub use itinerary::{
    Coordinates, Itinerary, LegStation, RawLeg, TRAFFIC_BUS, TRAFFIC_SUBWAY, TRAFFIC_WALK,
};
pub use line::{BUS_SPEED_MEAN_M_PER_H, BusLineDetail, DispatchIntervals, LineStation};
pub use route::{Route, RouteSummary};
pub use segment::{PathSegment, SegmentKind};
pub use station::{Prediction, Station};
