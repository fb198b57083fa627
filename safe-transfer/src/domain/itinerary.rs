//! Itineraries as returned by the directions provider, after parsing.
//!
//! These types are the typed intermediate between the provider's JSON and
//! the route expander. They are validated structurally (ids parse, required
//! fields are present) but not semantically: an unknown mode tag is kept as
//! is and rejected later by the expander.

use super::{LaneId, RouteSummary, StationId};

/// Provider mode tag for subway legs.
pub const TRAFFIC_SUBWAY: i32 = 1;
/// Provider mode tag for bus legs.
pub const TRAFFIC_BUS: i32 = 2;
/// Provider mode tag for walking legs.
pub const TRAFFIC_WALK: i32 = 3;

/// A WGS84 point, in the provider's (x = longitude, y = latitude) order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

impl Coordinates {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One itinerary: summary plus ordered legs.
#[derive(Debug, Clone, PartialEq)]
pub struct Itinerary {
    pub summary: RouteSummary,
    pub legs: Vec<RawLeg>,
}

/// One leg of an itinerary, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLeg {
    /// Provider mode tag (see the `TRAFFIC_*` constants).
    pub traffic_type: i32,
    /// Distance in metres.
    pub distance: u32,
    /// Duration in minutes.
    pub section_time: u32,
    pub start_name: Option<String>,
    pub end_name: Option<String>,
    /// Stations passed, boarding station first.
    pub stations: Vec<LegStation>,
    /// Lanes serving this stop sequence.
    pub lanes: Vec<LaneId>,
    pub way_code: Option<i32>,
}

/// A station listed on an itinerary leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegStation {
    pub station_id: StationId,
    pub name: String,
}
