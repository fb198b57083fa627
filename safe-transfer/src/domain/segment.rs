//! Path segments: the normalized form of one itinerary leg for one lane.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use super::station::serialize_secs;
use super::{BusId, LaneId, Station, SubwayLine};

/// Mode of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Walk,
    Bus,
    Subway,
}

/// One mode-homogeneous part of a candidate route.
///
/// Walk segments have no stations and no lane. Transit segments list their
/// stations in order of elapsed time and ride exactly one lane.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathSegment {
    pub kind: SegmentKind,

    /// Distance in metres.
    pub distance: u32,

    #[serde(rename = "duration_secs", serialize_with = "serialize_secs")]
    pub duration: Duration,

    /// Predicted start of the segment.
    pub start_time: NaiveDateTime,

    pub stations: Vec<Station>,

    pub lane: Option<LaneId>,

    pub start_name: Option<String>,
    pub end_name: Option<String>,

    /// Provider direction code, subway only.
    pub way_code: Option<i32>,

    /// Lookups that found no historical data while enriching this segment.
    pub warning_count: u32,
}

impl PathSegment {
    /// Creates a walk segment.
    pub fn walk(distance: u32, duration: Duration, start_time: NaiveDateTime) -> Self {
        Self {
            kind: SegmentKind::Walk,
            distance,
            duration,
            start_time,
            stations: Vec::new(),
            lane: None,
            start_name: None,
            end_name: None,
            way_code: None,
            warning_count: 0,
        }
    }

    pub fn is_walk(&self) -> bool {
        self.kind == SegmentKind::Walk
    }

    pub fn bus_id(&self) -> Option<BusId> {
        self.lane.as_ref().and_then(LaneId::bus_id)
    }

    pub fn subway_line(&self) -> Option<SubwayLine> {
        self.lane.as_ref().and_then(LaneId::subway_line)
    }

    pub fn first_station(&self) -> Option<&Station> {
        self.stations.first()
    }

    pub fn last_station(&self) -> Option<&Station> {
        self.stations.last()
    }

    /// True if every station carries a congestion estimate.
    ///
    /// Always true for walk segments.
    pub fn is_fully_enriched(&self) -> bool {
        self.stations.iter().all(Station::is_enriched)
    }
}
