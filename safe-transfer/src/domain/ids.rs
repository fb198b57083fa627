//! Identifier types.
//!
//! The provider and the historical data sets use several overlapping id
//! spaces. Each gets its own newtype so a bus id can never be used where a
//! station id is expected.

use std::fmt;

use serde::Serialize;

/// Provider-wide station identifier (`stationID` in provider responses).
///
/// Bus and subway stations share this id space. For subway stations the
/// same value, rendered as a string, is the station code used by the
/// occupancy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StationId(pub i64);

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Station identifier local to the ridership data set (`STND_BSST_ID`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LocalStationId(pub u64);

impl fmt::Display for LocalStationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bus line identifier accepted by the line-detail provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BusId(pub i64);

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Subway line code as reported by the directions provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SubwayLine(pub i32);

impl SubwayLine {
    /// Line 2 runs in a loop and names its directions inner/outer.
    pub const CIRCULAR: SubwayLine = SubwayLine(2);

    /// Returns true for the circular line.
    pub fn is_circular(self) -> bool {
        self == Self::CIRCULAR
    }
}

impl fmt::Display for SubwayLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}", self.0)
    }
}

/// The concrete lane a transit segment rides.
///
/// A leg may be served by several lanes over the same stop sequence; each
/// candidate route picks exactly one of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LaneId {
    /// A bus line.
    Bus {
        /// Line id used for line-detail lookups.
        id: BusId,
        /// Public route number (e.g. "472"), also the ridership table key.
        number: String,
        /// Provider bus type code (trunk, branch, village, ...).
        bus_type: i32,
    },
    /// A subway line.
    Subway {
        /// Line code.
        line: SubwayLine,
    },
}

impl LaneId {
    /// Returns the bus id if this is a bus lane.
    pub fn bus_id(&self) -> Option<BusId> {
        match self {
            LaneId::Bus { id, .. } => Some(*id),
            LaneId::Subway { .. } => None,
        }
    }

    /// Returns the subway line if this is a subway lane.
    pub fn subway_line(&self) -> Option<SubwayLine> {
        match self {
            LaneId::Subway { line } => Some(*line),
            LaneId::Bus { .. } => None,
        }
    }
}

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaneId::Bus { id, number, .. } => write!(f, "bus {number} ({id})"),
            LaneId::Subway { line } => write!(f, "subway {line}"),
        }
    }
}
