//! Stations along a transit segment.

use chrono::{Duration, NaiveDateTime};
use serde::{Serialize, Serializer};

use super::StationId;

/// Predicted load at a station, attached during enrichment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted number of riders aboard.
    pub count: f64,
    /// Riders relative to vehicle capacity.
    pub congestion: f64,
    /// Risk ratio looked up for the rider count.
    pub risk: f64,
}

/// A station passed by a transit segment.
///
/// The `predicted_*` fields stay `None` until enrichment runs. If they are
/// still `None` afterwards, the historical data had no coverage for this
/// station at this time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    pub station_id: StationId,
    pub name: String,

    /// Predicted arrival of the vehicle at this station.
    pub start_time: NaiveDateTime,

    /// Elapsed time since the segment started.
    #[serde(rename = "ongoing_secs", serialize_with = "serialize_secs")]
    pub ongoing_time: Duration,

    pub predicted_count: Option<f64>,
    pub predicted_congestion: Option<f64>,
    pub predicted_risk: Option<f64>,
}

impl Station {
    /// Creates a station without predictions.
    pub fn new(
        station_id: StationId,
        name: impl Into<String>,
        start_time: NaiveDateTime,
        ongoing_time: Duration,
    ) -> Self {
        Self {
            station_id,
            name: name.into(),
            start_time,
            ongoing_time,
            predicted_count: None,
            predicted_congestion: None,
            predicted_risk: None,
        }
    }

    /// Returns a copy of this station carrying the given prediction.
    pub fn with_prediction(&self, prediction: Prediction) -> Self {
        Self {
            predicted_count: Some(prediction.count),
            predicted_congestion: Some(prediction.congestion),
            predicted_risk: Some(prediction.risk),
            ..self.clone()
        }
    }

    /// True once a congestion estimate is attached.
    pub fn is_enriched(&self) -> bool {
        self.predicted_congestion.is_some()
    }

    /// Whole seconds elapsed since the segment started.
    pub fn elapsed_secs(&self) -> i64 {
        self.ongoing_time.num_seconds()
    }
}

/// Serializes a duration as whole seconds.
pub(crate) fn serialize_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(d.num_seconds())
}
