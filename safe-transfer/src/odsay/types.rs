//! Provider API response DTOs.
//!
//! These types map directly to the JSON of the `searchPubTransPathR` and
//! `busLaneDetail` endpoints. They use `Option` liberally because the
//! provider omits fields rather than sending nulls, and [`Loose`] wherever
//! it is inconsistent about sending numbers or strings.

use serde::Deserialize;

/// A scalar the provider sends either as a JSON number or as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Loose {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Loose {
    /// Integer value, if the scalar is an integer or an integer string.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Loose::Int(n) => Some(*n),
            Loose::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Loose::Float(_) => None,
            Loose::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Floating point value, if the scalar is numeric or a numeric string.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Loose::Int(n) => Some(*n as f64),
            Loose::Float(f) => Some(*f),
            Loose::Text(s) => s.trim().parse().ok(),
        }
    }

    /// The scalar rendered as text.
    pub fn as_text(&self) -> String {
        match self {
            Loose::Int(n) => n.to_string(),
            Loose::Float(f) => f.to_string(),
            Loose::Text(s) => s.clone(),
        }
    }
}

/// Response from `searchPubTransPathR`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPathResponse {
    pub result: Option<SearchPathResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchPathResult {
    /// Candidate itineraries, in the provider's preferred order.
    #[serde(default)]
    pub path: Vec<PathItem>,
}

/// One itinerary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathItem {
    /// 1 subway only, 2 bus only, 3 mixed.
    pub path_type: Option<i32>,
    pub info: PathInfo,
    #[serde(default)]
    pub sub_path: Vec<SubPath>,
}

/// Itinerary summary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathInfo {
    pub first_start_station: String,
    pub last_end_station: String,
    /// Minutes.
    pub total_time: u32,
    pub payment: u32,
    /// Map geometry reference for the lane drawing endpoint.
    pub map_obj: Option<String>,
    pub total_distance: Option<f64>,
}

/// One leg of an itinerary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubPath {
    /// 1 subway, 2 bus, 3 walk.
    pub traffic_type: i32,
    /// Metres.
    #[serde(default)]
    pub distance: f64,
    /// Minutes.
    #[serde(default)]
    pub section_time: u32,
    pub start_name: Option<String>,
    pub end_name: Option<String>,
    pub pass_stop_list: Option<PassStopList>,
    pub lane: Option<Vec<LaneDto>>,
    pub way_code: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PassStopList {
    #[serde(default)]
    pub stations: Vec<PassStation>,
}

/// A station passed by a leg.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassStation {
    pub index: Option<i32>,
    #[serde(rename = "stationID")]
    pub station_id: Loose,
    pub station_name: String,
}

/// A lane alternative: either bus fields or subway fields are present.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneDto {
    pub bus_no: Option<Loose>,
    #[serde(rename = "busID")]
    pub bus_id: Option<Loose>,
    #[serde(rename = "type")]
    pub bus_type: Option<i32>,
    pub subway_code: Option<i32>,
    pub name: Option<String>,
}

/// Response from `busLaneDetail`.
#[derive(Debug, Clone, Deserialize)]
pub struct BusLaneDetailResponse {
    pub result: Option<BusLaneResult>,
}

/// Full description of a bus line.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusLaneResult {
    pub bus_no: Loose,
    #[serde(rename = "busID")]
    pub bus_id: Loose,
    pub bus_start_point: Option<String>,
    pub bus_end_point: Option<String>,
    /// "HH:MM".
    pub bus_first_time: Option<String>,
    /// "HH:MM".
    pub bus_last_time: Option<String>,
    /// Metres.
    pub bus_total_distance: Option<Loose>,
    /// Minutes, all days.
    pub bus_interval: Option<Loose>,
    #[serde(rename = "bus_Interval_Week")]
    pub bus_interval_week: Option<Loose>,
    #[serde(rename = "bus_Interval_Sat")]
    pub bus_interval_sat: Option<Loose>,
    #[serde(rename = "bus_Interval_Sun")]
    pub bus_interval_sun: Option<Loose>,
    #[serde(default)]
    pub station: Vec<BusLaneStation>,
}

/// A station on a bus line.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusLaneStation {
    pub idx: Option<i32>,
    #[serde(rename = "stationID")]
    pub station_id: Loose,
    pub station_name: String,
    #[serde(rename = "localStationID")]
    pub local_station_id: Option<Loose>,
}
