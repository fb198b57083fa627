//! Conversion from provider DTOs to domain types.
//!
//! Anything structurally unusable (ids that are not numbers, missing lane
//! identifiers, missing results) is rejected here with a descriptive error,
//! so the pipeline never sees half-parsed provider data.

use chrono::NaiveTime;

use crate::domain::{
    BusId, BusLineDetail, DispatchIntervals, Itinerary, LaneId, LegStation, LineStation,
    LocalStationId, RawLeg, RouteSummary, StationId, SubwayLine,
};

use super::types::{
    BusLaneDetailResponse, BusLaneResult, LaneDto, Loose, PathItem, SearchPathResponse, SubPath,
};

/// Error during DTO to domain conversion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    /// An identifier that should be numeric was not
    #[error("invalid {field}: {value:?}")]
    InvalidId { field: &'static str, value: String },

    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Convert a route search response into itineraries, keeping provider order.
pub fn convert_search_path(
    response: &SearchPathResponse,
) -> Result<Vec<Itinerary>, ConversionError> {
    let result = response
        .result
        .as_ref()
        .ok_or(ConversionError::MissingField("result"))?;

    result.path.iter().map(convert_path_item).collect()
}

/// Convert one itinerary.
pub fn convert_path_item(item: &PathItem) -> Result<Itinerary, ConversionError> {
    let summary = RouteSummary {
        origin: item.info.first_start_station.clone(),
        destination: item.info.last_end_station.clone(),
        total_time: item.info.total_time,
        payment: item.info.payment,
        map_object: item.info.map_obj.clone(),
    };

    let legs = item
        .sub_path
        .iter()
        .map(convert_sub_path)
        .collect::<Result<_, _>>()?;

    Ok(Itinerary { summary, legs })
}

/// Convert one leg. The mode tag is passed through unchecked.
pub fn convert_sub_path(sub_path: &SubPath) -> Result<RawLeg, ConversionError> {
    let stations = match &sub_path.pass_stop_list {
        Some(list) => list
            .stations
            .iter()
            .map(|s| {
                Ok(LegStation {
                    station_id: StationId(id_of(&s.station_id, "stationID")?),
                    name: s.station_name.clone(),
                })
            })
            .collect::<Result<_, ConversionError>>()?,
        None => Vec::new(),
    };

    let lanes = sub_path
        .lane
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .map(convert_lane)
        .collect::<Result<_, _>>()?;

    Ok(RawLeg {
        traffic_type: sub_path.traffic_type,
        distance: sub_path.distance.max(0.0).round() as u32,
        section_time: sub_path.section_time,
        start_name: sub_path.start_name.clone(),
        end_name: sub_path.end_name.clone(),
        stations,
        lanes,
        way_code: sub_path.way_code,
    })
}

/// A lane is a subway lane if it names a subway line, otherwise a bus lane.
fn convert_lane(lane: &LaneDto) -> Result<LaneId, ConversionError> {
    if let Some(code) = lane.subway_code {
        return Ok(LaneId::Subway {
            line: SubwayLine(code),
        });
    }

    let bus_id = lane
        .bus_id
        .as_ref()
        .ok_or(ConversionError::MissingField("lane busID or subwayCode"))?;

    Ok(LaneId::Bus {
        id: BusId(id_of(bus_id, "busID")?),
        number: lane.bus_no.as_ref().map(Loose::as_text).unwrap_or_default(),
        bus_type: lane.bus_type.unwrap_or_default(),
    })
}

/// Convert a bus line detail response.
pub fn convert_bus_lane_detail(
    response: &BusLaneDetailResponse,
) -> Result<BusLineDetail, ConversionError> {
    let result = response
        .result
        .as_ref()
        .ok_or(ConversionError::MissingField("result"))?;
    convert_bus_lane(result)
}

fn convert_bus_lane(result: &BusLaneResult) -> Result<BusLineDetail, ConversionError> {
    let stations = result
        .station
        .iter()
        .map(|s| {
            let local = s
                .local_station_id
                .as_ref()
                .ok_or(ConversionError::MissingField("localStationID"))?;
            let local = local
                .as_i64()
                .and_then(|n| u64::try_from(n).ok())
                .ok_or_else(|| ConversionError::InvalidId {
                    field: "localStationID",
                    value: local.as_text(),
                })?;
            Ok(LineStation {
                station_id: StationId(id_of(&s.station_id, "stationID")?),
                local_id: LocalStationId(local),
                name: s.station_name.clone(),
            })
        })
        .collect::<Result<_, ConversionError>>()?;

    let intervals = DispatchIntervals {
        general: interval(result.bus_interval.as_ref()),
        weekday: interval(result.bus_interval_week.as_ref()),
        saturday: interval(result.bus_interval_sat.as_ref()),
        sunday: interval(result.bus_interval_sun.as_ref()),
    };

    Ok(BusLineDetail {
        bus_id: BusId(id_of(&result.bus_id, "busID")?),
        bus_no: result.bus_no.as_text(),
        start_point: result.bus_start_point.clone().unwrap_or_default(),
        end_point: result.bus_end_point.clone().unwrap_or_default(),
        first_departure: result.bus_first_time.as_deref().and_then(parse_hhmm),
        last_departure: result.bus_last_time.as_deref().and_then(parse_hhmm),
        total_distance_m: result
            .bus_total_distance
            .as_ref()
            .and_then(Loose::as_f64)
            .ok_or(ConversionError::MissingField("busTotalDistance"))?,
        intervals,
        stations,
    })
}

fn id_of(value: &Loose, field: &'static str) -> Result<i64, ConversionError> {
    value.as_i64().ok_or_else(|| ConversionError::InvalidId {
        field,
        value: value.as_text(),
    })
}

/// Dispatch intervals must be positive minutes; anything else is unknown.
fn interval(value: Option<&Loose>) -> Option<f64> {
    value.and_then(Loose::as_f64).filter(|m| *m > 0.0)
}

fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}
