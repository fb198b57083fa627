//! Bus line detail: the full station sequence and timetable of a bus line.

use chrono::NaiveTime;

use super::{BusId, LocalStationId, ServiceDay, StationId};

/// Mean bus speed in metres per hour (18.7 km/h, Seoul city bus average).
pub const BUS_SPEED_MEAN_M_PER_H: f64 = 18.7 * 1000.0;

/// Full description of a bus line.
#[derive(Debug, Clone, PartialEq)]
pub struct BusLineDetail {
    pub bus_id: BusId,
    /// Public route number; keys the ridership table.
    pub bus_no: String,
    pub start_point: String,
    pub end_point: String,
    pub first_departure: Option<NaiveTime>,
    pub last_departure: Option<NaiveTime>,
    /// Length of the whole line in metres.
    pub total_distance_m: f64,
    pub intervals: DispatchIntervals,
    /// Every station of the line, in running order.
    pub stations: Vec<LineStation>,
}

/// A station on a bus line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineStation {
    pub station_id: StationId,
    pub local_id: LocalStationId,
    pub name: String,
}

/// Average minutes between consecutive buses.
///
/// Each variant is optional because the provider leaves out (or sends
/// placeholders for) intervals it does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DispatchIntervals {
    pub general: Option<f64>,
    pub weekday: Option<f64>,
    pub saturday: Option<f64>,
    pub sunday: Option<f64>,
}

impl DispatchIntervals {
    /// Minutes between buses on the given day.
    ///
    /// Uses the day-specific interval, then the general one, then one
    /// bus per hour.
    pub fn minutes_for(&self, day: ServiceDay) -> f64 {
        let specific = match day {
            ServiceDay::Weekday => self.weekday,
            ServiceDay::Saturday => self.saturday,
            ServiceDay::Sunday => self.sunday,
        };
        specific.or(self.general).unwrap_or(60.0)
    }

    /// Factor scaling an hourly ridership count to a single bus.
    pub fn correction_factor(&self, day: ServiceDay) -> f64 {
        self.minutes_for(day) / 60.0
    }
}

impl BusLineDetail {
    /// Travel time of the whole line in hours, from its length.
    pub fn line_time_hours(&self) -> f64 {
        self.total_distance_m / BUS_SPEED_MEAN_M_PER_H
    }

    /// Hours between consecutive stations, assuming even spacing.
    pub fn time_per_station_hours(&self) -> f64 {
        if self.stations.len() < 2 {
            return 0.0;
        }
        self.line_time_hours() / (self.stations.len() - 1) as f64
    }

    /// Splits the line into the stations before boarding and the stations
    /// ridden, boarding and alighting stations included.
    ///
    /// The scan stops at the first occurrence of `alight`. If that comes
    /// before `board` (or `board` never appears), nothing is ridden.
    pub fn split_at_ride(
        &self,
        board: StationId,
        alight: StationId,
    ) -> (&[LineStation], &[LineStation]) {
        let stations = self.stations.as_slice();
        let mut boarded_at = None;

        for (idx, station) in stations.iter().enumerate() {
            if boarded_at.is_none() && station.station_id == board {
                boarded_at = Some(idx);
            }
            if station.station_id == alight {
                return match boarded_at {
                    Some(b) => (&stations[..b], &stations[b..=idx]),
                    None => (&stations[..=idx], &[]),
                };
            }
        }

        match boarded_at {
            Some(b) => (&stations[..b], &stations[b..]),
            None => (stations, &[]),
        }
    }
}
