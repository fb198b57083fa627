//! Calendar and direction classifications used to partition historical data.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::Serialize;

use super::{DomainError, SubwayLine};

/// Weekday vs. weekend partition of the historical tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayClass {
    Weekday,
    Weekend,
}

impl DayClass {
    /// Classifies a date. Saturday and Sunday are weekend days.
    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => DayClass::Weekend,
            _ => DayClass::Weekday,
        }
    }

    /// Parses a day class label as found in the data files.
    ///
    /// Accepts both the Korean labels of the source data (`평일`, `주말`) and
    /// the English ones.
    pub fn parse(label: &str) -> Result<Self, DomainError> {
        match label.trim() {
            "평일" | "weekday" => Ok(DayClass::Weekday),
            "주말" | "weekend" => Ok(DayClass::Weekend),
            other => Err(DomainError::UnknownLabel {
                kind: "day class",
                value: other.to_string(),
            }),
        }
    }

    pub fn is_weekend(self) -> bool {
        self == DayClass::Weekend
    }
}

/// Day of service for dispatch-interval selection.
///
/// Bus timetables publish separate intervals for weekdays, Saturdays and
/// Sundays, which is finer than [`DayClass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceDay {
    Weekday,
    Saturday,
    Sunday,
}

impl ServiceDay {
    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sat => ServiceDay::Saturday,
            Weekday::Sun => ServiceDay::Sunday,
            _ => ServiceDay::Weekday,
        }
    }
}

/// Travel direction of a subway train, as named by the occupancy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    InnerLoop,
    OuterLoop,
}

impl Direction {
    /// Maps a provider way code to a direction for the given line.
    ///
    /// The circular line names its directions inner (way code 2) and outer
    /// loop; every other line uses up (way code 1) and down.
    pub fn for_line(line: SubwayLine, way_code: i32) -> Self {
        if line.is_circular() {
            if way_code == 2 {
                Direction::InnerLoop
            } else {
                Direction::OuterLoop
            }
        } else {
            Self::linear(way_code)
        }
    }

    /// Up/down naming of a way code, regardless of line.
    pub fn linear(way_code: i32) -> Self {
        if way_code == 1 {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    /// Parses a direction label as found in the data files.
    pub fn parse(label: &str) -> Result<Self, DomainError> {
        match label.trim() {
            "상선" | "up" => Ok(Direction::Up),
            "하선" | "down" => Ok(Direction::Down),
            "내선" | "inner" => Ok(Direction::InnerLoop),
            "외선" | "outer" => Ok(Direction::OuterLoop),
            other => Err(DomainError::UnknownLabel {
                kind: "direction",
                value: other.to_string(),
            }),
        }
    }
}

/// Parses an `HH:00` hour label. Returns `None` for anything else.
pub fn parse_hour_label(label: &str) -> Option<u8> {
    let (hour, minute) = label.trim().split_once(':')?;
    if minute != "00" || hour.len() != 2 {
        return None;
    }
    let hour: u8 = hour.parse().ok()?;
    (hour < 24).then_some(hour)
}

/// Clock time as fractional hours, ignoring seconds (09:45 → 9.75).
pub fn fractional_hour(time: NaiveDateTime) -> f64 {
    time.hour() as f64 + time.minute() as f64 / 60.0
}
