//! In-memory historical tables.
//!
//! Built once at startup and never mutated afterwards; the pipeline only
//! holds shared references to them.

use std::collections::{BTreeMap, HashMap};

use crate::domain::{DayClass, Direction, LocalStationId};

/// Station code the subway table uses for its per-direction default row.
pub const SENTINEL_STATION_CODE: &str = "NaN";

/// Key of the bus ridership table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RidershipKey {
    pub route_no: String,
    pub is_weekend: bool,
    pub local_station: LocalStationId,
    /// Hour of day, truncated. May fall outside 0..24 for buses that left
    /// their depot before midnight.
    pub hour: i32,
}

/// Predicted hourly boardings and alightings at one stop of one line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RidershipPrediction {
    pub ride: f64,
    pub alight: f64,
}

/// Bus ridership predictions.
#[derive(Debug, Clone, Default)]
pub struct RidershipTable {
    rows: HashMap<RidershipKey, RidershipPrediction>,
}

impl RidershipTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: RidershipKey, prediction: RidershipPrediction) {
        self.rows.insert(key, prediction);
    }

    pub fn get(&self, key: &RidershipKey) -> Option<&RidershipPrediction> {
        self.rows.get(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Key of the subway occupancy table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubwayKey {
    pub day: DayClass,
    pub station_code: String,
    pub direction: Direction,
}

impl SubwayKey {
    pub fn new(day: DayClass, station_code: impl Into<String>, direction: Direction) -> Self {
        Self {
            day,
            station_code: station_code.into(),
            direction,
        }
    }

    /// The default row for a day class and direction.
    pub fn sentinel(day: DayClass, direction: Direction) -> Self {
        Self::new(day, SENTINEL_STATION_CODE, direction)
    }
}

/// Occupancy per hour of day (0..24) for one station and direction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourlyOccupancy(BTreeMap<u8, f64>);

impl HourlyOccupancy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, hour: u8, occupancy: f64) {
        self.0.insert(hour, occupancy);
    }

    pub fn get(&self, hour: u8) -> Option<f64> {
        self.0.get(&hour).copied()
    }
}

impl FromIterator<(u8, f64)> for HourlyOccupancy {
    fn from_iter<I: IntoIterator<Item = (u8, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Subway occupancy by day class, station and direction.
#[derive(Debug, Clone, Default)]
pub struct SubwayOccupancyTable {
    rows: HashMap<SubwayKey, HourlyOccupancy>,
}

impl SubwayOccupancyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row, replacing any earlier row with the same key.
    ///
    /// Returns the replaced row.
    pub fn insert(&mut self, key: SubwayKey, hours: HourlyOccupancy) -> Option<HourlyOccupancy> {
        self.rows.insert(key, hours)
    }

    pub fn get(&self, key: &SubwayKey) -> Option<&HourlyOccupancy> {
        self.rows.get(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Maps an integer rider count to a risk ratio.
#[derive(Debug, Clone, Default)]
pub struct RiskTable {
    ratios: HashMap<i64, f64>,
}

impl RiskTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, count: i64, ratio: f64) {
        self.ratios.insert(count, ratio);
    }

    /// Ratio for an exact count, 0 when the table has no entry.
    pub fn get(&self, count: i64) -> f64 {
        self.ratios.get(&count).copied().unwrap_or(0.0)
    }

    /// Ratio for a fractional count, rounded half up.
    pub fn lookup(&self, count: f64) -> f64 {
        self.get(round_half_up(count))
    }

    pub fn len(&self) -> usize {
        self.ratios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratios.is_empty()
    }
}

impl FromIterator<(i64, f64)> for RiskTable {
    fn from_iter<I: IntoIterator<Item = (i64, f64)>>(iter: I) -> Self {
        Self {
            ratios: iter.into_iter().collect(),
        }
    }
}

/// Rounds to the nearest integer, halves away from negative infinity.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// All historical tables the enricher consults.
#[derive(Debug, Clone, Default)]
pub struct HistoricalModels {
    pub ridership: RidershipTable,
    pub subway: SubwayOccupancyTable,
    pub bus_risk: RiskTable,
    pub subway_risk: RiskTable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding() {
        assert_eq!(round_half_up(0.0), 0);
        assert_eq!(round_half_up(2.49), 2);
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(69.99), 70);
    }

    #[test]
    fn risk_lookup_defaults_to_zero() {
        let table: RiskTable = [(10, 0.2), (11, 0.25)].into_iter().collect();
        assert_eq!(table.get(10), 0.2);
        assert_eq!(table.lookup(10.6), 0.25);
        assert_eq!(table.lookup(10.4), 0.2);
        assert_eq!(table.lookup(500.0), 0.0);
    }

    #[test]
    fn ridership_lookup_by_typed_key() {
        let mut table = RidershipTable::new();
        let key = RidershipKey {
            route_no: "472".into(),
            is_weekend: false,
            local_station: LocalStationId(23001),
            hour: 8,
        };
        table.insert(
            key.clone(),
            RidershipPrediction {
                ride: 12.0,
                alight: 3.0,
            },
        );
        assert_eq!(table.get(&key).map(|p| p.ride), Some(12.0));

        let weekend = RidershipKey {
            is_weekend: true,
            ..key
        };
        assert!(table.get(&weekend).is_none());
    }

    #[test]
    fn subway_insert_replaces_earlier_row() {
        let mut table = SubwayOccupancyTable::new();
        let key = SubwayKey::new(DayClass::Weekday, "150", Direction::Up);
        let first: HourlyOccupancy = [(8, 10.0)].into_iter().collect();
        let second: HourlyOccupancy = [(8, 99.0)].into_iter().collect();

        assert_eq!(table.insert(key.clone(), first.clone()), None);
        assert_eq!(table.insert(key.clone(), second), Some(first));
        assert_eq!(table.get(&key).and_then(|h| h.get(8)), Some(99.0));
        assert_eq!(table.len(), 1);
    }
}
