//! Historical ridership and occupancy models.
//!
//! Loaded once at startup from CSV files and never mutated afterwards.
//! Requests borrow them read-only; wrap them in an `Arc` to share them
//! across tasks.

mod error;
mod load;
mod models;

pub use error::HistoryError;
pub use load::{
    HistoryPaths, read_ridership, read_risk_table, read_station_code_map, read_subway_occupancy,
};
pub use models::{
    HistoricalModels, HourlyOccupancy, RidershipKey, RidershipPrediction, RidershipTable,
    RiskTable, SENTINEL_STATION_CODE, SubwayKey, SubwayOccupancyTable, round_half_up,
};
