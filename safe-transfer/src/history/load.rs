//! Loading the historical tables from CSV files.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::{DayClass, Direction, LocalStationId, parse_hour_label};

use super::error::HistoryError;
use super::models::{
    HistoricalModels, HourlyOccupancy, RidershipKey, RidershipPrediction, RidershipTable,
    RiskTable, SubwayKey, SubwayOccupancyTable,
};

/// Locations of the table files.
#[derive(Debug, Clone)]
pub struct HistoryPaths {
    /// Bus ridership predictions.
    pub ridership: PathBuf,
    /// Subway occupancy tables. Later files override rows of earlier ones.
    pub subway_occupancy: Vec<PathBuf>,
    /// Optional line-station code to provider code mapping for the subway
    /// tables.
    pub station_code_map: Option<PathBuf>,
    pub bus_risk: PathBuf,
    pub subway_risk: PathBuf,
}

impl HistoryPaths {
    /// Default file names inside a data directory.
    ///
    /// `subway_occupancy_extra.csv` and `station_codes.csv` are picked up
    /// when present.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let mut paths = Self {
            ridership: dir.join("bus_ridership.csv"),
            subway_occupancy: vec![dir.join("subway_occupancy.csv")],
            station_code_map: None,
            bus_risk: dir.join("bus_risk.csv"),
            subway_risk: dir.join("subway_risk.csv"),
        };

        let extra = dir.join("subway_occupancy_extra.csv");
        if extra.is_file() {
            paths.subway_occupancy.push(extra);
        }
        let codes = dir.join("station_codes.csv");
        if codes.is_file() {
            paths.station_code_map = Some(codes);
        }
        paths
    }

    /// Add another subway occupancy file, overriding earlier ones.
    pub fn with_subway_occupancy(mut self, path: impl Into<PathBuf>) -> Self {
        self.subway_occupancy.push(path.into());
        self
    }

    /// Set the station code mapping file.
    pub fn with_station_code_map(mut self, path: impl Into<PathBuf>) -> Self {
        self.station_code_map = Some(path.into());
        self
    }
}

impl HistoricalModels {
    /// Load every table. Any failure aborts the load.
    pub fn load(paths: &HistoryPaths) -> Result<Self, HistoryError> {
        let ridership = read_ridership(open(&paths.ridership)?)?;
        info!(rows = ridership.len(), "loaded bus ridership table");

        let codes = match &paths.station_code_map {
            Some(path) => {
                let map = read_station_code_map(open(path)?)?;
                debug!(codes = map.len(), "remapping subway station codes");
                map
            }
            None => HashMap::new(),
        };

        let mut subway = SubwayOccupancyTable::new();
        for path in &paths.subway_occupancy {
            let rows = read_subway_occupancy(open(path)?, &codes, &mut subway)?;
            info!(rows, path = %path.display(), "loaded subway occupancy table");
        }

        let bus_risk = read_risk_table(open(&paths.bus_risk)?)?;
        let subway_risk = read_risk_table(open(&paths.subway_risk)?)?;
        info!(
            bus = bus_risk.len(),
            subway = subway_risk.len(),
            "loaded risk tables"
        );

        Ok(Self {
            ridership,
            subway,
            bus_risk,
            subway_risk,
        })
    }
}

fn open(path: &Path) -> Result<File, HistoryError> {
    File::open(path).map_err(|source| HistoryError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Deserialize)]
struct RidershipRow {
    #[serde(rename = "BUS_ROUTE_NO")]
    route_no: String,
    #[serde(rename = "WEEKEND")]
    weekend: u8,
    #[serde(rename = "STND_BSST_ID")]
    local_station: u64,
    #[serde(rename = "TIME")]
    hour: f64,
    #[serde(rename = "RIDE_NUM_PRED")]
    ride: f64,
    #[serde(rename = "ALIGHT_NUM_PRED")]
    alight: f64,
}

/// Read the bus ridership table.
///
/// Columns: `BUS_ROUTE_NO, WEEKEND, STND_BSST_ID, TIME, RIDE_NUM_PRED,
/// ALIGHT_NUM_PRED`. Other columns are ignored.
pub fn read_ridership<R: Read>(reader: R) -> Result<RidershipTable, HistoryError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut table = RidershipTable::new();

    for row in reader.deserialize::<RidershipRow>() {
        let row = row?;
        table.insert(
            RidershipKey {
                route_no: row.route_no,
                is_weekend: row.weekend != 0,
                local_station: LocalStationId(row.local_station),
                hour: row.hour.trunc() as i32,
            },
            RidershipPrediction {
                ride: row.ride,
                alight: row.alight,
            },
        );
    }

    Ok(table)
}

/// Read one subway occupancy file into `table`, returning the rows read.
///
/// The file is in wide format: `day_class, station_code, direction` followed
/// by one `HH:00` column per hour. Empty or NaN cells are left out. Rows with
/// an unknown day class or direction label are skipped.
///
/// Station codes are rewritten through `codes` before insertion. Rows are
/// inserted in file order, so a later row replaces an earlier one with the
/// same key, whether the keys matched before or after rewriting.
pub fn read_subway_occupancy<R: Read>(
    reader: R,
    codes: &HashMap<String, String>,
    table: &mut SubwayOccupancyTable,
) -> Result<usize, HistoryError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = reader.headers()?.clone();

    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(HistoryError::MissingColumn(name))
    };
    let day_col = column("day_class")?;
    let code_col = column("station_code")?;
    let direction_col = column("direction")?;

    let hour_cols: Vec<(usize, u8)> = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, h)| parse_hour_label(h).map(|hour| (idx, hour)))
        .collect();

    let mut rows = 0;
    let mut skipped = 0;
    let mut record = csv::StringRecord::new();

    while reader.read_record(&mut record)? {
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let day = DayClass::parse(&record[day_col]);
        let direction = Direction::parse(&record[direction_col]);
        let (day, direction) = match (day, direction) {
            (Ok(day), Ok(direction)) => (day, direction),
            (Err(e), _) | (_, Err(e)) => {
                debug!(line, "skipping subway occupancy row: {e}");
                skipped += 1;
                continue;
            }
        };

        let mut hours = HourlyOccupancy::new();
        for &(idx, hour) in &hour_cols {
            let cell = record.get(idx).unwrap_or("");
            if cell.is_empty() {
                continue;
            }
            let value: f64 = cell.parse().map_err(|_| HistoryError::Parse {
                line,
                message: format!("invalid occupancy {cell:?} for hour {hour:02}"),
            })?;
            if !value.is_nan() {
                hours.insert(hour, value);
            }
        }

        let raw_code = &record[code_col];
        let code = codes.get(raw_code).map_or(raw_code, String::as_str);
        if table.insert(SubwayKey::new(day, code, direction), hours).is_some() {
            debug!(line, station = code, "subway occupancy row replaces an earlier row");
        }
        rows += 1;
    }

    if skipped > 0 {
        warn!(skipped, "subway occupancy rows with unknown labels were skipped");
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct StationCodeRow {
    line_station_code: String,
    external_code: String,
}

/// Read a `line_station_code, external_code` mapping.
pub fn read_station_code_map<R: Read>(
    reader: R,
) -> Result<HashMap<String, String>, HistoryError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut map = HashMap::new();
    for row in reader.deserialize::<StationCodeRow>() {
        let row = row?;
        map.insert(row.line_station_code, row.external_code);
    }
    Ok(map)
}

#[derive(Debug, Deserialize)]
struct RiskRow {
    occupancy: i64,
    expected_infections: f64,
}

/// Read a risk table of `occupancy, expected_infections`.
///
/// The stored ratio is expected infections per rider. Rows for an empty
/// vehicle carry no ratio and are dropped.
pub fn read_risk_table<R: Read>(reader: R) -> Result<RiskTable, HistoryError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut table = RiskTable::new();
    for row in reader.deserialize::<RiskRow>() {
        let row = row?;
        if row.occupancy == 0 {
            continue;
        }
        table.insert(row.occupancy, row.expected_infections / row.occupancy as f64);
    }
    Ok(table)
}
