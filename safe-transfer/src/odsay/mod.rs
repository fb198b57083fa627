//! Directions and bus line detail provider client.
//!
//! The provider answers two questions: which public transit itineraries
//! connect two points, and what a bus line's full stop sequence and
//! dispatch timetable look like.
//!
//! Key characteristics of the provider:
//! - Failures are usually reported with HTTP 200 and an `error` payload
//! - Numeric identifiers arrive as numbers or strings, inconsistently
//! - A bus line's `localStationID` is the key into historical ridership

mod client;
mod convert;
mod error;
mod mock;
mod types;

pub use client::{OdsayClient, OdsayConfig};
pub use convert::{ConversionError, convert_bus_lane_detail, convert_search_path};
pub use error::ProviderError;
pub use mock::MockOdsayClient;
pub use types::{BusLaneDetailResponse, SearchPathResponse};
