//! Reads the SNCF GTFS exports: one directory per network, each with stop_times.txt and
//! stops.txt, plus a dataset-wide frequentation table. Only the handful of fields needed to
//! build a station graph are used.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod error;
mod frequentation;
mod ids;
mod lonlat;
mod network;
mod stop_times;
mod stops;
mod time;

pub use error::LoadError;
pub use frequentation::{Frequentation, DEFAULT_TRAVELERS};
pub use ids::{canonical_key, orig, StationKey, STOP_POINT_PREFIX};
pub use lonlat::LonLat;
pub use network::{
    Dataset, NetworkFeed, FREQUENTATION_FILE, FRENCH_NETWORKS, STOPS_FILE, STOP_TIMES_FILE,
};
pub use stop_times::{Connection, LoadReport, StopTimes};
pub use stops::StationAttributes;
pub use time::{travel_minutes, ScheduleTime};
