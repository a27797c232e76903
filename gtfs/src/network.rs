use std::collections::BTreeMap;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Result;
use fs_err::File;

use crate::{
    frequentation, stop_times, stops, Connection, Frequentation, LoadError, LoadReport,
    StationAttributes, StationKey,
};

pub const STOP_TIMES_FILE: &str = "stop_times.txt";
pub const STOPS_FILE: &str = "stops.txt";
/// Lives at the root of the dataset, next to the network directories
pub const FREQUENTATION_FILE: &str = "frequentation-stations.csv";

/// High-speed, inter-city and regional, in the order they're normally merged.
pub const FRENCH_NETWORKS: [&str; 3] = [
    "french_high_speed_network_GTFS",
    "french_inter_city_network_GTFS",
    "french_regional_networks_GTFS",
];

/// Everything one network directory contributes.
pub struct NetworkFeed {
    pub name: String,
    pub connections: Vec<Connection>,
    /// Stations visited by trips, in order of first appearance
    pub stations: Vec<StationKey>,
    /// From stops.txt. May describe stations no trip of this network visits.
    pub attributes: BTreeMap<StationKey, StationAttributes>,
    pub report: LoadReport,
}

/// A directory holding one subdirectory per network, plus the frequentation table.
pub struct Dataset {
    root: PathBuf,
    frequentation: Frequentation,
}

impl Dataset {
    /// Reads the frequentation table. Fails if it's missing.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let path = root.join(FREQUENTATION_FILE);
        let frequentation = frequentation::load(open_file(&path)?, &path)?;
        info!(
            "{} stations have a traveler count in {}",
            frequentation.len(),
            path.display()
        );
        Ok(Self {
            root,
            frequentation,
        })
    }

    /// Any missing file fails the whole network. Bad rows are skipped and counted in the report.
    pub fn load_network(&self, name: &str) -> Result<NetworkFeed> {
        let dir = self.root.join(name);

        let path = dir.join(STOP_TIMES_FILE);
        let stop_times = stop_times::load(open_file(&path)?, &path)?;

        let path = dir.join(STOPS_FILE);
        let attributes = stops::load(open_file(&path)?, &path, &self.frequentation)?;

        let report = stop_times.report;
        info!(
            "{name}: {} connections between {} stations from {} rows ({} skipped, {} past midnight)",
            stop_times.connections.len(),
            stop_times.stations.len(),
            report.rows,
            report.skipped_rows,
            report.overnight_hops
        );

        Ok(NetworkFeed {
            name: name.to_string(),
            connections: stop_times.connections,
            stations: stop_times.stations,
            attributes,
            report,
        })
    }
}

fn open_file(path: &Path) -> Result<BufReader<File>> {
    match File::open(path) {
        Ok(file) => Ok(BufReader::new(file)),
        Err(err) => Err(LoadError::unavailable(path, err).into()),
    }
}
