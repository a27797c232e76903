use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{orig, Frequentation, LoadError, LonLat, StationKey, DEFAULT_TRAVELERS};

/// What the attribute files know about a station. Fields may be missing; stations without
/// coordinates exist.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StationAttributes {
    pub name: Option<String>,
    pub pos: Option<LonLat>,
    pub travelers_2021: u64,
}

impl Default for StationAttributes {
    fn default() -> Self {
        Self {
            name: None,
            pos: None,
            travelers_2021: DEFAULT_TRAVELERS,
        }
    }
}

impl StationAttributes {
    /// Fields present in `other` overwrite ours.
    pub fn merge(&mut self, other: &StationAttributes) {
        if other.name.is_some() {
            self.name = other.name.clone();
        }
        if other.pos.is_some() {
            self.pos = other.pos;
        }
        self.travelers_2021 = other.travelers_2021;
    }
}

/// Reads the stop points of stops.txt, keyed by station. Several stop points (one per train
/// category) usually share a station; later rows overwrite earlier ones field by field.
pub fn load<R: std::io::Read>(
    reader: R,
    path: &Path,
    frequentation: &Frequentation,
) -> Result<BTreeMap<StationKey, StationAttributes>> {
    let mut csv = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv.headers()?.clone();

    let mut stations: BTreeMap<StationKey, StationAttributes> = BTreeMap::new();
    let mut skipped = 0;
    for rec in csv.records() {
        let rec = match rec {
            Ok(rec) => rec,
            Err(err) if err.is_io_error() => {
                let err = std::io::Error::new(std::io::ErrorKind::Other, err);
                return Err(LoadError::unavailable(path, err).into());
            }
            Err(err) => {
                warn!("Skipping row of {}: {err}", path.display());
                skipped += 1;
                continue;
            }
        };
        let line = rec.position().map(|pos| pos.line()).unwrap_or(0);
        match parse_row(&rec, &headers, frequentation) {
            Ok(Some((station, attributes))) => {
                stations.entry(station).or_default().merge(&attributes);
            }
            Ok(None) => {}
            Err(reason) => {
                warn!("Skipping row: {}", LoadError::malformed(path, line, reason));
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        warn!("{} rows of {} skipped", skipped, path.display());
    }
    Ok(stations)
}

#[derive(Deserialize)]
struct Record {
    stop_id: orig::StopID,
    stop_name: Option<String>,
    stop_lat: Option<f64>,
    stop_lon: Option<f64>,
}

fn parse_row(
    rec: &csv::StringRecord,
    headers: &csv::StringRecord,
    frequentation: &Frequentation,
) -> Result<Option<(StationKey, StationAttributes)>> {
    let rec: Record = rec.deserialize(Some(headers))?;
    if !rec.stop_id.is_stop_point() {
        return Ok(None);
    }
    let station = rec.stop_id.canonical()?;
    let pos = match (rec.stop_lon, rec.stop_lat) {
        (Some(lon), Some(lat)) => Some(LonLat::new(lon, lat)?),
        _ => None,
    };
    let travelers_2021 = frequentation.travelers_2021(&station);
    Ok(Some((
        station,
        StationAttributes {
            name: rec.stop_name.filter(|name| !name.is_empty()),
            pos,
            travelers_2021,
        },
    )))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn stop_points_only() {
        let input = "\
stop_id,stop_name,stop_desc,stop_lat,stop_lon,zone_id,stop_url,location_type,parent_station
StopArea:OCE87686006,Paris Gare de Lyon,,48.844,2.373,,,1,
StopPoint:OCETGV INOUI-87686006,Paris Gare de Lyon,,48.8443,2.3733,,,0,StopArea:OCE87686006
StopPoint:OCETrain TER-87686006,Paris Gare de Lyon Hall 2,,,,,,0,StopArea:OCE87686006
StopPoint:OCETrain TER-87000001,Sans Coordonnées,,,,,,0,
StopPoint:OCETrain TER-87000002,Ailleurs,,north,2.0,,,0,
StopPoint:OCETrain TER,Pas de code,,45.0,2.0,,,0,
";
        let frequentation =
            Frequentation::from_counts(vec![(StationKey::new("87686006"), 36_000_000)]);
        let stations = load(input.as_bytes(), Path::new("stops.txt"), &frequentation).unwrap();

        assert_eq!(
            stations.keys().map(|k| k.as_str()).collect::<Vec<_>>(),
            vec!["87000001", "87686006"]
        );
        // The second stop point renames the station, but keeps the first's coordinates
        assert_eq!(
            stations[&StationKey::new("87686006")],
            StationAttributes {
                name: Some("Paris Gare de Lyon Hall 2".to_string()),
                pos: Some(LonLat::new(2.3733, 48.8443).unwrap()),
                travelers_2021: 36_000_000,
            }
        );
        assert_eq!(
            stations[&StationKey::new("87000001")],
            StationAttributes {
                name: Some("Sans Coordonnées".to_string()),
                pos: None,
                travelers_2021: DEFAULT_TRAVELERS,
            }
        );
    }
}
