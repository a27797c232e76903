use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

use crate::{orig, travel_minutes, LoadError, ScheduleTime, StationKey};

/// A scheduled direct run between two consecutive stops of one trip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    pub from: StationKey,
    pub to: StationKey,
    /// Floor of the seconds delta divided by 60. Can be zero or negative if the feed's clocks
    /// disagree.
    pub travel_time: i64,
}

/// What one stop_times.txt contributes to the graph.
#[derive(Default)]
pub struct StopTimes {
    /// In file order
    pub connections: Vec<Connection>,
    /// Every station visited by some trip, in order of first appearance
    pub stations: Vec<StationKey>,
    pub report: LoadReport,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows: usize,
    pub skipped_rows: usize,
    /// Hops touching a time past midnight, which produce no connection
    pub overnight_hops: usize,
}

/// Rows must be grouped by trip and ordered by stop_sequence. That's how the SNCF exports are
/// laid out. A trip whose first rows are unusable starts at its first good row.
pub fn load<R: std::io::Read>(reader: R, path: &Path) -> Result<StopTimes> {
    let mut csv = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv.headers()?.clone();

    let mut folder = TripFolder::default();
    for rec in csv.records() {
        let rec = match rec {
            Ok(rec) => rec,
            Err(err) if err.is_io_error() => {
                let err = std::io::Error::new(std::io::ErrorKind::Other, err);
                return Err(LoadError::unavailable(path, err).into());
            }
            Err(err) => {
                let line = err.position().map(|pos| pos.line()).unwrap_or(0);
                folder.skip(LoadError::malformed(path, line, err));
                continue;
            }
        };
        let line = rec.position().map(|pos| pos.line()).unwrap_or(0);
        folder.stop_times.report.rows += 1;
        match parse_row(&rec, &headers) {
            Ok(row) => folder.visit(row),
            Err(reason) => folder.skip(LoadError::malformed(path, line, reason)),
        }
    }
    Ok(folder.stop_times)
}

#[derive(Deserialize)]
struct Record {
    trip_id: orig::TripID,
    arrival_time: String,
    departure_time: String,
    stop_id: orig::StopID,
    stop_sequence: usize,
}

struct Row {
    trip_id: orig::TripID,
    station: StationKey,
    arrival_time: ScheduleTime,
    departure_time: ScheduleTime,
    stop_sequence: usize,
}

fn parse_row(rec: &csv::StringRecord, headers: &csv::StringRecord) -> Result<Row> {
    let rec: Record = rec.deserialize(Some(headers))?;
    Ok(Row {
        trip_id: rec.trip_id,
        station: rec.stop_id.canonical()?,
        arrival_time: rec.arrival_time.parse()?,
        departure_time: rec.departure_time.parse()?,
        stop_sequence: rec.stop_sequence,
    })
}

#[derive(Default)]
struct TripFolder {
    stop_times: StopTimes,
    seen: BTreeSet<StationKey>,
    previous: Option<Departure>,
}

// Where the current trip last departed from
struct Departure {
    trip_id: orig::TripID,
    station: StationKey,
    time: ScheduleTime,
}

impl TripFolder {
    fn visit(&mut self, row: Row) {
        self.register(&row.station);

        let previous = self
            .previous
            .take()
            .filter(|prev| prev.trip_id == row.trip_id);
        if row.stop_sequence > 0 {
            match previous {
                Some(prev) => match travel_minutes(prev.time, row.arrival_time) {
                    Some(travel_time) => {
                        self.stop_times.connections.push(Connection {
                            from: prev.station,
                            to: row.station.clone(),
                            travel_time,
                        });
                    }
                    None => {
                        self.stop_times.report.overnight_hops += 1;
                    }
                },
                None => {
                    warn!(
                        "Stop {} at sequence {} of trip {} doesn't follow a stop of the same trip; \
                         treating it as the start",
                        row.station, row.stop_sequence, row.trip_id.0
                    );
                }
            }
        }
        self.previous = Some(Departure {
            trip_id: row.trip_id,
            station: row.station,
            time: row.departure_time,
        });
    }

    fn skip(&mut self, err: LoadError) {
        warn!("Skipping row: {err}");
        self.stop_times.report.skipped_rows += 1;
    }

    fn register(&mut self, station: &StationKey) {
        if self.seen.insert(station.clone()) {
            self.stop_times.stations.push(station.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const HEADER: &str =
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence,stop_headsign,pickup_type\n";

    fn run(rows: &str) -> StopTimes {
        let input = format!("{HEADER}{rows}");
        load(input.as_bytes(), Path::new("stop_times.txt")).unwrap()
    }

    fn key(uic: &str) -> StationKey {
        StationKey::new(uic)
    }

    fn conn(from: &str, to: &str, travel_time: i64) -> Connection {
        Connection {
            from: key(from),
            to: key(to),
            travel_time,
        }
    }

    #[test]
    fn consecutive_stops() {
        let stop_times = run("\
t1,08:00:00,08:00:00,StopPoint:OCETGV INOUI-87686006,0,,0
t1,10:01:00,10:05:00,StopPoint:OCETGV INOUI-87723197,1,,0
t1,13:20:30,13:20:30,StopPoint:OCETGV INOUI-87751008,2,,0
t2,09:00:00,09:00:00,StopPoint:OCETrain TER-87723197,0,,0
t2,09:10:00,09:12:00,StopPoint:OCETrain TER-87722025,1,,0
");
        assert_eq!(
            stop_times.connections,
            vec![
                conn("87686006", "87723197", 121),
                conn("87723197", "87751008", 195),
                conn("87723197", "87722025", 10),
            ]
        );
        assert_eq!(
            stop_times.stations,
            vec![
                key("87686006"),
                key("87723197"),
                key("87751008"),
                key("87722025")
            ]
        );
        assert_eq!(
            stop_times.report,
            LoadReport {
                rows: 5,
                skipped_rows: 0,
                overnight_hops: 0,
            }
        );
    }

    #[test]
    fn hop_past_midnight_registers_both_stations() {
        let stop_times = run("\
t1,23:40:00,23:45:00,StopPoint:OCETrain TER-87000001,0,,0
t1,24:10:00,24:12:00,StopPoint:OCETrain TER-87000002,1,,0
");
        assert!(stop_times.connections.is_empty());
        assert_eq!(stop_times.stations, vec![key("87000001"), key("87000002")]);
        assert_eq!(stop_times.report.overnight_hops, 1);
    }

    #[test]
    fn skipped_hop_still_advances_the_trip() {
        let stop_times = run("\
t1,22:00:00,22:00:00,StopPoint:OCETrain TER-87000001,0,,0
t1,23:50:00,24:05:00,StopPoint:OCETrain TER-87000002,1,,0
t1,24:30:00,24:31:00,StopPoint:OCETrain TER-87000003,2,,0
t2,05:00:00,05:00:00,StopPoint:OCETrain TER-87000003,0,,0
t2,05:20:00,05:20:00,StopPoint:OCETrain TER-87000004,1,,0
");
        // 1 -> 2 is fine (departure 22:00, arrival 23:50), 2 -> 3 departs at 24:05
        assert_eq!(
            stop_times.connections,
            vec![
                conn("87000001", "87000002", 110),
                conn("87000003", "87000004", 20)
            ]
        );
        assert_eq!(stop_times.report.overnight_hops, 1);
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let stop_times = run("\
t1,08:00:00,08:00:00,StopPoint:OCETrain TER-87000001,0,,0
t1,08:1x:00,08:12:00,StopPoint:OCETrain TER-87000002,1,,0
t1,08:30:00,08:31:00,StopPoint:OCETrain TER,2,,0
t1,08:40:00,08:41:00,StopPoint:OCETrain TER-87000004,three,,0
t1,08:50:00,08:50:00,StopPoint:OCETrain TER-87000005,4,,0
");
        // The bad rows don't break the trip; 1 connects straight to 5
        assert_eq!(
            stop_times.connections,
            vec![conn("87000001", "87000005", 50)]
        );
        assert_eq!(stop_times.report.rows, 5);
        assert_eq!(stop_times.report.skipped_rows, 3);
    }

    #[test]
    fn trips_never_connect_to_each_other() {
        // t2 loses its first row, so it starts at 87999998
        let stop_times = run("\
t1,08:00:00,08:00:00,StopPoint:OCETrain TER-87000001,0,,0
t1,08:30:00,08:30:00,StopPoint:OCETrain TER-87000002,1,,0
t2,10:00:00,1x:00:00,StopPoint:OCETrain TER-87999997,0,,0
t2,10:30:00,10:32:00,StopPoint:OCETrain TER-87999998,1,,0
t2,11:00:00,11:00:00,StopPoint:OCETrain TER-87999999,2,,0
");
        assert_eq!(
            stop_times.connections,
            vec![
                conn("87000001", "87000002", 30),
                conn("87999998", "87999999", 28)
            ]
        );
        assert_eq!(stop_times.report.skipped_rows, 1);
        assert!(!stop_times.stations.contains(&key("87999997")));
    }

    #[test]
    fn negative_travel_time_is_kept() {
        let stop_times = run("\
t1,08:00:00,08:10:00,StopPoint:OCETrain TER-87000001,0,,0
t1,08:05:00,08:06:00,StopPoint:OCETrain TER-87000002,1,,0
");
        assert_eq!(
            stop_times.connections,
            vec![conn("87000001", "87000002", -5)]
        );
    }
}
