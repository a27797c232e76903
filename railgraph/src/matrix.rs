use std::collections::HashMap;

use petgraph::algo::dijkstra;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use gtfs::StationKey;

use crate::RailGraph;

/// A city or urban area, represented by one or more of its stations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CityGroup {
    pub name: String,
    pub stations: Vec<StationKey>,
}

impl CityGroup {
    pub fn new(name: impl Into<String>, stations: &[&str]) -> Self {
        Self {
            name: name.into(),
            stations: stations.iter().map(|uic| StationKey::new(*uic)).collect(),
        }
    }
}

/// The fastest way between two cities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Journey {
    pub minutes: i64,
    /// Great-circle distance between the two stations of the fastest pair. None if either
    /// station has no coordinates.
    pub distance_km: Option<f64>,
}

/// Single-source shortest travel times, computed at most once per source station.
pub struct ShortestPaths<'a> {
    graph: &'a RailGraph,
    trees: HashMap<NodeIndex, HashMap<NodeIndex, i64>>,
}

impl<'a> ShortestPaths<'a> {
    pub fn new(graph: &'a RailGraph) -> Self {
        Self {
            graph,
            trees: HashMap::new(),
        }
    }

    /// None when there's no path.
    pub fn travel_time(&mut self, from: NodeIndex, to: NodeIndex) -> Option<i64> {
        let graph = self.graph.inner();
        self.trees
            .entry(from)
            .or_insert_with(|| dijkstra(graph, from, None, |e| e.weight().path_cost()))
            .get(&to)
            .cloned()
    }

    /// Minimum over every (station of `from`, station of `to`) pair, ties going to the first
    /// pair in group order. Stations absent from the graph are ignored.
    pub fn best_journey(&mut self, from: &CityGroup, to: &CityGroup) -> Option<Journey> {
        let graph = self.graph;
        let mut best: Option<Journey> = None;
        for a in &from.stations {
            let a_id = match graph.lookup(a) {
                Some(id) => id,
                None => continue,
            };
            for b in &to.stations {
                let b_id = match graph.lookup(b) {
                    Some(id) => id,
                    None => continue,
                };
                let minutes = match self.travel_time(a_id, b_id) {
                    Some(minutes) => minutes,
                    None => continue,
                };
                if best.map(|j| minutes < j.minutes).unwrap_or(true) {
                    best = Some(Journey {
                        minutes,
                        distance_km: distance_km(graph, a, b),
                    });
                }
            }
        }
        best
    }
}

/// Great-circle distance between two stations of the graph. Zero from a station to itself, even
/// without coordinates.
pub fn distance_km(graph: &RailGraph, a: &StationKey, b: &StationKey) -> Option<f64> {
    if a == b {
        return Some(0.0);
    }
    let a = graph.station(a)?.pos?;
    let b = graph.station(b)?.pos?;
    Some(a.gps_dist_km(b))
}

/// Pairwise best journeys between an ordered list of cities. A None cell means unreachable; the
/// diagonal is 0 minutes and 0 km whenever the city has a station in the graph.
#[derive(Clone, Debug)]
pub struct TravelMatrix {
    labels: Vec<String>,
    cells: Vec<Vec<Option<Journey>>>,
}

impl TravelMatrix {
    pub fn compute(graph: &RailGraph, groups: &[CityGroup]) -> Self {
        let mut paths = ShortestPaths::new(graph);
        let mut cells = Vec::new();
        for from in groups {
            cells.push(
                groups
                    .iter()
                    .map(|to| paths.best_journey(from, to))
                    .collect(),
            );
        }
        for group in groups {
            if group.stations.iter().all(|s| graph.lookup(s).is_none()) {
                warn!("None of the stations of {} are in {}", group.name, graph.name);
            }
        }
        Self {
            labels: groups.iter().map(|g| g.name.clone()).collect(),
            cells,
        }
    }

    /// Just the row of one source city.
    pub fn row(graph: &RailGraph, groups: &[CityGroup], source: usize) -> Vec<Option<Journey>> {
        let mut paths = ShortestPaths::new(graph);
        groups
            .iter()
            .map(|to| paths.best_journey(&groups[source], to))
            .collect()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, from: usize, to: usize) -> Option<Journey> {
        self.cells[from][to]
    }

    pub fn row_of(&self, from: usize) -> &[Option<Journey>] {
        &self.cells[from]
    }

    pub fn minutes(&self) -> Vec<Vec<Option<i64>>> {
        self.map_cells(|j| j.minutes)
    }

    pub fn distances_km(&self) -> Vec<Vec<Option<f64>>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|j| j.and_then(|j| j.distance_km)).collect())
            .collect()
    }

    fn map_cells<T, F: Fn(Journey) -> T>(&self, f: F) -> Vec<Vec<Option<T>>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|j| j.map(&f)).collect())
            .collect()
    }
}

/// Total 2021 travelers of each city's stations in the graph.
pub fn city_travelers(graph: &RailGraph, groups: &[CityGroup]) -> Vec<u64> {
    groups
        .iter()
        .map(|group| {
            group
                .stations
                .iter()
                .filter_map(|s| graph.station(s))
                .map(|s| s.travelers_2021)
                .sum()
        })
        .collect()
}

/// What a destination with no path at all counts for in a weighted travel time: a day.
pub const UNREACHABLE_PENALTY_MINUTES: f64 = 24.0 * 60.0;

/// Average travel time from `source` to every other city, weighted by each destination's
/// travelers. Unreachable destinations count as `UNREACHABLE_PENALTY_MINUTES`, so two rows over
/// the same cities stay comparable even when a new line connects one of them. None if no other
/// city has travelers.
pub fn weighted_travel_time(row: &[Option<Journey>], weights: &[u64], source: usize) -> Option<f64> {
    let mut total = 0.0;
    let mut weight_sum = 0.0;
    for (idx, (journey, weight)) in row.iter().zip(weights).enumerate() {
        if idx == source {
            continue;
        }
        let minutes = match journey {
            Some(journey) => journey.minutes as f64,
            None => UNREACHABLE_PENALTY_MINUTES,
        };
        total += (*weight as f64) * minutes;
        weight_sum += *weight as f64;
    }
    if weight_sum == 0.0 {
        return None;
    }
    Some(total / weight_sum)
}

/// `weighted_travel_time` for every city of the matrix.
pub fn weighted_travel_times(matrix: &TravelMatrix, weights: &[u64]) -> Vec<Option<f64>> {
    (0..matrix.len())
        .map(|idx| weighted_travel_time(matrix.row_of(idx), weights, idx))
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::MergePolicy;

    fn key(uic: &str) -> StationKey {
        StationKey::new(uic)
    }

    fn line() -> RailGraph {
        let mut graph = RailGraph::new("line");
        graph.connect(&key("A"), &key("B"), 10, MergePolicy::LastWriteWins);
        graph.connect(&key("B"), &key("C"), 15, MergePolicy::LastWriteWins);
        graph
    }

    #[test]
    fn goes_through_intermediate_stations() {
        let groups = vec![
            CityGroup::new("a", &["A"]),
            CityGroup::new("b", &["B"]),
            CityGroup::new("c", &["C"]),
        ];
        let matrix = TravelMatrix::compute(&line(), &groups);
        assert_eq!(
            matrix.minutes(),
            vec![
                vec![Some(0), Some(10), Some(25)],
                vec![Some(10), Some(0), Some(15)],
                vec![Some(25), Some(15), Some(0)],
            ]
        );
        assert_eq!(matrix.labels(), &["a", "b", "c"]);
    }

    #[test]
    fn symmetric() {
        let mut graph = line();
        graph.connect(&key("C"), &key("D"), 7, MergePolicy::LastWriteWins);
        graph.connect(&key("A"), &key("D"), 40, MergePolicy::LastWriteWins);
        graph.connect(&key("B"), &key("E"), 3, MergePolicy::LastWriteWins);
        let groups = vec![
            CityGroup::new("ae", &["A", "E"]),
            CityGroup::new("b", &["B"]),
            CityGroup::new("cd", &["C", "D"]),
        ];
        let matrix = TravelMatrix::compute(&graph, &groups);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
            }
        }
    }

    #[test]
    fn distance_of_the_fastest_pair() {
        use gtfs::{LonLat, StationAttributes};

        // Paris has a close slow station and a far fast one
        let mut graph = RailGraph::new("paris");
        graph.connect(&key("P1"), &key("L"), 120, MergePolicy::LastWriteWins);
        graph.connect(&key("P2"), &key("L"), 100, MergePolicy::LastWriteWins);
        for (uic, lon, lat) in [("P1", 2.0, 47.0), ("P2", 2.0, 49.0), ("L", 2.0, 46.0)] {
            graph.merge_attributes(
                &key(uic),
                &StationAttributes {
                    name: None,
                    pos: Some(LonLat::new(lon, lat).unwrap()),
                    travelers_2021: 1,
                },
            );
        }
        let groups = vec![
            CityGroup::new("paris", &["P1", "P2"]),
            CityGroup::new("lyon", &["L"]),
        ];
        let journey = TravelMatrix::compute(&graph, &groups).get(0, 1).unwrap();
        assert_eq!(journey.minutes, 100);
        // 3 degrees of latitude, not 1
        assert_relative_eq!(journey.distance_km.unwrap(), 333.6, epsilon = 0.5);
    }

    #[test]
    fn diagonal_and_unreachable() {
        let mut graph = line();
        graph.add_station(&key("Z"));
        let groups = vec![
            CityGroup::new("a", &["A"]),
            CityGroup::new("z", &["Z"]),
            CityGroup::new("missing", &["nope"]),
        ];
        let matrix = TravelMatrix::compute(&graph, &groups);
        // Stations without coordinates are still 0 km from themselves
        assert_eq!(
            matrix.get(0, 0),
            Some(Journey {
                minutes: 0,
                distance_km: Some(0.0)
            })
        );
        assert_eq!(matrix.get(1, 1).unwrap().minutes, 0);
        assert_eq!(matrix.get(0, 1), None);
        assert_eq!(matrix.get(1, 0), None);
        // A city with no station in the graph is degenerate, even on the diagonal
        assert_eq!(matrix.get(2, 2), None);
        assert_eq!(matrix.distances_km()[0][1], None);
    }

    #[test]
    fn row_matches_full_matrix() {
        let groups = vec![
            CityGroup::new("a", &["A"]),
            CityGroup::new("b", &["B"]),
            CityGroup::new("c", &["C"]),
        ];
        let graph = line();
        let matrix = TravelMatrix::compute(&graph, &groups);
        assert_eq!(TravelMatrix::row(&graph, &groups, 2), matrix.row_of(2));
    }

    #[test]
    fn weighted_average() {
        let row = vec![
            Some(Journey {
                minutes: 0,
                distance_km: None,
            }),
            Some(Journey {
                minutes: 60,
                distance_km: None,
            }),
            Some(Journey {
                minutes: 120,
                distance_km: None,
            }),
            None,
        ];
        // Unreachable, but nobody goes there
        let weights = vec![1000, 3, 1, 0];
        assert_relative_eq!(weighted_travel_time(&row, &weights, 0).unwrap(), 75.0);
        assert_eq!(weighted_travel_time(&row[..1], &weights, 0), None);

        let weights = vec![1000, 3, 1, 50];
        assert_relative_eq!(
            weighted_travel_time(&row, &weights, 0).unwrap(),
            (3.0 * 60.0 + 120.0 + 50.0 * UNREACHABLE_PENALTY_MINUTES) / 54.0
        );
    }
}
