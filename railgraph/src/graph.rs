use std::collections::BTreeMap;

use anyhow::Result;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use gtfs::{LonLat, StationAttributes, StationKey, DEFAULT_TRAVELERS};

/// A node of the rail network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub key: StationKey,
    pub name: Option<String>,
    /// Missing for stations the feeds don't geocode
    pub pos: Option<LonLat>,
    pub travelers_2021: u64,
}

impl Station {
    fn new(key: StationKey) -> Self {
        Self {
            key,
            name: None,
            pos: None,
            travelers_2021: DEFAULT_TRAVELERS,
        }
    }

    pub fn describe(&self) -> String {
        match self.name {
            Some(ref name) => name.clone(),
            None => format!("UIC {}", self.key),
        }
    }

    fn merge(&mut self, attributes: &StationAttributes) {
        if attributes.name.is_some() {
            self.name = attributes.name.clone();
        }
        if attributes.pos.is_some() {
            self.pos = attributes.pos;
        }
        self.travelers_2021 = attributes.travelers_2021;
    }
}

/// The weight of an edge: minutes of scheduled travel between two stations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub travel_time: i64,
}

impl Link {
    /// Shortest paths need non-negative weights. Negative travel times (bad clocks in the feed)
    /// count as zero there, but are stored unchanged.
    pub fn path_cost(self) -> i64 {
        self.travel_time.max(0)
    }
}

/// How to resolve two trips producing the same station pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// The last connection folded in wins, including across networks
    #[default]
    LastWriteWins,
    /// Keep the smallest travel time seen
    Fastest,
}

/// Stations and the direct runs between them. One node per station, one edge per unordered
/// station pair.
#[derive(Clone)]
pub struct RailGraph {
    pub name: String,
    graph: UnGraph<Station, Link>,
    ids: BTreeMap<StationKey, NodeIndex>,
}

impl RailGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graph: UnGraph::default(),
            ids: BTreeMap::new(),
        }
    }

    /// Idempotent
    pub fn add_station(&mut self, key: &StationKey) -> NodeIndex {
        if let Some(id) = self.ids.get(key) {
            return *id;
        }
        let id = self.graph.add_node(Station::new(key.clone()));
        self.ids.insert(key.clone(), id);
        id
    }

    /// Returns false if the station isn't in the graph; attributes never create stations.
    pub fn merge_attributes(&mut self, key: &StationKey, attributes: &StationAttributes) -> bool {
        match self.ids.get(key) {
            Some(id) => {
                self.graph[*id].merge(attributes);
                true
            }
            None => false,
        }
    }

    /// Adds both stations if needed.
    pub fn connect(
        &mut self,
        from: &StationKey,
        to: &StationKey,
        travel_time: i64,
        policy: MergePolicy,
    ) {
        let a = self.add_station(from);
        let b = self.add_station(to);
        match (policy, self.graph.find_edge(a, b)) {
            (MergePolicy::Fastest, Some(edge)) => {
                let link = &mut self.graph[edge];
                link.travel_time = link.travel_time.min(travel_time);
            }
            _ => {
                self.graph.update_edge(a, b, Link { travel_time });
            }
        }
    }

    /// A copy of this graph with one more connection. Both stations must already exist. If
    /// they're already directly connected, the faster of the two runs is kept.
    pub fn with_connection(
        &self,
        from: &StationKey,
        to: &StationKey,
        travel_time: i64,
    ) -> Result<RailGraph> {
        for key in [from, to] {
            if !self.ids.contains_key(key) {
                bail!("{} has no station {}", self.name, key);
            }
        }
        let mut copy = self.clone();
        copy.connect(from, to, travel_time, MergePolicy::Fastest);
        Ok(copy)
    }

    pub fn lookup(&self, key: &StationKey) -> Option<NodeIndex> {
        self.ids.get(key).cloned()
    }

    pub fn station(&self, key: &StationKey) -> Option<&Station> {
        self.lookup(key).map(|id| &self.graph[id])
    }

    /// In node order, which is the order stations were first seen.
    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.graph.node_indices().map(move |id| &self.graph[id])
    }

    pub fn connections(&self) -> impl Iterator<Item = (&Station, &Station, i64)> {
        self.graph.edge_references().map(move |edge| {
            (
                &self.graph[edge.source()],
                &self.graph[edge.target()],
                edge.weight().travel_time,
            )
        })
    }

    pub fn travel_time(&self, from: &StationKey, to: &StationKey) -> Option<i64> {
        let edge = self.graph.find_edge(self.lookup(from)?, self.lookup(to)?)?;
        Some(self.graph[edge].travel_time)
    }

    pub fn station_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn connection_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// For analyses that need the underlying petgraph.
    pub fn inner(&self) -> &UnGraph<Station, Link> {
        &self.graph
    }
}
