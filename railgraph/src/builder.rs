use anyhow::{Context, Result};

use gtfs::{Dataset, NetworkFeed};

use crate::{MergePolicy, RailGraph};

/// Builds a RailGraph from an explicit, ordered list of networks of one dataset.
pub struct RailGraphBuilder<'a> {
    dataset: &'a Dataset,
    policy: MergePolicy,
}

impl<'a> RailGraphBuilder<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self {
            dataset,
            policy: MergePolicy::default(),
        }
    }

    pub fn merge_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Networks are folded in order, so with `LastWriteWins`, later networks decide the travel
    /// time of a station pair they share with earlier ones. A network that can't be loaded fails
    /// the whole build.
    pub fn build<S: AsRef<str>>(&self, networks: &[S]) -> Result<RailGraph> {
        let name = networks
            .iter()
            .map(|n| n.as_ref())
            .collect::<Vec<_>>()
            .join(" + ");
        let mut graph = RailGraph::new(name);
        for network in networks {
            let network = network.as_ref();
            let feed = self
                .dataset
                .load_network(network)
                .with_context(|| format!("loading network {network}"))?;
            fold_feed(&mut graph, &feed, self.policy);
        }
        info!(
            "{}: {} stations, {} connections",
            graph.name,
            graph.station_count(),
            graph.connection_count()
        );
        Ok(graph)
    }
}

impl RailGraph {
    /// Like `RailGraphBuilder::build`, for feeds already in memory.
    pub fn from_feeds(name: impl Into<String>, feeds: &[NetworkFeed], policy: MergePolicy) -> Self {
        let mut graph = RailGraph::new(name);
        for feed in feeds {
            fold_feed(&mut graph, feed, policy);
        }
        graph
    }
}

/// Stations visited by trips and their connections go in first. Then the network's attribute
/// file decorates whatever stations are in the graph so far, including ones an earlier network
/// introduced.
fn fold_feed(graph: &mut RailGraph, feed: &NetworkFeed, policy: MergePolicy) {
    for station in &feed.stations {
        graph.add_station(station);
    }
    for conn in &feed.connections {
        graph.connect(&conn.from, &conn.to, conn.travel_time, policy);
    }

    let mut unused = 0;
    for (station, attributes) in &feed.attributes {
        if !graph.merge_attributes(station, attributes) {
            unused += 1;
        }
    }
    debug!(
        "{}: {} stop attributes for stations no trip visits",
        feed.name, unused
    );
}
