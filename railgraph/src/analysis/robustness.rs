use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences, NodeIndexable};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use gtfs::StationKey;

use super::component_sizes;
use crate::{Link, RailGraph, Station};

/// Which station to knock out next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemovalStrategy {
    /// Failures: a random order, fixed by the seed
    Random { seed: u64 },
    /// Attacks: the station with the most neighbours left, recomputed after every removal
    HighestDegree,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RobustnessStep {
    /// None for the intact graph
    pub removed: Option<StationKey>,
    pub removed_count: usize,
    /// Size of the largest connected component, relative to the original station count
    pub lcc_fraction: f64,
}

/// Removes up to `steps` stations from a copy of the graph, one at a time, recording how the
/// largest connected component shrinks. The first step is the intact graph.
pub fn node_removal(
    graph: &RailGraph,
    strategy: RemovalStrategy,
    steps: usize,
) -> Vec<RobustnessStep> {
    let mut g: StableUnGraph<Station, Link> = graph.inner().clone().into();
    let original = g.node_count();

    let mut order: Vec<NodeIndex> = g.node_indices().collect();
    if let RemovalStrategy::Random { seed } = strategy {
        order.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
    }

    let mut results = vec![RobustnessStep {
        removed: None,
        removed_count: 0,
        lcc_fraction: lcc_fraction(&g, original),
    }];
    for step in 0..steps.min(original) {
        let victim = match strategy {
            RemovalStrategy::Random { .. } => order[step],
            RemovalStrategy::HighestDegree => match highest_degree(&g) {
                Some(node) => node,
                None => break,
            },
        };
        let station = match g.remove_node(victim) {
            Some(station) => station,
            None => break,
        };
        results.push(RobustnessStep {
            removed: Some(station.key),
            removed_count: step + 1,
            lcc_fraction: lcc_fraction(&g, original),
        });
    }
    results
}

// Ties go to the lowest index, which is the station seen first
fn highest_degree(g: &StableUnGraph<Station, Link>) -> Option<NodeIndex> {
    let mut best: Option<(NodeIndex, usize)> = None;
    for node in g.node_indices() {
        let degree = g.neighbors(node).filter(|n| *n != node).count();
        if best.map(|(_, d)| degree > d).unwrap_or(true) {
            best = Some((node, degree));
        }
    }
    best.map(|(node, _)| node)
}

fn lcc_fraction(g: &StableUnGraph<Station, Link>, original: usize) -> f64 {
    if original == 0 {
        return 0.0;
    }
    let sizes = component_sizes(
        g.node_bound(),
        g.node_indices().map(|n| n.index()),
        g.edge_references()
            .map(|e| (e.source().index(), e.target().index())),
    );
    sizes.first().cloned().unwrap_or(0) as f64 / original as f64
}
