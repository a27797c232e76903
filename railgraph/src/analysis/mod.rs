//! Descriptive statistics over a RailGraph: topology, centrality, small-world coefficient and
//! robustness to station removal. Everything returns plain data; rendering happens elsewhere.

mod centrality;
mod robustness;
mod small_world;
mod topology;

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;

pub use centrality::{betweenness, closeness, pagerank, tops};
pub use robustness::{node_removal, RemovalStrategy, RobustnessStep};
pub use small_world::{erdos_renyi, small_world, SmallWorld};
pub use topology::{degree_assortativity, degree_distribution, info, DegreeDistribution, GraphInfo};

use crate::RailGraph;

/// Neighbour lists by node index, without self-loops or duplicates. Degrees count a self-loop
/// twice, like the usual graph-theory convention.
pub(crate) struct Adjacency {
    pub neighbours: Vec<Vec<usize>>,
    pub degree: Vec<usize>,
    pub self_loops: usize,
    pub edges: usize,
}

impl Adjacency {
    pub fn new(graph: &RailGraph) -> Self {
        let g = graph.inner();
        Self::from_edges(
            g.node_count(),
            g.edge_references()
                .map(|e| (e.source().index(), e.target().index())),
        )
    }

    pub fn from_edges(nodes: usize, edges: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut sets = vec![BTreeSet::new(); nodes];
        let mut degree = vec![0; nodes];
        let mut self_loops = 0;
        let mut count = 0;
        for (a, b) in edges {
            count += 1;
            degree[a] += 1;
            degree[b] += 1;
            if a == b {
                self_loops += 1;
            } else {
                sets[a].insert(b);
                sets[b].insert(a);
            }
        }
        Self {
            neighbours: sets.into_iter().map(|s| s.into_iter().collect()).collect(),
            degree,
            self_loops,
            edges: count,
        }
    }

    pub fn len(&self) -> usize {
        self.neighbours.len()
    }

    /// Hop counts from `source` to every reachable node, itself excluded.
    pub fn hop_distances(&self, source: usize) -> Vec<usize> {
        let mut dist = vec![usize::MAX; self.len()];
        dist[source] = 0;
        let mut queue = VecDeque::new();
        queue.push_back(source);
        let mut result = Vec::new();
        while let Some(node) = queue.pop_front() {
            for &next in &self.neighbours[node] {
                if dist[next] == usize::MAX {
                    dist[next] = dist[node] + 1;
                    result.push(dist[next]);
                    queue.push_back(next);
                }
            }
        }
        result
    }

    /// Sizes of connected components, largest first.
    pub fn component_sizes(&self) -> Vec<usize> {
        component_sizes(
            self.len(),
            0..self.len(),
            self.neighbours
                .iter()
                .enumerate()
                .flat_map(|(a, nbrs)| nbrs.iter().map(move |b| (a, *b))),
        )
    }

    /// Fraction of possible links among each node's neighbours, averaged over all nodes. Nodes
    /// with fewer than two neighbours count as zero.
    pub fn average_clustering(&self) -> f64 {
        if self.len() == 0 {
            return 0.0;
        }
        let mut total = 0.0;
        for node in 0..self.len() {
            let nbrs = &self.neighbours[node];
            let k = nbrs.len();
            if k < 2 {
                continue;
            }
            let mut links = 0;
            for (i, a) in nbrs.iter().enumerate() {
                for b in &nbrs[i + 1..] {
                    // neighbour lists are sorted
                    if self.neighbours[*a].binary_search(b).is_ok() {
                        links += 1;
                    }
                }
            }
            total += 2.0 * links as f64 / (k * (k - 1)) as f64;
        }
        total / self.len() as f64
    }
}

/// Sizes of connected components, largest first. `nodes` are the live node indices, all below
/// `bound`; indices in between may be unused.
pub(crate) fn component_sizes(
    bound: usize,
    nodes: impl IntoIterator<Item = usize>,
    edges: impl IntoIterator<Item = (usize, usize)>,
) -> Vec<usize> {
    let mut sets = UnionFind::new(bound);
    for (a, b) in edges {
        sets.union(a, b);
    }
    let mut sizes: BTreeMap<usize, usize> = BTreeMap::new();
    for node in nodes {
        *sizes.entry(sets.find(node)).or_insert(0) += 1;
    }
    let mut sizes: Vec<usize> = sizes.into_values().collect();
    sizes.sort_by(|a, b| b.cmp(a));
    sizes
}
