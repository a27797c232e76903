use std::collections::BTreeMap;
use std::fmt;

use super::{small_world, Adjacency, SmallWorld};
use crate::RailGraph;

/// The summary block printed for each scenario.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphInfo {
    pub name: String,
    pub nodes: usize,
    pub isolates: usize,
    pub edges: usize,
    pub self_loops: usize,
    pub mean_degree: f64,
    pub max_degree: usize,
    /// Percentage of stations in the largest connected component
    pub lcc_percent: f64,
    pub components: usize,
    pub clustering: f64,
    pub small_world: Option<SmallWorld>,
    pub assortativity: Option<f64>,
}

/// Pass a seed to also estimate the small-world coefficient, which is much slower.
pub fn info(graph: &RailGraph, small_world_seed: Option<u64>) -> GraphInfo {
    let adj = Adjacency::new(graph);
    let nodes = adj.len();
    let components = adj.component_sizes();
    GraphInfo {
        name: graph.name.clone(),
        nodes,
        isolates: adj.degree.iter().filter(|d| **d == 0).count(),
        edges: adj.edges,
        self_loops: adj.self_loops,
        mean_degree: if nodes == 0 {
            0.0
        } else {
            2.0 * adj.edges as f64 / nodes as f64
        },
        max_degree: adj.degree.iter().max().cloned().unwrap_or(0),
        lcc_percent: match components.first() {
            Some(size) => 100.0 * *size as f64 / nodes as f64,
            None => 0.0,
        },
        components: components.len(),
        clustering: adj.average_clustering(),
        small_world: small_world_seed.and_then(|seed| small_world(graph, seed)),
        assortativity: assortativity(graph, &adj),
    }
}

impl fmt::Display for GraphInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{:>12} | '{}'", "Graph", self.name)?;
        writeln!(
            f,
            "{:>12} | {} ({})",
            "Nodes",
            prettyprint_usize(self.nodes),
            prettyprint_usize(self.isolates)
        )?;
        writeln!(
            f,
            "{:>12} | {} ({})",
            "Edges",
            prettyprint_usize(self.edges),
            prettyprint_usize(self.self_loops)
        )?;
        writeln!(
            f,
            "{:>12} | {:.2} ({})",
            "Degree",
            self.mean_degree,
            prettyprint_usize(self.max_degree)
        )?;
        writeln!(
            f,
            "{:>12} | {:.1}% ({})",
            "LCC",
            self.lcc_percent,
            prettyprint_usize(self.components)
        )?;
        writeln!(f, "{:>12} | {:.4}", "Clustering", self.clustering)?;
        if let Some(ref sw) = self.small_world {
            writeln!(
                f,
                "{:>12} | {:.2} {:.2} {:.2}",
                "Small world", sw.sigma, sw.clustering_ratio, sw.path_length_ratio
            )?;
        }
        if let Some(r) = self.assortativity {
            writeln!(f, "{:>12} | {:.2}", "Assort.", r)?;
        }
        Ok(())
    }
}

/// How many stations have each degree.
#[derive(Clone, Debug, PartialEq)]
pub struct DegreeDistribution {
    pub counts: BTreeMap<usize, usize>,
    /// The degree of every station that has at least one connection, in node order
    pub nonzero: Vec<usize>,
}

pub fn degree_distribution(graph: &RailGraph) -> DegreeDistribution {
    let adj = Adjacency::new(graph);
    let mut counts = BTreeMap::new();
    for degree in &adj.degree {
        *counts.entry(*degree).or_insert(0) += 1;
    }
    DegreeDistribution {
        counts,
        nonzero: adj.degree.into_iter().filter(|d| *d > 0).collect(),
    }
}

/// Pearson correlation between the degrees at both ends of each connection. None when it's
/// undefined (no connections, or every endpoint has the same degree).
pub fn degree_assortativity(graph: &RailGraph) -> Option<f64> {
    assortativity(graph, &Adjacency::new(graph))
}

fn assortativity(graph: &RailGraph, adj: &Adjacency) -> Option<f64> {
    use petgraph::visit::EdgeRef;

    let mut pairs = Vec::new();
    for edge in graph.inner().edge_references() {
        let a = adj.degree[edge.source().index()] as f64;
        let b = adj.degree[edge.target().index()] as f64;
        pairs.push((a, b));
        pairs.push((b, a));
    }
    if pairs.is_empty() {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// 1234567 -> "1,234,567"
pub(crate) fn prettyprint_usize(x: usize) -> String {
    let digits = x.to_string();
    let mut result = String::new();
    for (idx, c) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use gtfs::StationKey;

    use super::*;
    use crate::MergePolicy;

    fn graph(edges: &[(&str, &str)]) -> RailGraph {
        let mut graph = RailGraph::new("test");
        for (a, b) in edges {
            graph.connect(
                &StationKey::new(*a),
                &StationKey::new(*b),
                1,
                MergePolicy::LastWriteWins,
            );
        }
        graph
    }

    #[test]
    fn summary() {
        let mut g = graph(&[("a", "b"), ("b", "c"), ("c", "a"), ("c", "d"), ("e", "f")]);
        g.add_station(&StationKey::new("lonely"));
        let info = info(&g, None);
        assert_eq!(info.nodes, 7);
        assert_eq!(info.isolates, 1);
        assert_eq!(info.edges, 5);
        assert_eq!(info.self_loops, 0);
        assert_relative_eq!(info.mean_degree, 10.0 / 7.0);
        assert_eq!(info.max_degree, 3);
        assert_eq!(info.components, 3);
        assert_relative_eq!(info.lcc_percent, 400.0 / 7.0);
        assert_relative_eq!(info.clustering, (1.0 + 1.0 + 1.0 / 3.0) / 7.0);
        assert!(info.small_world.is_none());

        let text = info.to_string();
        assert!(text.contains("       Graph | 'test'"), "{text}");
        assert!(text.contains("         LCC | 57.1% (3)"), "{text}");
    }

    #[test]
    fn distribution() {
        let g = graph(&[("a", "b"), ("a", "c"), ("a", "d"), ("e", "e")]);
        let dist = degree_distribution(&g);
        assert_eq!(
            dist.counts.into_iter().collect::<Vec<_>>(),
            vec![(1, 3), (2, 1), (3, 1)]
        );
        assert_eq!(dist.nonzero, vec![3, 1, 1, 1, 2]);
    }

    #[test]
    fn star_is_disassortative() {
        let g = graph(&[("hub", "a"), ("hub", "b"), ("hub", "c"), ("hub", "d")]);
        assert_relative_eq!(degree_assortativity(&g).unwrap(), -1.0);
        assert_eq!(degree_assortativity(&graph(&[("a", "b")])), None);
    }

    #[test]
    fn thousands() {
        assert_eq!(prettyprint_usize(0), "0");
        assert_eq!(prettyprint_usize(999), "999");
        assert_eq!(prettyprint_usize(1000), "1,000");
        assert_eq!(prettyprint_usize(1234567), "1,234,567");
    }
}
