use std::collections::VecDeque;

use petgraph::algo::dijkstra;
use petgraph::visit::EdgeRef;
use rayon::prelude::*;

use super::Adjacency;
use crate::RailGraph;

const PAGERANK_DAMPING: f64 = 0.85;
const PAGERANK_MAX_ITERATIONS: usize = 100;
const PAGERANK_TOLERANCE: f64 = 1e-6;

// All scores are indexed like RailGraph::stations.

/// How quickly every other reachable station can be reached, using travel time as the distance.
/// In disconnected graphs, scaled by the fraction of stations reachable, so that a station of a
/// tiny island doesn't look central.
pub fn closeness(graph: &RailGraph) -> Vec<f64> {
    let g = graph.inner();
    let n = g.node_count();
    g.node_indices()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|node| {
            let dist = dijkstra(g, node, None, |e| e.weight().path_cost());
            let total: i64 = dist.values().sum();
            let reachable = dist.len();
            if total <= 0 || n <= 1 {
                return 0.0;
            }
            let r = (reachable - 1) as f64;
            (r / total as f64) * (r / (n - 1) as f64)
        })
        .collect()
}

/// The fraction of shortest paths (by hop count) between other stations that pass through each
/// station.
pub fn betweenness(graph: &RailGraph) -> Vec<f64> {
    let adj = Adjacency::new(graph);
    let n = adj.len();
    let mut scores = vec![0.0; n];

    // Brandes
    for source in 0..n {
        let mut stack = Vec::new();
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0; n];
        let mut dist: Vec<Option<usize>> = vec![None; n];
        sigma[source] = 1.0;
        dist[source] = Some(0);
        let mut queue = VecDeque::new();
        queue.push_back(source);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            let d = dist[v].unwrap_or(0);
            for &w in &adj.neighbours[v] {
                if dist[w].is_none() {
                    dist[w] = Some(d + 1);
                    queue.push_back(w);
                }
                if dist[w] == Some(d + 1) {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0; n];
        while let Some(w) = stack.pop() {
            for &v in &preds[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != source {
                scores[w] += delta[w];
            }
        }
    }

    // Every pair was counted from both ends
    if n > 2 {
        let scale = 1.0 / ((n - 1) * (n - 2)) as f64;
        for x in &mut scores {
            *x *= scale;
        }
    }
    scores
}

/// PageRank, treating each connection as a link both ways. Stations without connections spread
/// their rank uniformly.
pub fn pagerank(graph: &RailGraph) -> Vec<f64> {
    let g = graph.inner();
    let n = g.node_count();
    if n == 0 {
        return Vec::new();
    }
    // Self-loops link a station to itself once
    let mut out_links: Vec<Vec<usize>> = vec![Vec::new(); n];
    for edge in g.edge_references() {
        let (a, b) = (edge.source().index(), edge.target().index());
        out_links[a].push(b);
        if a != b {
            out_links[b].push(a);
        }
    }

    let uniform = 1.0 / n as f64;
    let mut rank = vec![uniform; n];
    for iteration in 0..PAGERANK_MAX_ITERATIONS {
        let dangling: f64 = (0..n)
            .filter(|v| out_links[*v].is_empty())
            .map(|v| rank[v])
            .sum();
        let base = (PAGERANK_DAMPING * dangling + (1.0 - PAGERANK_DAMPING)) * uniform;
        let mut next = vec![base; n];
        for (v, links) in out_links.iter().enumerate() {
            if links.is_empty() {
                continue;
            }
            let share = PAGERANK_DAMPING * rank[v] / links.len() as f64;
            for w in links {
                next[*w] += share;
            }
        }

        let err: f64 = next.iter().zip(&rank).map(|(a, b)| (a - b).abs()).sum();
        rank = next;
        if err < n as f64 * PAGERANK_TOLERANCE {
            debug!("PageRank converged after {} iterations", iteration + 1);
            return rank;
        }
    }
    warn!(
        "PageRank didn't converge after {} iterations",
        PAGERANK_MAX_ITERATIONS
    );
    rank
}

/// The `n` highest scores, best first, with the station's display name.
pub fn tops(graph: &RailGraph, scores: &[f64], n: usize) -> Vec<(String, f64)> {
    let mut pairs: Vec<(String, f64)> = graph
        .stations()
        .zip(scores)
        .map(|(station, score)| (station.describe(), *score))
        .collect();
    pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
    pairs.truncate(n);
    pairs
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use gtfs::StationKey;

    use super::*;
    use crate::MergePolicy;

    fn graph(edges: &[(&str, &str, i64)]) -> RailGraph {
        let mut graph = RailGraph::new("test");
        for (a, b, minutes) in edges {
            graph.connect(
                &StationKey::new(*a),
                &StationKey::new(*b),
                *minutes,
                MergePolicy::LastWriteWins,
            );
        }
        graph
    }

    #[test]
    fn path_of_three() {
        let g = graph(&[("a", "b", 10), ("b", "c", 30)]);

        let close = closeness(&g);
        assert_relative_eq!(close[0], 2.0 / 50.0);
        assert_relative_eq!(close[1], 2.0 / 40.0);
        assert_relative_eq!(close[2], 2.0 / 70.0);

        assert_eq!(betweenness(&g), vec![0.0, 1.0, 0.0]);

        let rank = pagerank(&g);
        assert_relative_eq!(rank.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        assert!(rank[1] > rank[0]);
        assert_relative_eq!(rank[0], rank[2], epsilon = 1e-9);
    }

    #[test]
    fn closeness_is_scaled_in_disconnected_graphs() {
        // a-b far apart, c-d-e close together
        let g = graph(&[("a", "b", 10), ("c", "d", 10), ("d", "e", 10)]);
        let close = closeness(&g);
        // a reaches 1 of 4 others in 10 minutes
        assert_relative_eq!(close[0], (1.0 / 10.0) * (1.0 / 4.0));
        // d reaches 2 of 4 in 20 minutes total
        assert_relative_eq!(close[3], (2.0 / 20.0) * (2.0 / 4.0));
    }

    #[test]
    fn star_betweenness() {
        let g = graph(&[("hub", "a", 1), ("hub", "b", 1), ("hub", "c", 1), ("hub", "d", 1)]);
        let scores = betweenness(&g);
        assert_relative_eq!(scores[0], 1.0);
        assert!(scores[1..].iter().all(|x| *x == 0.0));
    }

    #[test]
    fn ranking() {
        let g = graph(&[("hub", "a", 1), ("hub", "b", 1), ("hub", "d", 1), ("a", "c", 1)]);
        let best = tops(&g, &betweenness(&g), 2);
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].0, "UIC hub");
        assert_eq!(best[1].0, "UIC a");
        assert!(best[0].1 > best[1].1);
    }
}
