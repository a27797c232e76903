use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::Adjacency;
use crate::RailGraph;

/// Mean hop distances are sampled from at most this many sources.
const SAMPLED_SOURCES: usize = 300;

/// Compares a graph with a random one of the same size. A network is "small-world" when
/// `sigma` is well above 1: clustered like a lattice, but with short paths like a random graph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmallWorld {
    pub sigma: f64,
    /// C / C_random
    pub clustering_ratio: f64,
    /// L / L_random
    pub path_length_ratio: f64,
}

/// None if a ratio is undefined, like when the random graph has no triangles.
pub fn small_world(graph: &RailGraph, seed: u64) -> Option<SmallWorld> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let adj = Adjacency::new(graph);
    let path_length = mean_hop_distance(&adj, &mut rng)?;
    let clustering = adj.average_clustering();

    let random = Adjacency::from_edges(adj.len(), erdos_renyi(adj.len(), adj.edges, &mut rng));
    let random_path_length = mean_hop_distance(&random, &mut rng)?;
    let random_clustering = random.average_clustering();

    if random_clustering == 0.0 || random_path_length == 0.0 {
        warn!(
            "Can't compare {} to a random graph: C_random = {}, L_random = {}",
            graph.name, random_clustering, random_path_length
        );
        return None;
    }
    let clustering_ratio = clustering / random_clustering;
    let path_length_ratio = path_length / random_path_length;
    Some(SmallWorld {
        sigma: clustering_ratio / path_length_ratio,
        clustering_ratio,
        path_length_ratio,
    })
}

/// `m` uniformly random links between `n` nodes, never from a node to itself. The same pair may
/// come up more than once.
pub fn erdos_renyi<R: Rng>(n: usize, m: usize, rng: &mut R) -> Vec<(usize, usize)> {
    let mut edges = Vec::with_capacity(m);
    if n < 2 {
        return edges;
    }
    while edges.len() < m {
        let a = rng.gen_range(0..n);
        let b = rng.gen_range(0..n);
        if a != b {
            edges.push((a, b));
        }
    }
    edges
}

fn mean_hop_distance<R: Rng>(adj: &Adjacency, rng: &mut R) -> Option<f64> {
    let sources: Vec<usize> = if adj.len() <= SAMPLED_SOURCES {
        (0..adj.len()).collect()
    } else {
        index::sample(rng, adj.len(), SAMPLED_SOURCES).into_vec()
    };

    let mut total = 0;
    let mut count = 0;
    for source in sources {
        for dist in adj.hop_distances(source) {
            total += dist;
            count += 1;
        }
    }
    if count == 0 {
        return None;
    }
    Some(total as f64 / count as f64)
}
