//! Naive search for the new direct line that saves the most weighted travel time per euro.

use anyhow::Result;
use rayon::prelude::*;

use gtfs::StationKey;

use crate::matrix::{distance_km, weighted_travel_time};
use crate::{CityGroup, RailGraph, TravelMatrix};

/// The slowest speed of the high-speed category
pub const ASSUMED_SPEED_KMH: f64 = 250.0;
/// Construction cost, in million euros per km
pub const COST_PER_KM_MEUR: f64 = 25.0;

/// A new direct connection between two existing stations.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub from: StationKey,
    pub to: StationKey,
    pub distance_km: f64,
    /// Minutes, rounded
    pub travel_time: i64,
    pub cost_meur: f64,
}

/// A candidate that shortens the weighted travel time of its source city.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub weighted_minutes: f64,
    /// Minutes saved relative to the baseline; always positive
    pub delta: f64,
    /// Million euros per minute saved; lower is better
    pub cost_per_minute: f64,
}

/// A candidate that saves nothing (or makes things worse), so its cost per minute saved is
/// meaningless. Kept out of the ranking.
#[derive(Clone, Debug, PartialEq)]
pub struct DegenerateCandidate {
    pub candidate: Candidate,
    pub weighted_minutes: Option<f64>,
    pub delta: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct SourceSearch {
    pub source: usize,
    pub city: String,
    pub baseline: f64,
    /// Best first. Ties keep candidate enumeration order.
    pub ranked: Vec<ScoredCandidate>,
    pub degenerate: Vec<DegenerateCandidate>,
}

impl SourceSearch {
    pub fn best(&self) -> Option<&ScoredCandidate> {
        self.ranked.first()
    }
}

enum Outcome {
    Scored(ScoredCandidate),
    Degenerate(DegenerateCandidate),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSearch {
    pub speed_kmh: f64,
    pub cost_per_km_meur: f64,
}

impl Default for LineSearch {
    fn default() -> Self {
        Self {
            speed_kmh: ASSUMED_SPEED_KMH,
            cost_per_km_meur: COST_PER_KM_MEUR,
        }
    }
}

impl LineSearch {
    pub fn candidate(&self, from: &StationKey, to: &StationKey, distance_km: f64) -> Candidate {
        Candidate {
            from: from.clone(),
            to: to.clone(),
            distance_km,
            travel_time: (distance_km / self.speed_kmh * 60.0).round() as i64,
            cost_meur: distance_km * self.cost_per_km_meur,
        }
    }

    /// A copy of `graph` with the new line built. Both stations need coordinates.
    pub fn evaluate_candidate(
        &self,
        graph: &RailGraph,
        from: &StationKey,
        to: &StationKey,
    ) -> Result<(RailGraph, Candidate)> {
        let distance = match distance_km(graph, from, to) {
            Some(distance) => distance,
            None => bail!("Can't measure a line between {from} and {to}; no coordinates"),
        };
        let candidate = self.candidate(from, to, distance);
        let augmented = graph.with_connection(from, to, candidate.travel_time)?;
        Ok((augmented, candidate))
    }

    /// For each source city, tries a line from each of its stations to each station of every
    /// other city, and ranks them by cost per minute of weighted travel time saved.
    ///
    /// `sources` are indices into `groups`. `weights` and `baseline` are per city of `groups`;
    /// see `city_travelers` and `weighted_travel_times`.
    pub fn search(
        &self,
        graph: &RailGraph,
        sources: &[usize],
        groups: &[CityGroup],
        weights: &[u64],
        baseline: &[Option<f64>],
    ) -> Result<Vec<SourceSearch>> {
        if weights.len() != groups.len() || baseline.len() != groups.len() {
            bail!(
                "{} cities, but {} weights and {} baseline times",
                groups.len(),
                weights.len(),
                baseline.len()
            );
        }

        let mut results = Vec::new();
        for &source in sources {
            let group = match groups.get(source) {
                Some(group) => group,
                None => bail!("No city {source}; there are {}", groups.len()),
            };
            let baseline = match baseline[source] {
                Some(x) => x,
                None => bail!("{} has no destination with travelers to weigh", group.name),
            };

            let pairs = self.candidate_pairs(graph, groups, source);
            info!(
                "Evaluating {} candidate lines from {}",
                pairs.len(),
                group.name
            );
            let outcomes = pairs
                .par_iter()
                .map(|(from, to)| {
                    let (augmented, candidate) = self.evaluate_candidate(graph, from, to)?;
                    let row = TravelMatrix::row(&augmented, groups, source);
                    let weighted_minutes = weighted_travel_time(&row, weights, source);
                    Ok(score(candidate, baseline, weighted_minutes))
                })
                .collect::<Result<Vec<Outcome>>>()?;

            let mut ranked = Vec::new();
            let mut degenerate = Vec::new();
            for outcome in outcomes {
                match outcome {
                    Outcome::Scored(x) => ranked.push(x),
                    Outcome::Degenerate(x) => degenerate.push(x),
                }
            }
            ranked.sort_by(|a, b| a.cost_per_minute.total_cmp(&b.cost_per_minute));

            results.push(SourceSearch {
                source,
                city: group.name.clone(),
                baseline,
                ranked,
                degenerate,
            });
        }
        Ok(results)
    }

    fn candidate_pairs(
        &self,
        graph: &RailGraph,
        groups: &[CityGroup],
        source: usize,
    ) -> Vec<(StationKey, StationKey)> {
        let usable = |key: &StationKey| {
            let ok = graph.station(key).map(|s| s.pos.is_some()).unwrap_or(false);
            if !ok {
                debug!("{key} isn't in the graph or has no coordinates; skipping");
            }
            ok
        };

        let mut pairs = Vec::new();
        for (idx, other) in groups.iter().enumerate() {
            if idx == source {
                continue;
            }
            for from in &groups[source].stations {
                for to in &other.stations {
                    if from != to && usable(from) && usable(to) {
                        pairs.push((from.clone(), to.clone()));
                    }
                }
            }
        }
        pairs
    }
}

fn score(candidate: Candidate, baseline: f64, weighted_minutes: Option<f64>) -> Outcome {
    let delta = weighted_minutes.map(|x| baseline - x);
    match (weighted_minutes, delta) {
        (Some(weighted_minutes), Some(delta)) if delta > 0.0 => {
            debug!(
                "{} - {}: saves {:.2} minutes for {:.0} M€",
                candidate.from, candidate.to, delta, candidate.cost_meur
            );
            let cost_per_minute = candidate.cost_meur / delta;
            Outcome::Scored(ScoredCandidate {
                candidate,
                weighted_minutes,
                delta,
                cost_per_minute,
            })
        }
        _ => Outcome::Degenerate(DegenerateCandidate {
            candidate,
            weighted_minutes,
            delta,
        }),
    }
}

/// `LineSearch::evaluate_candidate` with the default speed and cost.
pub fn evaluate_candidate(
    graph: &RailGraph,
    from: &StationKey,
    to: &StationKey,
) -> Result<(RailGraph, Candidate)> {
    LineSearch::default().evaluate_candidate(graph, from, to)
}
