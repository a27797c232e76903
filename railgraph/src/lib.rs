//! A station-level graph of the French rail network, built from GTFS feeds, plus the questions
//! asked of it: how fast can you get between cities, and which new line would help most.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

pub mod analysis;
mod builder;
pub mod export;
mod graph;
pub mod line_search;
mod matrix;

pub use builder::RailGraphBuilder;
pub use graph::{Link, MergePolicy, RailGraph, Station};
pub use line_search::{
    evaluate_candidate, Candidate, DegenerateCandidate, LineSearch, ScoredCandidate, SourceSearch,
    ASSUMED_SPEED_KMH, COST_PER_KM_MEUR,
};
pub use matrix::{
    city_travelers, distance_km, weighted_travel_time, weighted_travel_times, CityGroup, Journey,
    ShortestPaths, TravelMatrix, UNREACHABLE_PENALTY_MINUTES,
};
