#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod config;
mod report;

use std::path::PathBuf;

use anyhow::Result;
use env_logger::Env;
use structopt::StructOpt;

use gtfs::{Dataset, FRENCH_NETWORKS};
use railgraph::analysis::{self, RemovalStrategy};
use railgraph::{
    city_travelers, weighted_travel_times, LineSearch, MergePolicy, RailGraph, RailGraphBuilder,
    TravelMatrix,
};

use self::config::StrategyName;

#[derive(StructOpt)]
#[structopt(
    name = "railway-analysis",
    about = "Builds a station graph of the French rail network from GTFS and analyzes it"
)]
struct Args {
    /// A directory with one subdirectory per network and frequentation-stations.csv
    #[structopt(long, parse(from_os_str), default_value = "dataset")]
    dataset: PathBuf,
    /// Networks to merge, in order. Defaults to high-speed, inter-city, then regional.
    #[structopt(long, use_delimiter = true)]
    networks: Vec<String>,
    /// When two trips link the same stations: last-write or fastest
    #[structopt(long, parse(try_from_str = config::parse_merge_policy), default_value = "last-write")]
    merge_policy: MergePolicy,
    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(StructOpt)]
enum Command {
    /// Summarize the graph's structure
    Info {
        /// Also summarize each network alone
        #[structopt(long)]
        per_network: bool,
        /// Estimate the small-world coefficient, seeding the random graphs with this. Slow.
        #[structopt(long)]
        small_world_seed: Option<u64>,
        /// Also print how many stations have each degree
        #[structopt(long)]
        degrees: bool,
    },
    /// The most central stations
    Tops {
        #[structopt(long, default_value = "10")]
        n: usize,
    },
    /// Fastest travel times between cities
    Matrix {
        /// A JSON file of cities and their stations
        #[structopt(long, parse(from_os_str))]
        cities: Option<PathBuf>,
        /// Write the matrix to {output}_minutes.csv and {output}_km.csv
        #[structopt(long)]
        output: Option<String>,
    },
    /// For each city, rank new direct lines by cost per minute saved
    LineSearch {
        /// A JSON file of cities and their stations
        #[structopt(long, parse(from_os_str))]
        cities: Option<PathBuf>,
        /// Only search from these cities
        #[structopt(long, use_delimiter = true)]
        sources: Vec<String>,
        /// How many candidates to print per city
        #[structopt(long, default_value = "5")]
        n: usize,
    },
    /// Remove stations one by one and watch the network fall apart
    Robustness {
        /// random or degree
        #[structopt(long, default_value = "random")]
        strategy: StrategyName,
        #[structopt(long, default_value = "100")]
        steps: usize,
        #[structopt(long, default_value = "42")]
        seed: u64,
    },
    /// Write stations and connections as GeoJSON
    ExportGeojson {
        #[structopt(long, parse(from_os_str))]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::from_args();
    let networks: Vec<String> = if args.networks.is_empty() {
        FRENCH_NETWORKS.iter().map(|n| n.to_string()).collect()
    } else {
        args.networks
    };
    let dataset = Dataset::open(&args.dataset)?;
    let builder = RailGraphBuilder::new(&dataset).merge_policy(args.merge_policy);
    let graph = builder.build(&networks)?;

    match args.cmd {
        Command::Info {
            per_network,
            small_world_seed,
            degrees,
        } => {
            print!("{}", analysis::info(&graph, small_world_seed));
            if per_network && networks.len() > 1 {
                for network in &networks {
                    println!();
                    let alone = builder.build(&[network])?;
                    print!("{}", analysis::info(&alone, small_world_seed));
                }
            }
            if degrees {
                println!();
                print!(
                    "{}",
                    report::degree_distribution(&analysis::degree_distribution(&graph))
                );
            }
        }
        Command::Tops { n } => {
            for (title, scores) in [
                ("Closeness", analysis::closeness(&graph)),
                ("Betweenness", analysis::betweenness(&graph)),
                ("PageRank", analysis::pagerank(&graph)),
            ] {
                println!("{}", report::tops(title, &analysis::tops(&graph, &scores, n)));
            }
        }
        Command::Matrix { cities, output } => {
            let groups = config::load_cities(cities.as_deref())?;
            let matrix = TravelMatrix::compute(&graph, &groups);
            print!("{}", report::matrix(&matrix));
            if let Some(prefix) = output {
                report::write_matrix_csvs(&matrix, &prefix)?;
            }
        }
        Command::LineSearch { cities, sources, n } => {
            let groups = config::load_cities(cities.as_deref())?;
            let sources = config::city_indices(&groups, &sources)?;
            line_search(&graph, &groups, sources, n)?;
        }
        Command::Robustness {
            strategy,
            steps,
            seed,
        } => {
            let strategy = match strategy {
                StrategyName::Random => RemovalStrategy::Random { seed },
                StrategyName::Degree => RemovalStrategy::HighestDegree,
            };
            print!(
                "{}",
                report::robustness(&analysis::node_removal(&graph, strategy, steps))
            );
        }
        Command::ExportGeojson { output } => {
            railgraph::export::write_geojson(&graph, &output)?;
        }
    }
    Ok(())
}

fn line_search(
    graph: &RailGraph,
    groups: &[railgraph::CityGroup],
    sources: Vec<usize>,
    n: usize,
) -> Result<()> {
    let matrix = TravelMatrix::compute(graph, groups);
    let weights = city_travelers(graph, groups);
    let baseline = weighted_travel_times(&matrix, &weights);

    let sources: Vec<usize> = sources
        .into_iter()
        .filter(|idx| {
            if baseline[*idx].is_none() {
                warn!(
                    "{} has no other city with travelers to compare against; skipping",
                    groups[*idx].name
                );
                return false;
            }
            true
        })
        .collect();
    if sources.is_empty() {
        bail!("No city has a destination with travelers");
    }

    let results = LineSearch::default().search(graph, &sources, groups, &weights, &baseline)?;
    print!("{}", report::line_search(graph, &results, n));
    Ok(())
}
