//! Plain-text tables for the terminal, and CSV files for the travel matrix.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;

use gtfs::StationKey;
use railgraph::analysis::{DegreeDistribution, RobustnessStep};
use railgraph::{RailGraph, SourceSearch, TravelMatrix};

const WIDTH: usize = 12;

pub fn degree_distribution(dist: &DegreeDistribution) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>WIDTH$} | {}", "Degree", "Stations");
    for (degree, count) in &dist.counts {
        let _ = writeln!(out, "{:>WIDTH$} | {}", degree, count);
    }
    out
}

pub fn tops(title: &str, best: &[(String, f64)]) -> String {
    let mut out = format!("{title}\n");
    for (idx, (name, score)) in best.iter().enumerate() {
        let _ = writeln!(out, "{:>4}. {:<40} {:.6}", idx + 1, name, score);
    }
    out
}

/// Travel times in minutes, with "-" where there's no path.
pub fn matrix(matrix: &TravelMatrix) -> String {
    let mut out = format!("{:>WIDTH$}", "");
    for label in matrix.labels() {
        let _ = write!(out, " {:>WIDTH$}", truncate(label));
    }
    out.push('\n');
    for (label, row) in matrix.labels().iter().zip(matrix.minutes()) {
        let _ = write!(out, "{:>WIDTH$}", truncate(label));
        for cell in row {
            match cell {
                Some(minutes) => {
                    let _ = write!(out, " {:>WIDTH$}", minutes);
                }
                None => {
                    let _ = write!(out, " {:>WIDTH$}", "-");
                }
            }
        }
        out.push('\n');
    }
    out
}

fn truncate(label: &str) -> String {
    label.chars().take(WIDTH).collect()
}

/// Writes `{prefix}_minutes.csv` and `{prefix}_km.csv`.
pub fn write_matrix_csvs(matrix: &TravelMatrix, prefix: &str) -> Result<()> {
    let path = format!("{prefix}_minutes.csv");
    write_matrix_csv(matrix.labels(), &matrix.minutes(), fs_err::File::create(&path)?)?;
    info!("Wrote {path}");

    let path = format!("{prefix}_km.csv");
    let km: Vec<Vec<Option<String>>> = matrix
        .distances_km()
        .into_iter()
        .map(|row| row.into_iter().map(|x| x.map(|km| format!("{km:.1}"))).collect())
        .collect();
    write_matrix_csv(matrix.labels(), &km, fs_err::File::create(&path)?)?;
    info!("Wrote {path}");
    Ok(())
}

/// One header row of labels, then one row per label. Missing values are empty cells.
pub fn write_matrix_csv<W: Write, T: ToString>(
    labels: &[String],
    cells: &[Vec<Option<T>>],
    writer: W,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    let mut header = vec![String::new()];
    header.extend(labels.iter().cloned());
    writer.write_record(&header)?;
    for (label, row) in labels.iter().zip(cells) {
        let mut record = vec![label.clone()];
        record.extend(
            row.iter()
                .map(|cell| cell.as_ref().map(|x| x.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn line_search(graph: &RailGraph, results: &[SourceSearch], n: usize) -> String {
    let name = |key: &StationKey| {
        graph
            .station(key)
            .map(|s| s.describe())
            .unwrap_or_else(|| format!("UIC {key}"))
    };

    let mut out = String::new();
    for search in results {
        let _ = writeln!(
            out,
            "{}: weighted travel time {:.1} minutes, {} useful candidates, {} useless",
            search.city,
            search.baseline,
            search.ranked.len(),
            search.degenerate.len()
        );
        for scored in search.ranked.iter().take(n) {
            let c = &scored.candidate;
            let _ = writeln!(
                out,
                "    {} - {}: {:.0} km, {} min, {:.0} M€, saves {:.2} min, {:.1} M€/min",
                name(&c.from),
                name(&c.to),
                c.distance_km,
                c.travel_time,
                c.cost_meur,
                scored.delta,
                scored.cost_per_minute
            );
        }
    }
    out
}

pub fn robustness(steps: &[RobustnessStep]) -> String {
    let mut out = format!("{:>WIDTH$} | {:>8} | {}\n", "Removed", "LCC", "Station");
    for step in steps {
        let station = match step.removed {
            Some(ref key) => key.to_string(),
            None => "-".to_string(),
        };
        let _ = writeln!(
            out,
            "{:>WIDTH$} | {:>7.1}% | {}",
            step.removed_count,
            100.0 * step.lcc_fraction,
            station
        );
    }
    out
}
