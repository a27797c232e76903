use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;

use crate::{LoadError, StationKey};

/// Used for stations missing from the frequentation table.
pub const DEFAULT_TRAVELERS: u64 = 1000;

const UIC_FIELD: usize = 1;
const TRAVELERS_2021_FIELD: usize = 4;

/// Yearly traveler counts per station, from the SNCF frequentation dataset. Global to the
/// dataset, not per network.
#[derive(Clone, Debug, Default)]
pub struct Frequentation {
    travelers_2021: BTreeMap<StationKey, u64>,
}

impl Frequentation {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_counts(counts: impl IntoIterator<Item = (StationKey, u64)>) -> Self {
        Self {
            travelers_2021: counts.into_iter().collect(),
        }
    }

    pub fn travelers_2021(&self, station: &StationKey) -> u64 {
        self.travelers_2021
            .get(station)
            .cloned()
            .unwrap_or(DEFAULT_TRAVELERS)
    }

    pub fn len(&self) -> usize {
        self.travelers_2021.len()
    }

    pub fn is_empty(&self) -> bool {
        self.travelers_2021.is_empty()
    }
}

/// The table is `;`-separated with a header row. Only the station code and the 2021 count are
/// used.
pub fn load<R: std::io::Read>(reader: R, path: &Path) -> Result<Frequentation> {
    let mut csv = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(reader);

    let mut frequentation = Frequentation::empty();
    let mut skipped = 0;
    for rec in csv.records() {
        let rec = match rec {
            Ok(rec) => rec,
            Err(err) if err.is_io_error() => {
                let err = std::io::Error::new(std::io::ErrorKind::Other, err);
                return Err(LoadError::unavailable(path, err).into());
            }
            Err(err) => {
                warn!("Skipping frequentation row: {err}");
                skipped += 1;
                continue;
            }
        };
        let line = rec.position().map(|pos| pos.line()).unwrap_or(0);
        match parse_row(&rec) {
            Ok((station, count)) => {
                frequentation.travelers_2021.insert(station, count);
            }
            Err(reason) => {
                warn!("Skipping row: {}", LoadError::malformed(path, line, reason));
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        warn!("{} frequentation rows skipped", skipped);
    }
    Ok(frequentation)
}

fn parse_row(rec: &csv::StringRecord) -> Result<(StationKey, u64)> {
    let code = match rec.get(UIC_FIELD).map(str::trim) {
        Some(code) if !code.is_empty() => code,
        _ => bail!("no station code"),
    };
    let raw = match rec.get(TRAVELERS_2021_FIELD) {
        Some(raw) => raw,
        None => bail!("no traveler count"),
    };
    Ok((StationKey::new(code), parse_count(raw)?))
}

// Counts sometimes carry thousands separators ("36 000 000", "1,234") or a decimal comma
// ("1234,6")
fn parse_count(raw: &str) -> Result<u64> {
    let mut digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if has_thousands_commas(&digits) {
        digits.retain(|c| c != ',');
    }
    if let Ok(count) = digits.parse::<u64>() {
        return Ok(count);
    }
    match digits.replace(',', ".").parse::<f64>() {
        Ok(count) if count.is_finite() && count >= 0.0 => Ok(count.round() as u64),
        _ => bail!("{raw:?} isn't a traveler count"),
    }
}

/// "1,234" or "12,345,678": 1 to 3 leading digits, then groups of exactly 3.
fn has_thousands_commas(x: &str) -> bool {
    let all_digits = |group: &str| group.chars().all(|c| c.is_ascii_digit());
    let mut groups = x.split(',');
    let first = groups.next().unwrap_or("");
    let rest: Vec<&str> = groups.collect();
    !rest.is_empty()
        && (1..=3).contains(&first.len())
        && all_digits(first)
        && rest.iter().all(|g| g.len() == 3 && all_digits(g))
}
