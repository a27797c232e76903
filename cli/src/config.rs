use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};

use railgraph::{CityGroup, MergePolicy};

/// Major French cities and the UIC codes of their main stations, biggest first.
pub fn default_cities() -> Vec<CityGroup> {
    vec![
        CityGroup::new(
            "Paris",
            &[
                "87686006", // Gare de Lyon
                "87271007", // Gare du Nord
                "87113001", // Gare de l'Est
                "87391003", // Montparnasse
                "87384008", // Saint-Lazare
                "87547000", // Austerlitz
            ],
        ),
        CityGroup::new("Lyon", &["87723197", "87722025"]),
        CityGroup::new("Marseille", &["87751008"]),
        CityGroup::new("Lille", &["87286005", "87223263"]),
        CityGroup::new("Bordeaux", &["87581009"]),
        CityGroup::new("Toulouse", &["87611004"]),
        CityGroup::new("Nice", &["87756056"]),
        CityGroup::new("Nantes", &["87481002"]),
        CityGroup::new("Strasbourg", &["87212027"]),
        CityGroup::new("Montpellier", &["87773002"]),
        CityGroup::new("Rennes", &["87471003"]),
    ]
}

/// A JSON list of `{"name": ..., "stations": [...]}`, or the built-in cities.
pub fn load_cities(path: Option<&Path>) -> Result<Vec<CityGroup>> {
    let path = match path {
        Some(path) => path,
        None => return Ok(default_cities()),
    };
    let groups: Vec<CityGroup> = serde_json::from_str(&fs_err::read_to_string(path)?)
        .with_context(|| format!("parsing cities from {}", path.display()))?;
    check_cities(&groups)?;
    info!("{} cities from {}", groups.len(), path.display());
    Ok(groups)
}

fn check_cities(groups: &[CityGroup]) -> Result<()> {
    if groups.is_empty() {
        bail!("No cities defined");
    }
    for (idx, group) in groups.iter().enumerate() {
        if group.stations.is_empty() {
            bail!("{} has no stations", group.name);
        }
        if groups[..idx].iter().any(|g| g.name == group.name) {
            bail!("{} is defined twice", group.name);
        }
    }
    Ok(())
}

/// Indices of the named cities, in the order given. No names means every city.
pub fn city_indices(groups: &[CityGroup], names: &[String]) -> Result<Vec<usize>> {
    if names.is_empty() {
        return Ok((0..groups.len()).collect());
    }
    names
        .iter()
        .map(|name| {
            groups
                .iter()
                .position(|g| g.name.eq_ignore_ascii_case(name.trim()))
                .ok_or_else(|| anyhow!("Unknown city {name}"))
        })
        .collect()
}

pub fn parse_merge_policy(x: &str) -> Result<MergePolicy> {
    match x {
        "last-write" => Ok(MergePolicy::LastWriteWins),
        "fastest" => Ok(MergePolicy::Fastest),
        _ => bail!("Unknown merge policy {x}; use last-write or fastest"),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyName {
    Random,
    Degree,
}

impl FromStr for StrategyName {
    type Err = anyhow::Error;

    fn from_str(x: &str) -> Result<Self> {
        match x {
            "random" => Ok(StrategyName::Random),
            "degree" => Ok(StrategyName::Degree),
            _ => bail!("Unknown strategy {x}; use random or degree"),
        }
    }
}

#[cfg(test)]
mod tests {
    use gtfs::StationKey;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn cities_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cities.json");
        fs_err::write(
            &path,
            r#"[
                {"name": "Paris", "stations": ["87686006", "87271007"]},
                {"name": "Dijon", "stations": ["87713040"]}
            ]"#,
        )
        .unwrap();
        let groups = load_cities(Some(&path)).unwrap();
        assert_eq!(
            groups,
            vec![
                CityGroup::new("Paris", &["87686006", "87271007"]),
                CityGroup::new("Dijon", &["87713040"]),
            ]
        );
        assert_eq!(groups[1].stations[0], StationKey::new("87713040"));

        fs_err::write(&path, r#"[{"name": "Nowhere", "stations": []}]"#).unwrap();
        assert!(load_cities(Some(&path)).is_err());
        fs_err::write(&path, "not json").unwrap();
        assert!(load_cities(Some(&path)).is_err());
    }

    #[test]
    fn default_cities_are_valid() {
        let groups = load_cities(None).unwrap();
        check_cities(&groups).unwrap();
        assert_eq!(groups[0].name, "Paris");
    }

    #[test]
    fn pick_cities() {
        let groups = default_cities();
        let names = vec!["lyon".to_string(), " Paris".to_string()];
        assert_eq!(city_indices(&groups, &names).unwrap(), vec![1, 0]);
        assert_eq!(city_indices(&groups, &[]).unwrap().len(), groups.len());
        assert!(city_indices(&groups, &["Atlantis".to_string()]).is_err());
    }

    #[test]
    fn flags() {
        assert_eq!(
            parse_merge_policy("last-write").unwrap(),
            MergePolicy::LastWriteWins
        );
        assert_eq!(parse_merge_policy("fastest").unwrap(), MergePolicy::Fastest);
        assert!(parse_merge_policy("slowest").is_err());
        assert_eq!("degree".parse::<StrategyName>().unwrap(), StrategyName::Degree);
        assert!("chaos".parse::<StrategyName>().is_err());
    }
}
