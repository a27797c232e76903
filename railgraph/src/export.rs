use std::path::Path;

use anyhow::Result;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};

use crate::RailGraph;

/// Stations become points and connections become straight lines. Anything without coordinates
/// is left out.
pub fn to_geojson(graph: &RailGraph) -> FeatureCollection {
    let g = graph.inner();
    let mut features = Vec::new();

    for id in g.node_indices() {
        let station = &g[id];
        let pos = match station.pos {
            Some(pos) => pos,
            None => continue,
        };
        let mut feature = feature(Value::Point(vec![pos.x(), pos.y()]));
        feature.set_property("type", "station");
        feature.set_property("uic", station.key.to_string());
        if let Some(ref name) = station.name {
            feature.set_property("name", name.clone());
        }
        feature.set_property("travelers_2021", station.travelers_2021);
        feature.set_property("degree", g.neighbors(id).count());
        features.push(feature);
    }

    for (from, to, travel_time) in graph.connections() {
        if let (Some(a), Some(b)) = (from.pos, to.pos) {
            let mut feature = feature(Value::LineString(vec![
                vec![a.x(), a.y()],
                vec![b.x(), b.y()],
            ]));
            feature.set_property("type", "connection");
            feature.set_property("from", from.key.to_string());
            feature.set_property("to", to.key.to_string());
            feature.set_property("travel_time", travel_time);
            features.push(feature);
        }
    }

    FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    }
}

pub fn write_geojson(graph: &RailGraph, path: &Path) -> Result<()> {
    let gj = GeoJson::FeatureCollection(to_geojson(graph));
    fs_err::write(path, serde_json::to_string_pretty(&gj)?)?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn feature(value: Value) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: None,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use gtfs::{LonLat, StationAttributes, StationKey};

    use super::*;
    use crate::MergePolicy;

    #[test]
    fn only_located_things_are_drawn() {
        let mut graph = RailGraph::new("test");
        let (a, b, c) = (
            StationKey::new("a"),
            StationKey::new("b"),
            StationKey::new("c"),
        );
        graph.connect(&a, &b, 60, MergePolicy::LastWriteWins);
        graph.connect(&b, &c, 30, MergePolicy::LastWriteWins);
        for (key, lon) in [(&a, 2.0), (&b, 3.0)] {
            graph.merge_attributes(
                key,
                &StationAttributes {
                    name: Some(key.to_string().to_uppercase()),
                    pos: Some(LonLat::new(lon, 48.0).unwrap()),
                    travelers_2021: 10,
                },
            );
        }

        let fc = to_geojson(&graph);
        // a and b as points, a-b as a line
        assert_eq!(fc.features.len(), 3);

        let point = &fc.features[0];
        assert_eq!(point.property("uic").unwrap(), "a");
        assert_eq!(point.property("name").unwrap(), "A");
        assert_eq!(point.property("degree").unwrap(), 1);

        let line = &fc.features[2];
        assert_eq!(line.property("type").unwrap(), "connection");
        assert_eq!(line.property("travel_time").unwrap(), 60);
        match line.geometry.as_ref().map(|g| &g.value) {
            Some(Value::LineString(pts)) => {
                assert_eq!(pts, &vec![vec![2.0, 48.0], vec![3.0, 48.0]])
            }
            x => panic!("expected a line, got {:?}", x),
        }
    }
}
