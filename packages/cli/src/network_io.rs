//! GeoJSON road network adapter.
//!
//! Reads a FeatureCollection of `LineString` features, one per street
//! segment, and builds a [`RoadNetwork`] from it. Node identifiers are
//! interned from segment endpoint coordinates, so segments that share an
//! endpoint connect. Segment length comes from a `length` property when
//! present, great-circle geometry otherwise.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use geo::Point;
use geojson::GeoJson;
use mobility_map_geometry::{Crs, measure};
use mobility_map_network::{RoadEdge, RoadNetwork, RoadNode};

/// Endpoint coordinates are interned at this resolution (1e-7 degrees,
/// about a centimetre) to connect segments that share a node.
const INTERN_SCALE: f64 = 1e7;

/// Loads a road network from a GeoJSON file of street segments.
///
/// # Errors
///
/// Returns an error when the file cannot be read or parsed, or when the
/// resulting graph has no usable structure.
pub fn read_network(path: &Path) -> Result<RoadNetwork, Box<dyn std::error::Error>> {
    let raw = fs::read_to_string(path)?;
    let geojson: GeoJson = raw.parse()?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err("expected a GeoJSON FeatureCollection of street segments".into());
    };

    let mut nodes: Vec<RoadNode> = Vec::new();
    let mut interned: HashMap<(i64, i64), i64> = HashMap::new();
    let mut edges: Vec<(i64, i64, RoadEdge)> = Vec::new();

    for feature in collection.features {
        let Some(geometry) = feature.geometry else {
            continue;
        };
        let geometry: geo::Geometry<f64> = geometry.try_into()?;
        let geo::Geometry::LineString(line) = geometry else {
            log::warn!("skipping non-LineString feature");
            continue;
        };
        if line.0.len() < 2 {
            log::warn!("skipping degenerate segment with {} coordinates", line.0.len());
            continue;
        }

        let length_m = feature
            .properties
            .as_ref()
            .and_then(|properties| properties.get("length"))
            .and_then(serde_json::Value::as_f64)
            .unwrap_or_else(|| {
                line.lines()
                    .map(|segment| {
                        measure::haversine_m(Point::from(segment.start), Point::from(segment.end))
                    })
                    .sum()
            });

        let start = intern(line.0[0].x, line.0[0].y, &mut interned, &mut nodes);
        let end = intern(
            line.0[line.0.len() - 1].x,
            line.0[line.0.len() - 1].y,
            &mut interned,
            &mut nodes,
        );
        edges.push((
            start,
            end,
            RoadEdge {
                length_m,
                minutes: None,
                path: Some(line),
            },
        ));
    }

    log::info!(
        "loaded road network: {} nodes, {} segments",
        nodes.len(),
        edges.len()
    );
    Ok(RoadNetwork::from_parts(Crs::Wgs84, nodes, edges)?)
}

#[allow(clippy::cast_possible_truncation)]
fn intern(
    lon: f64,
    lat: f64,
    interned: &mut HashMap<(i64, i64), i64>,
    nodes: &mut Vec<RoadNode>,
) -> i64 {
    let key = (
        (lon * INTERN_SCALE).round() as i64,
        (lat * INTERN_SCALE).round() as i64,
    );
    if let Some(&id) = interned.get(&key) {
        return id;
    }
    let id = nodes.len() as i64;
    nodes.push(RoadNode {
        osm_id: id,
        point: Point::new(lon, lat),
    });
    interned.insert(key, id);
    id
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    const TWO_SEGMENTS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "length": 680.0 },
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[13.400, 52.520], [13.410, 52.520]]
                }
            },
            {
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[13.410, 52.520], [13.410, 52.530]]
                }
            }
        ]
    }"#;

    #[test]
    fn segments_share_interned_endpoints() {
        let mut file = tempfile("endpoints");
        file.write_all(TWO_SEGMENTS.as_bytes()).unwrap();
        let network = read_network(file.path()).unwrap();
        // Three distinct endpoints, two segments, one shared node.
        assert_eq!(network.node_count(), 3);
        assert_eq!(network.edge_count(), 2);
        assert_eq!(network.crs(), Crs::Wgs84);
    }

    #[test]
    fn missing_length_falls_back_to_great_circle() {
        let mut file = tempfile("length");
        file.write_all(TWO_SEGMENTS.as_bytes()).unwrap();
        let network = read_network(file.path()).unwrap();
        // The second segment spans 0.01 degrees of latitude, ~1112 m.
        let stats = network.stats(None);
        assert!(
            (stats.street_length_m - (680.0 + 1112.0)).abs() < 5.0,
            "total street length {}",
            stats.street_length_m
        );
    }

    struct TempPath {
        path: std::path::PathBuf,
    }

    impl TempPath {
        fn path(&self) -> &Path {
            &self.path
        }

        fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()> {
            let mut file = fs::File::create(&self.path)?;
            file.write_all(bytes)
        }
    }

    impl Drop for TempPath {
        fn drop(&mut self) {
            let _ = fs::remove_file(&self.path);
        }
    }

    fn tempfile(tag: &str) -> TempPath {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "mobility-map-net-{}-{tag}.geojson",
            std::process::id()
        ));
        TempPath { path }
    }
}
