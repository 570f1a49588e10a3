//! Summary statistics over a road network.

use std::collections::BTreeSet;

use petgraph::graph::NodeIndex;

use crate::RoadNetwork;

/// Basic structural statistics of a network, with optional densities
/// relative to a reference area (typically the loading buffer around a
/// home location).
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkStats {
    /// Node count.
    pub node_count: usize,
    /// Edge count.
    pub edge_count: usize,
    /// Total physical street length in metres.
    pub street_length_m: f64,
    /// Nodes where at least three distinct streets meet.
    pub intersection_count: usize,
    /// Street kilometres per km² of the reference area.
    pub street_density_km_per_km2: Option<f64>,
    /// Three-way-or-more intersections per km² of the reference area.
    pub intersection_density_per_km2: Option<f64>,
}

impl RoadNetwork {
    /// Computes structural statistics; densities are only present when a
    /// positive `reference_area_m2` is supplied.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self, reference_area_m2: Option<f64>) -> NetworkStats {
        let graph = self.graph();
        let street_length_m: f64 = graph.edge_weights().map(|edge| edge.length_m).sum();

        let intersection_count = graph
            .node_indices()
            .filter(|&node| {
                let distinct: BTreeSet<NodeIndex> = graph.neighbors(node).collect();
                distinct.len() >= 3
            })
            .count();

        let area_km2 = reference_area_m2
            .map(|area| area / 1e6)
            .filter(|area| *area > 0.0);

        NetworkStats {
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            street_length_m,
            intersection_count,
            street_density_km_per_km2: area_km2.map(|area| street_length_m / 1000.0 / area),
            intersection_density_per_km2: area_km2.map(|area| intersection_count as f64 / area),
        }
    }
}

#[cfg(test)]
mod tests {
    use geo::Point;
    use mobility_map_geometry::Crs;

    use crate::{RoadEdge, RoadNode};

    use super::*;

    /// A star: one hub with four 250 m spokes.
    fn star() -> RoadNetwork {
        let mut nodes = vec![RoadNode {
            osm_id: 0,
            point: Point::new(0.0, 0.0),
        }];
        let offsets = [(250.0, 0.0), (-250.0, 0.0), (0.0, 250.0), (0.0, -250.0)];
        for (i, (x, y)) in offsets.iter().enumerate() {
            nodes.push(RoadNode {
                osm_id: i as i64 + 1,
                point: Point::new(*x, *y),
            });
        }
        let edges = (1..=4).map(|i| (0, i, RoadEdge::with_length(250.0))).collect();
        RoadNetwork::from_parts(
            Crs::Utm {
                zone: 33,
                north: true,
            },
            nodes,
            edges,
        )
        .unwrap()
    }

    #[test]
    fn hub_is_the_only_intersection() {
        let stats = star().stats(None);
        assert_eq!(stats.node_count, 5);
        assert_eq!(stats.edge_count, 4);
        assert_eq!(stats.intersection_count, 1);
        assert!((stats.street_length_m - 1_000.0).abs() < 1e-9);
        assert_eq!(stats.street_density_km_per_km2, None);
    }

    #[test]
    fn densities_relative_to_reference_area() {
        // 4 km² reference area: 1 km of street -> 0.25 km/km².
        let stats = star().stats(Some(4.0e6));
        assert!((stats.street_density_km_per_km2.unwrap() - 0.25).abs() < 1e-9);
        assert!((stats.intersection_density_per_km2.unwrap() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn zero_reference_area_yields_no_densities() {
        let stats = star().stats(Some(0.0));
        assert_eq!(stats.street_density_km_per_km2, None);
        assert_eq!(stats.intersection_density_per_km2, None);
    }
}
