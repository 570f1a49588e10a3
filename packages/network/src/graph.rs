//! The [`RoadNetwork`] graph type and its construction.

use std::collections::{BTreeSet, HashMap};

use geo::{LineString, Point};
use mobility_map_geometry::{Crs, crs};
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use rstar::RTree;
use rstar::primitives::GeomWithData;

use crate::{EgoSubgraph, NetworkError, traverse};

/// A road network node: an OSM node id and its position in the
/// network's frame.
#[derive(Debug, Clone)]
pub struct RoadNode {
    /// Stable external identifier (OSM node id or loader-assigned).
    pub osm_id: i64,
    /// Position in the network's frame.
    pub point: Point<f64>,
}

/// A road network edge: physical length plus optional recorded path
/// geometry and, once annotated, traversal minutes.
#[derive(Debug, Clone)]
pub struct RoadEdge {
    /// Physical length in metres.
    pub length_m: f64,
    /// Traversal time in minutes; `None` until
    /// [`RoadNetwork::annotate_travel_time`] runs.
    pub minutes: Option<f64>,
    /// Recorded street geometry; straight endpoint segment when absent.
    pub path: Option<LineString<f64>>,
}

impl RoadEdge {
    /// An edge with a known length and no recorded geometry.
    #[must_use]
    pub const fn with_length(length_m: f64) -> Self {
        Self {
            length_m,
            minutes: None,
            path: None,
        }
    }
}

type IndexedNode = GeomWithData<[f64; 2], NodeIndex>;

/// An undirected road network with a nearest-node spatial index and an
/// explicit coordinate frame.
#[derive(Debug, Clone)]
pub struct RoadNetwork {
    graph: UnGraph<RoadNode, RoadEdge>,
    index: RTree<IndexedNode>,
    crs: Crs,
}

impl RoadNetwork {
    /// Builds a network from node and edge lists. Edge endpoints refer
    /// to node `osm_id`s; edges naming unknown nodes are skipped with a
    /// warning, duplicate node ids keep their first occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidGraph`] when the result would have
    /// zero nodes or zero edges.
    pub fn from_parts(
        crs: Crs,
        nodes: Vec<RoadNode>,
        edges: Vec<(i64, i64, RoadEdge)>,
    ) -> Result<Self, NetworkError> {
        let mut graph: UnGraph<RoadNode, RoadEdge> = UnGraph::new_undirected();
        let mut by_osm_id: HashMap<i64, NodeIndex> = HashMap::new();

        for node in nodes {
            if by_osm_id.contains_key(&node.osm_id) {
                log::warn!("duplicate node id {}; keeping first occurrence", node.osm_id);
                continue;
            }
            let osm_id = node.osm_id;
            let index = graph.add_node(node);
            by_osm_id.insert(osm_id, index);
        }

        for (u, v, edge) in edges {
            match (by_osm_id.get(&u), by_osm_id.get(&v)) {
                (Some(&a), Some(&b)) => {
                    graph.add_edge(a, b, edge);
                }
                _ => log::warn!("edge ({u}, {v}) references an unknown node; skipped"),
            }
        }

        if graph.node_count() == 0 || graph.edge_count() == 0 {
            return Err(NetworkError::InvalidGraph {
                node_count: graph.node_count(),
                edge_count: graph.edge_count(),
            });
        }

        let index = build_index(&graph);
        Ok(Self { graph, index, crs })
    }

    /// The frame node positions and edge paths are expressed in.
    #[must_use]
    pub const fn crs(&self) -> Crs {
        self.crs
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The node payload at `index`, if it exists.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> Option<&RoadNode> {
        self.graph.node_weight(index)
    }

    /// Position of the node at `index`, if it exists.
    #[must_use]
    pub fn node_point(&self, index: NodeIndex) -> Option<Point<f64>> {
        self.graph.node_weight(index).map(|node| node.point)
    }

    /// The traversable geometry of the edge at `index`: its recorded
    /// path, or a straight segment between its endpoints.
    #[must_use]
    pub fn edge_path(&self, index: EdgeIndex) -> Option<LineString<f64>> {
        let (u, v) = self.graph.edge_endpoints(index)?;
        let edge = self.graph.edge_weight(index)?;
        Some(edge.path.clone().unwrap_or_else(|| {
            LineString::new(vec![self.graph[u].point.0, self.graph[v].point.0])
        }))
    }

    /// The node nearest to the given position, in the network's frame.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::NoNodeFound`] on an empty index.
    pub fn nearest_node(&self, x: f64, y: f64) -> Result<NodeIndex, NetworkError> {
        self.index
            .nearest_neighbor(&[x, y])
            .map(|indexed| indexed.data)
            .ok_or(NetworkError::NoNodeFound)
    }

    /// Returns a copy of this network with node positions and edge
    /// paths projected into `to`. The source network is untouched.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError::Geometry`] projection error when the
    /// frames cannot be reconciled.
    pub fn project_to(&self, to: Crs) -> Result<Self, NetworkError> {
        let mut graph = self.graph.clone();
        for node in graph.node_weights_mut() {
            node.point = crs::project_point(node.point, self.crs, to)?;
        }
        for edge in graph.edge_weights_mut() {
            if let Some(path) = &edge.path {
                edge.path = Some(crs::project_line(path, self.crs, to)?);
            }
        }
        let index = build_index(&graph);
        Ok(Self {
            graph,
            index,
            crs: to,
        })
    }

    /// Sets every edge's traversal minutes from its length and a uniform
    /// travel speed. Any previously annotated value is overwritten, so
    /// re-running with a new speed never mixes stale weights.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::NonPositiveSpeed`] for `speed_kmh <= 0`.
    pub fn annotate_travel_time(&mut self, speed_kmh: f64) -> Result<(), NetworkError> {
        if speed_kmh <= 0.0 {
            return Err(NetworkError::NonPositiveSpeed { speed_kmh });
        }
        let metres_per_minute = speed_kmh * 1000.0 / 60.0;
        for edge in self.graph.edge_weights_mut() {
            edge.minutes = Some(edge.length_m / metres_per_minute);
        }
        log::debug!(
            "annotated {} edges at {speed_kmh} km/h ({metres_per_minute} m/min)",
            self.graph.edge_count()
        );
        Ok(())
    }

    /// All nodes reachable from `center` within `budget_minutes` of
    /// traversal, plus the induced edge set.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::NoNodeFound`] for an unknown center and
    /// [`NetworkError::MissingTravelTime`] when edges were never
    /// annotated.
    pub fn reachable_within(
        &self,
        center: NodeIndex,
        budget_minutes: f64,
    ) -> Result<EgoSubgraph, NetworkError> {
        traverse::ego_subgraph(self, center, budget_minutes)
    }

    pub(crate) const fn graph(&self) -> &UnGraph<RoadNode, RoadEdge> {
        &self.graph
    }
}

/// Merges two networks in the same frame on shared node ids. Node and
/// edge duplicates keep their first (left network) occurrence.
///
/// # Errors
///
/// Returns [`NetworkError::FrameMismatch`] for differing frames, or
/// [`NetworkError::InvalidGraph`] if the merge is degenerate.
pub fn compose(left: &RoadNetwork, right: &RoadNetwork) -> Result<RoadNetwork, NetworkError> {
    if left.crs != right.crs {
        return Err(NetworkError::FrameMismatch {
            left: left.crs,
            right: right.crs,
        });
    }

    let mut nodes: Vec<RoadNode> = Vec::new();
    let mut seen_nodes: BTreeSet<i64> = BTreeSet::new();
    let mut edges: Vec<(i64, i64, RoadEdge)> = Vec::new();
    let mut seen_edges: BTreeSet<(i64, i64)> = BTreeSet::new();

    for network in [left, right] {
        for index in network.graph.node_indices() {
            let node = &network.graph[index];
            if seen_nodes.insert(node.osm_id) {
                nodes.push(node.clone());
            }
        }
        for edge_index in network.graph.edge_indices() {
            let Some((u, v)) = network.graph.edge_endpoints(edge_index) else {
                continue;
            };
            let (u_id, v_id) = (network.graph[u].osm_id, network.graph[v].osm_id);
            let key = (u_id.min(v_id), u_id.max(v_id));
            if seen_edges.insert(key) {
                if let Some(edge) = network.graph.edge_weight(edge_index) {
                    edges.push((u_id, v_id, edge.clone()));
                }
            }
        }
    }

    RoadNetwork::from_parts(left.crs, nodes, edges)
}

fn build_index(graph: &UnGraph<RoadNode, RoadEdge>) -> RTree<IndexedNode> {
    RTree::bulk_load(
        graph
            .node_indices()
            .map(|index| {
                let point = graph[index].point;
                IndexedNode::new([point.x(), point.y()], index)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric() -> Crs {
        Crs::Utm {
            zone: 33,
            north: true,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn line_nodes(spacing_m: f64, count: i64) -> Vec<RoadNode> {
        (0..count)
            .map(|i| RoadNode {
                osm_id: i,
                point: Point::new(i as f64 * spacing_m, 0.0),
            })
            .collect()
    }

    fn line_edges(spacing_m: f64, count: i64) -> Vec<(i64, i64, RoadEdge)> {
        (0..count - 1)
            .map(|i| (i, i + 1, RoadEdge::with_length(spacing_m)))
            .collect()
    }

    #[test]
    fn empty_graph_is_invalid() {
        let result = RoadNetwork::from_parts(metric(), Vec::new(), Vec::new());
        assert!(matches!(
            result,
            Err(NetworkError::InvalidGraph {
                node_count: 0,
                edge_count: 0
            })
        ));
    }

    #[test]
    fn edgeless_graph_is_invalid() {
        let result = RoadNetwork::from_parts(metric(), line_nodes(100.0, 3), Vec::new());
        assert!(matches!(
            result,
            Err(NetworkError::InvalidGraph { edge_count: 0, .. })
        ));
    }

    #[test]
    fn unknown_edge_endpoints_are_skipped() {
        let mut edges = line_edges(100.0, 5);
        edges.push((98, 99, RoadEdge::with_length(7.0)));
        let network = RoadNetwork::from_parts(metric(), line_nodes(100.0, 5), edges).unwrap();
        assert_eq!(network.edge_count(), 4);
    }

    #[test]
    fn nearest_node_picks_closest() {
        let network =
            RoadNetwork::from_parts(metric(), line_nodes(100.0, 5), line_edges(100.0, 5)).unwrap();
        let near = network.nearest_node(210.0, 5.0).unwrap();
        assert_eq!(network.node(near).unwrap().osm_id, 2);
    }

    #[test]
    fn annotation_is_idempotent_and_overwrites() {
        let mut network =
            RoadNetwork::from_parts(metric(), line_nodes(100.0, 5), line_edges(100.0, 5)).unwrap();

        // 6 km/h is 100 m/min, so a 100 m edge costs one minute.
        network.annotate_travel_time(6.0).unwrap();
        let first: Vec<f64> = network
            .graph()
            .edge_weights()
            .map(|edge| edge.minutes.unwrap())
            .collect();
        assert!(first.iter().all(|minutes| (minutes - 1.0).abs() < 1e-12));

        network.annotate_travel_time(6.0).unwrap();
        let second: Vec<f64> = network
            .graph()
            .edge_weights()
            .map(|edge| edge.minutes.unwrap())
            .collect();
        assert_eq!(first, second);

        // Doubling the speed halves every weight; nothing stale survives.
        network.annotate_travel_time(12.0).unwrap();
        assert!(
            network
                .graph()
                .edge_weights()
                .all(|edge| (edge.minutes.unwrap() - 0.5).abs() < 1e-12)
        );
    }

    #[test]
    fn non_positive_speed_is_rejected() {
        let mut network =
            RoadNetwork::from_parts(metric(), line_nodes(100.0, 2), line_edges(100.0, 2)).unwrap();
        assert!(matches!(
            network.annotate_travel_time(0.0),
            Err(NetworkError::NonPositiveSpeed { .. })
        ));
    }

    #[test]
    fn projection_leaves_source_untouched() {
        let nodes = vec![
            RoadNode {
                osm_id: 0,
                point: Point::new(13.40, 52.52),
            },
            RoadNode {
                osm_id: 1,
                point: Point::new(13.41, 52.52),
            },
        ];
        let edges = vec![(0, 1, RoadEdge::with_length(680.0))];
        let network = RoadNetwork::from_parts(Crs::Wgs84, nodes, edges).unwrap();

        let projected = network
            .project_to(Crs::Utm {
                zone: 33,
                north: true,
            })
            .unwrap();

        assert_eq!(network.crs(), Crs::Wgs84);
        assert_eq!(
            projected.crs(),
            Crs::Utm {
                zone: 33,
                north: true
            }
        );
        let original = network.node_point(NodeIndex::new(0)).unwrap();
        let moved = projected.node_point(NodeIndex::new(0)).unwrap();
        assert!((original.x() - 13.40).abs() < f64::EPSILON);
        assert!(moved.x() > 100_000.0);
    }

    #[test]
    fn edge_path_falls_back_to_straight_segment() {
        let network =
            RoadNetwork::from_parts(metric(), line_nodes(100.0, 2), line_edges(100.0, 2)).unwrap();
        let path = network.edge_path(EdgeIndex::new(0)).unwrap();
        assert_eq!(path.0.len(), 2);
        assert!((path.0[1].x - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn compose_merges_on_shared_ids() {
        let left =
            RoadNetwork::from_parts(metric(), line_nodes(100.0, 3), line_edges(100.0, 3)).unwrap();
        // Right network shares node 2 and extends the line.
        let right_nodes = vec![
            RoadNode {
                osm_id: 2,
                point: Point::new(200.0, 0.0),
            },
            RoadNode {
                osm_id: 3,
                point: Point::new(300.0, 0.0),
            },
        ];
        let right_edges = vec![(2, 3, RoadEdge::with_length(100.0))];
        let right = RoadNetwork::from_parts(metric(), right_nodes, right_edges).unwrap();

        let merged = compose(&left, &right).unwrap();
        assert_eq!(merged.node_count(), 4);
        assert_eq!(merged.edge_count(), 3);
    }

    #[test]
    fn compose_rejects_frame_mixture() {
        let left =
            RoadNetwork::from_parts(metric(), line_nodes(100.0, 2), line_edges(100.0, 2)).unwrap();
        let right_nodes = vec![
            RoadNode {
                osm_id: 0,
                point: Point::new(13.40, 52.52),
            },
            RoadNode {
                osm_id: 1,
                point: Point::new(13.41, 52.52),
            },
        ];
        let right =
            RoadNetwork::from_parts(Crs::Wgs84, right_nodes, vec![(0, 1, RoadEdge::with_length(680.0))])
                .unwrap();
        assert!(matches!(
            compose(&left, &right),
            Err(NetworkError::FrameMismatch { .. })
        ));
    }
}
