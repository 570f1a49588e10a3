#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory road network graph for reachability analysis.
//!
//! Wraps a `petgraph` undirected graph with attributed nodes (position)
//! and edges (physical length, optional recorded path geometry, optional
//! traversal minutes), plus an `rstar` R-tree for nearest-node lookup.
//!
//! The network is loaded once by a collaborator and treated as read-only
//! by consumers; travel-time annotation happens on a request-local
//! projected copy so repeated requests with different speeds never see
//! stale weights.

pub mod graph;
pub mod stats;
mod traverse;

pub use graph::{RoadEdge, RoadNetwork, RoadNode, compose};
pub use stats::NetworkStats;
pub use traverse::EgoSubgraph;

use mobility_map_geometry::{Crs, GeometryError};
use thiserror::Error;

/// Errors that can occur during road network operations.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The graph has no usable structure; consumers fail fast instead of
    /// proceeding on an empty network.
    #[error("invalid road network: {node_count} nodes, {edge_count} edges")]
    InvalidGraph {
        /// Nodes present at validation time.
        node_count: usize,
        /// Edges present at validation time.
        edge_count: usize,
    },

    /// No node exists to serve as a traversal center.
    #[error("no node found to serve as center")]
    NoNodeFound,

    /// Travel-time annotation needs a positive speed.
    #[error("travel speed must be positive, got {speed_kmh} km/h")]
    NonPositiveSpeed {
        /// The rejected speed.
        speed_kmh: f64,
    },

    /// Traversal was attempted before travel times were annotated.
    #[error("edge travel times have not been annotated")]
    MissingTravelTime,

    /// Two networks in different frames cannot be combined.
    #[error("cannot combine networks in {left} and {right}")]
    FrameMismatch {
        /// Frame of the first network.
        left: Crs,
        /// Frame of the second network.
        right: Crs,
    },

    /// A projection failed.
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),
}
