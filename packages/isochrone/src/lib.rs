#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Reachability polygons (isochrones) over a road network.
//!
//! For each requested time budget, expands the network from the node
//! nearest a geographic center, buffers every reachable node and edge in
//! a metric frame, and unions the buffers into one solid region. Budgets
//! are processed largest first so the returned sequence layers naturally
//! when rendered.
//!
//! The pipeline is state-free: each request projects and annotates its
//! own copy of the network, so concurrent requests with different speeds
//! or frames never interfere.

use geo::{Geometry, LineString, MultiLineString, MultiPoint, Point};
use mobility_map_geometry::{Crs, GeometryError, Region, dissolve};
use mobility_map_network::{EgoSubgraph, NetworkError, RoadNetwork};
use thiserror::Error;

/// Default node buffer radius in metres.
pub const DEFAULT_NODE_BUFFER_M: f64 = 50.0;

/// Default edge buffer radius in metres.
pub const DEFAULT_EDGE_BUFFER_M: f64 = 25.0;

/// Errors that can occur while building isochrones.
#[derive(Debug, Error)]
pub enum IsochroneError {
    /// The request named no time budgets.
    #[error("no time budgets supplied")]
    NoBudgets,

    /// A time budget was negative. Zero is allowed and degenerates to
    /// the center node's buffer.
    #[error("time budgets must be non-negative, got {minutes}")]
    NegativeBudget {
        /// The rejected budget.
        minutes: f64,
    },

    /// Graph resolution, projection, or traversal failed.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// Buffering or dissolving failed.
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),
}

/// One isochrone request: a geographic center, the time budgets to
/// compute, a uniform travel speed, and buffer radii.
#[derive(Debug, Clone)]
pub struct IsochroneRequest {
    /// Center longitude (or easting when the network is already
    /// metric).
    pub lon: f64,
    /// Center latitude (or northing when the network is already
    /// metric).
    pub lat: f64,
    /// Time budgets in minutes; computed in descending order.
    pub budgets_minutes: Vec<f64>,
    /// Uniform travel speed in km/h.
    pub speed_kmh: f64,
    /// Radius of the circular buffer around each reachable node.
    pub node_buffer_m: f64,
    /// Radius of the corridor buffer along each reachable edge.
    pub edge_buffer_m: f64,
    /// Remove interior holes so each polygon reads as solid.
    pub infill: bool,
    /// Target metric frame; auto-detected from the center when absent.
    pub target_crs: Option<Crs>,
}

impl IsochroneRequest {
    /// A request with the default buffer radii, no infill, and
    /// auto-detected target frame.
    #[must_use]
    pub fn new(lon: f64, lat: f64, budgets_minutes: Vec<f64>, speed_kmh: f64) -> Self {
        Self {
            lon,
            lat,
            budgets_minutes,
            speed_kmh,
            node_buffer_m: DEFAULT_NODE_BUFFER_M,
            edge_buffer_m: DEFAULT_EDGE_BUFFER_M,
            infill: false,
            target_crs: None,
        }
    }
}

/// One reachability polygon, tagged with the budget it was computed
/// for.
#[derive(Debug, Clone)]
pub struct Isochrone {
    /// The time budget this polygon covers, in minutes.
    pub budget_minutes: f64,
    /// The reachable region, in the request's metric frame.
    pub region: Region,
}

/// Builds one isochrone per requested budget, largest budget first.
///
/// A budget of zero, or a center with no reachable neighbours, yields
/// the center node's buffer rather than an error.
///
/// # Errors
///
/// Returns [`IsochroneError::NoBudgets`] / [`IsochroneError::NegativeBudget`]
/// for unusable budget lists, and propagates network and geometry
/// failures for the request as a whole.
pub fn build_isochrones(
    network: &RoadNetwork,
    request: &IsochroneRequest,
) -> Result<Vec<Isochrone>, IsochroneError> {
    if request.budgets_minutes.is_empty() {
        return Err(IsochroneError::NoBudgets);
    }
    if let Some(&bad) = request
        .budgets_minutes
        .iter()
        .find(|&&minutes| minutes < 0.0)
    {
        return Err(IsochroneError::NegativeBudget { minutes: bad });
    }

    // Nearest center is resolved in the network's own frame, before any
    // projection, so the request coordinates match what the loader saw.
    let center = network.nearest_node(request.lon, request.lat)?;

    let target = request
        .target_crs
        .unwrap_or_else(|| Crs::utm_for(request.lon, request.lat));
    if !target.is_metric() {
        return Err(IsochroneError::Geometry(GeometryError::NotMetric(target)));
    }

    let mut projected = network.project_to(target)?;
    projected.annotate_travel_time(request.speed_kmh)?;

    let mut budgets = request.budgets_minutes.clone();
    budgets.sort_unstable_by(f64::total_cmp);
    budgets.reverse();

    let mut isochrones = Vec::with_capacity(budgets.len());
    for budget in budgets {
        let ego = projected.reachable_within(center, budget)?;
        log::info!(
            "isochrone at {budget} min: {} nodes, {} edges",
            ego.nodes.len(),
            ego.edges.len()
        );
        let region = polygonize(&projected, &ego, request, target)?;
        isochrones.push(Isochrone {
            budget_minutes: budget,
            region,
        });
    }
    Ok(isochrones)
}

/// Buffers the subgraph's nodes and edges and unions everything into
/// one region.
fn polygonize(
    network: &RoadNetwork,
    ego: &EgoSubgraph,
    request: &IsochroneRequest,
    crs: Crs,
) -> Result<Region, IsochroneError> {
    let points: Vec<Point<f64>> = ego
        .nodes
        .iter()
        .filter_map(|&node| network.node_point(node))
        .collect();
    let node_region = Region::new(Geometry::MultiPoint(MultiPoint::new(points)), crs)
        .buffer(request.node_buffer_m)?;

    let lines: Vec<LineString<f64>> = ego
        .edges
        .iter()
        .filter_map(|&edge| network.edge_path(edge))
        .collect();
    let edge_region = Region::new(Geometry::MultiLineString(MultiLineString::new(lines)), crs)
        .buffer(request.edge_buffer_m)?;

    let mut region = dissolve(&[node_region, edge_region], crs)?;
    if request.infill {
        region = region.filled();
    }
    Ok(region)
}
