#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Life-space mobility metrics from time-stamped geolocation traces.
//!
//! A trace is partitioned by calendar day and each day is reduced to the
//! convex hull of its positions. Day-level and aggregate metrics are
//! derived from those hulls: how much of a day's range was already
//! visited on other days, how much of the cumulative life-space a single
//! day covers, per-day compactness, and areas in km².
//!
//! Days whose samples collapse to a point or a line are dropped from the
//! set entirely — with a typed, logged reason — rather than carried as
//! zero-area pseudo-polygons that would poison downstream ratios.

pub mod hulls;
pub mod metrics;

pub use hulls::{DailyHulls, DropReason, DroppedDay, daily_hulls};
pub use metrics::{
    MetricSeries, aggregate_area_km2, aggregate_compactness, compactness_series, daily_area_km2,
    overall_hull, overlap_with_overall, revisit_overlap,
};

use chrono::{DateTime, Utc};
use mobility_map_geometry::GeometryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One geolocation sample: a UTC timestamp and a geographic position.
///
/// This is also the CSV row shape the command line tool ingests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Sample time; only the calendar date takes part in grouping.
    pub timestamp: DateTime<Utc>,
    /// Longitude in WGS84.
    pub lon: f64,
    /// Latitude in WGS84.
    pub lat: f64,
}

/// Errors that can occur while deriving life-space metrics.
#[derive(Debug, Error)]
pub enum LifeSpaceError {
    /// No usable days exist to aggregate over.
    #[error("life space has no usable days")]
    EmptyLifeSpace,

    /// A projection or overlay failed.
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),
}
