#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CRS-tagged region geometry for the mobility map pipeline.
//!
//! Wraps the `geo` crate behind a small engine surface: a [`Region`] value
//! (a geometry plus an explicit coordinate reference system), WGS84 to UTM
//! projection, circular/corridor buffering, dissolve and overlay set
//! operations, and the area-ratio/compactness measures the metric series
//! are built from.
//!
//! All distance and area computation happens in a projected UTM frame;
//! the geographic frame is only used for storage and frame detection.
//! Operations never mutate their inputs — every combination produces a
//! new [`Region`].

pub mod buffer;
pub mod crs;
pub mod measure;
pub mod ops;
pub mod region;

pub use buffer::point_buffer;
pub use crs::Crs;
pub use measure::{area_ratio, compactness};
pub use ops::{OverlayOp, dissolve, overlay};
pub use region::Region;

use thiserror::Error;

/// Errors that can occur during region geometry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// Two coordinate frames cannot be reconciled; only a WGS84 to UTM
    /// forward projection is supported.
    #[error("cannot reconcile coordinate frames: {from} -> {to}")]
    CrsMismatch {
        /// Frame of the geometry being reprojected.
        from: Crs,
        /// Frame the operation needed it in.
        to: Crs,
    },

    /// A length/area-sensitive operation was asked to run in a
    /// geographic frame.
    #[error("operation requires a metric frame, got {0}")]
    NotMetric(Crs),

    /// A metric frame cannot be derived for a region with no coordinates.
    #[error("cannot derive a metric frame for an empty region")]
    EmptyRegion,
}
