//! Set operations over regions: dissolve and geometry-type-agnostic
//! overlay.

use geo::{BooleanOps, Contains, Geometry, MultiPoint, MultiPolygon, Point, Polygon};

use crate::{Crs, GeometryError, Region};

/// The set operation an [`overlay`] computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayOp {
    /// Parts of `a` also covered by `b`.
    Intersection,
    /// Parts of `a` not covered by `b`.
    Difference,
}

/// Dissolves the polygonal parts of several regions into one
/// self-overlap-free region in the given frame.
///
/// Always applied before ratio computation so overlapping input cannot
/// double-count. An empty slice dissolves to an empty region.
///
/// # Errors
///
/// Returns [`GeometryError::CrsMismatch`] if any region is not already
/// expressed in `crs`.
pub fn dissolve(regions: &[Region], crs: Crs) -> Result<Region, GeometryError> {
    let mut polygons = Vec::new();
    for region in regions {
        if region.crs() != crs {
            return Err(GeometryError::CrsMismatch {
                from: region.crs(),
                to: crs,
            });
        }
        polygons.extend(region.polygons().0);
    }
    Ok(Region::new(
        Geometry::MultiPolygon(union_all(polygons)),
        crs,
    ))
}

/// Overlays `b` onto `a`, reprojecting `b` into `a`'s frame first when a
/// forward projection can reconcile them.
///
/// With `merge_b`, `b` is dissolved before the overlay — the setting for
/// coverage-ratio uses, where overlapping reference features must not be
/// counted twice. Without it each feature of `b` participates as-is,
/// which per-feature counting uses rely on.
///
/// Mixed geometry types are tolerated: polygon parts of `b` intersect or
/// subtract as areas, point parts are kept where `a` contains them, and
/// line parts are clipped to `a`. Disjoint inputs yield an empty region,
/// not an error.
///
/// # Errors
///
/// Returns [`GeometryError::CrsMismatch`] when the two frames cannot be
/// reconciled.
pub fn overlay(
    a: &Region,
    b: &Region,
    op: OverlayOp,
    merge_b: bool,
) -> Result<Region, GeometryError> {
    let b = if b.crs() == a.crs() {
        b.clone()
    } else {
        b.to_crs(a.crs())?
    };
    let b = if merge_b { b.dissolved() } else { b };

    let a_polygons = a.polygons();
    let mut parts: Vec<Geometry<f64>> = Vec::new();

    let polygon_part = match op {
        OverlayOp::Intersection => a_polygons.intersection(&b.polygons()),
        OverlayOp::Difference => a_polygons.difference(&b.polygons()),
    };
    if !polygon_part.0.is_empty() {
        parts.push(Geometry::MultiPolygon(polygon_part));
    }

    if op == OverlayOp::Intersection {
        let contained: Vec<Point<f64>> = b
            .points()
            .into_iter()
            .filter(|point| a_polygons.contains(point))
            .collect();
        if !contained.is_empty() {
            parts.push(Geometry::MultiPoint(MultiPoint::new(contained)));
        }

        let lines = b.lines();
        if !lines.0.is_empty() {
            let clipped = a_polygons.clip(&lines, false);
            if clipped.0.iter().any(|line| !line.0.is_empty()) {
                parts.push(Geometry::MultiLineString(clipped));
            }
        }
    }

    let crs = a.crs();
    Ok(if parts.is_empty() {
        Region::empty(crs)
    } else if parts.len() == 1 {
        Region::new(parts.remove(0), crs)
    } else {
        Region::new(Geometry::GeometryCollection(geo::GeometryCollection(parts)), crs)
    })
}

/// Folds a pile of polygons into one dissolved multi-polygon.
pub(crate) fn union_all(polygons: impl IntoIterator<Item = Polygon<f64>>) -> MultiPolygon<f64> {
    let mut dissolved = MultiPolygon::new(Vec::new());
    for polygon in polygons {
        if dissolved.0.is_empty() {
            dissolved = MultiPolygon::new(vec![polygon]);
        } else {
            dissolved = dissolved.union(&MultiPolygon::new(vec![polygon]));
        }
    }
    dissolved
}
