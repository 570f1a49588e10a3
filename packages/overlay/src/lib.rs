#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Overlap tests between place buffers and a reference layer.
//!
//! Given small circular buffers around dwell-cluster centers and a layer
//! of reference features (green space polygons, amenity points), this
//! driver answers which places intersect the layer and hands back the
//! combined overlay geometry for ratio computation by callers.
//!
//! The layer merge policy selects the use case: merge before overlay for
//! coverage ratios (overlapping features must not double-count), no
//! merge for per-feature counting. One place failing to overlay does not
//! abort the batch; failures are reported per item.

use geo::{Centroid, Geometry, Point};
use mobility_map_geometry::{Crs, GeometryError, OverlayOp, Region, overlay, point_buffer};
use thiserror::Error;

/// Errors that can occur while driving overlap tests.
#[derive(Debug, Clone, Error)]
pub enum OverlayError {
    /// A place buffer could not be overlaid with the layer.
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),
}

/// A candidate place: a dwell-cluster identifier and the buffered
/// region around its center.
#[derive(Debug, Clone)]
pub struct PlaceBuffer {
    /// Stable place identifier.
    pub id: u64,
    /// Circular buffer around the cluster center, in a metric frame.
    pub region: Region,
}

/// The outcome of overlaying a set of place buffers with a reference
/// layer.
#[derive(Debug, Clone)]
pub struct LayerIntersections {
    /// Distinct identifiers of places with a non-empty overlay, in
    /// ascending order.
    pub place_ids: Vec<u64>,
    /// The per-place overlay geometries gathered into one region, for
    /// downstream ratio computation.
    pub combined: Region,
    /// Places whose overlay failed, with the error that stopped them.
    pub failed: Vec<(u64, OverlayError)>,
}

/// Builds circular buffers of `radius_m` metres around dwell-cluster
/// centers given as geographic (lon, lat) points.
///
/// Duplicate identifiers keep their first occurrence. All buffers are
/// expressed in the UTM zone of the first center so they can be
/// combined directly.
#[must_use]
pub fn place_buffers(centers: &[(u64, Point<f64>)], radius_m: f64) -> Vec<PlaceBuffer> {
    let mut seen = std::collections::BTreeSet::new();
    let mut buffers = Vec::with_capacity(centers.len());
    for (id, center) in centers {
        if !seen.insert(*id) {
            log::warn!("duplicate place id {id}; keeping first occurrence");
            continue;
        }
        buffers.push(PlaceBuffer {
            id: *id,
            region: point_buffer(center.x(), center.y(), radius_m),
        });
    }
    buffers
}

/// Overlays every place buffer with the reference layer and reports
/// which places intersect.
///
/// `merge_layer` selects the policy: `true` dissolves the layer before
/// each overlay (coverage-ratio uses), `false` overlays feature-by-
/// feature (counting uses). A place whose overlay fails lands in
/// [`LayerIntersections::failed`] and does not abort the rest.
#[must_use]
pub fn layer_intersections(
    places: &[PlaceBuffer],
    layer: &Region,
    merge_layer: bool,
) -> LayerIntersections {
    let mut place_ids = Vec::new();
    let mut overlays = Vec::new();
    let mut failed = Vec::new();
    let mut frame: Option<Crs> = None;

    for place in places {
        match overlay(&place.region, layer, OverlayOp::Intersection, merge_layer) {
            Ok(result) => {
                if !result.is_empty() {
                    place_ids.push(place.id);
                    frame.get_or_insert(result.crs());
                    overlays.push(result);
                }
            }
            Err(error) => {
                log::warn!("place {} failed to overlay: {error}", place.id);
                failed.push((place.id, OverlayError::Geometry(error)));
            }
        }
    }

    place_ids.sort_unstable();
    place_ids.dedup();

    let frame = frame.unwrap_or_else(|| places.first().map_or(Crs::Wgs84, |p| p.region.crs()));
    let combined = Region::collection(&overlays, frame).unwrap_or_else(|error| {
        log::warn!("overlay results span frames ({error}); combined geometry omitted");
        Region::empty(frame)
    });

    LayerIntersections {
        place_ids,
        combined,
        failed,
    }
}

/// Collapses polygonal reference features to centroid points so polygon
/// and point layers can be combined for per-feature counting. Features
/// that are already points (or anything non-polygonal) pass through
/// unchanged.
#[must_use]
pub fn centroid_layer(layer: &[Region]) -> Vec<Region> {
    layer
        .iter()
        .map(|region| {
            let polygons = region.polygons();
            if polygons.0.is_empty() {
                return region.clone();
            }
            let centroids: Vec<Point<f64>> = polygons
                .iter()
                .filter_map(Centroid::centroid)
                .collect();
            Region::new(
                Geometry::MultiPoint(geo::MultiPoint::new(centroids)),
                region.crs(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use geo::{LineString, MultiPoint, Polygon};

    use super::*;

    fn centers() -> Vec<(u64, Point<f64>)> {
        vec![
            (11, Point::new(13.400, 52.520)),
            (22, Point::new(13.410, 52.520)),
            (33, Point::new(13.500, 52.560)),
        ]
    }

    #[test]
    fn buffers_dedup_ids_first_wins() {
        let mut input = centers();
        input.push((11, Point::new(13.9, 52.9)));
        let buffers = place_buffers(&input, 40.0);
        assert_eq!(buffers.len(), 3);
        assert_eq!(buffers[0].id, 11);
        assert!(buffers.iter().all(|buffer| buffer.region.crs().is_metric()));
    }

    #[test]
    fn point_layer_counts_nearby_places_only() {
        let buffers = place_buffers(&centers(), 40.0);
        // One amenity exactly at place 11's center, one nowhere near.
        let layer = Region::new(
            Geometry::MultiPoint(MultiPoint::new(vec![
                Point::new(13.400, 52.520),
                Point::new(13.900, 52.900),
            ])),
            Crs::Wgs84,
        );
        let result = layer_intersections(&buffers, &layer, false);
        assert_eq!(result.place_ids, vec![11]);
        assert!(result.failed.is_empty());
        assert!(!result.combined.is_empty());
        assert!((result.combined.area_m2() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn polygon_layer_covers_contained_buffers() {
        let buffers = place_buffers(&centers(), 40.0);
        // Green space spanning places 11 and 22 but not 33.
        let green = Region::new(
            Geometry::Polygon(Polygon::new(
                LineString::from(vec![
                    (13.390, 52.510),
                    (13.420, 52.510),
                    (13.420, 52.530),
                    (13.390, 52.530),
                    (13.390, 52.510),
                ]),
                Vec::new(),
            )),
            Crs::Wgs84,
        );
        let result = layer_intersections(&buffers, &green, true);
        assert_eq!(result.place_ids, vec![11, 22]);

        // Both buffers sit fully inside the layer.
        let expected = 2.0 * std::f64::consts::PI * 40.0 * 40.0;
        let error = (result.combined.area_m2() - expected).abs() / expected;
        assert!(error < 0.01, "relative error {error}");
    }

    #[test]
    fn merged_layer_does_not_double_count() {
        let buffers = place_buffers(&centers()[..1], 40.0);
        // The same green polygon listed twice.
        let square = Polygon::new(
            LineString::from(vec![
                (13.390, 52.510),
                (13.420, 52.510),
                (13.420, 52.530),
                (13.390, 52.530),
                (13.390, 52.510),
            ]),
            Vec::new(),
        );
        let layer = Region::new(
            Geometry::MultiPolygon(geo::MultiPolygon::new(vec![square.clone(), square])),
            Crs::Wgs84,
        );
        let result = layer_intersections(&buffers, &layer, true);
        let expected = std::f64::consts::PI * 40.0 * 40.0;
        let error = (result.combined.area_m2() - expected).abs() / expected;
        assert!(error < 0.01, "relative error {error}");
    }

    #[test]
    fn irreconcilable_place_is_isolated_not_fatal() {
        let mut buffers = place_buffers(&centers(), 40.0);
        // A stray buffer in a different UTM zone cannot be reconciled
        // with a layer already in the first zone's frame.
        let zone_32 = Crs::Utm {
            zone: 32,
            north: true,
        };
        buffers.push(PlaceBuffer {
            id: 99,
            region: Region::new(
                Geometry::Polygon(Polygon::new(
                    LineString::from(vec![
                        (0.0, 0.0),
                        (100.0, 0.0),
                        (100.0, 100.0),
                        (0.0, 100.0),
                        (0.0, 0.0),
                    ]),
                    Vec::new(),
                )),
                zone_32,
            ),
        });
        let layer = Region::new(
            Geometry::MultiPoint(MultiPoint::new(vec![Point::new(13.400, 52.520)])),
            buffers[0].region.crs(),
        );
        // Layer is metric in zone 33: the zone 32 buffer cannot pull it
        // over, every other place still resolves.
        let result = layer_intersections(&buffers, &layer, false);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].0, 99);
    }

    #[test]
    fn centroid_layer_collapses_polygons() {
        let square = Region::new(
            Geometry::Polygon(Polygon::new(
                LineString::from(vec![
                    (0.0, 0.0),
                    (100.0, 0.0),
                    (100.0, 100.0),
                    (0.0, 100.0),
                    (0.0, 0.0),
                ]),
                Vec::new(),
            )),
            Crs::Utm {
                zone: 33,
                north: true,
            },
        );
        let amenity = Region::new(
            Geometry::Point(Point::new(5.0, 5.0)),
            Crs::Utm {
                zone: 33,
                north: true,
            },
        );

        let collapsed = centroid_layer(&[square, amenity.clone()]);
        assert_eq!(collapsed.len(), 2);
        let centroid = collapsed[0].points();
        assert_eq!(centroid.0.len(), 1);
        assert!((centroid.0[0].x() - 50.0).abs() < 1e-9);
        assert!((centroid.0[0].y() - 50.0).abs() < 1e-9);
        assert_eq!(collapsed[1], amenity);
    }
}
