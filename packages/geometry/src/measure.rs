//! Scalar measures over regions: area ratios, compactness, and lengths.

use std::f64::consts::PI;

use geo::{LineString, Point};

use crate::Region;

/// Mean Earth radius in metres, for great-circle lengths on
/// geographic coordinates.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Percentage of `denominator`'s area covered by `numerator`, rounded to
/// two decimals.
///
/// A zero-area denominator yields the 0.0 sentinel rather than an error:
/// downstream series treat "no overlap measured" and "no area to
/// overlap" identically, so a day with an empty hull scores the same as
/// a day whose hull nothing intersects. The choice is pinned by tests.
#[must_use]
pub fn area_ratio(numerator: &Region, denominator: &Region) -> f64 {
    let denominator_area = denominator.area_m2();
    if denominator_area == 0.0 {
        log::warn!("area ratio against a zero-area region; returning 0");
        return 0.0;
    }
    round2(numerator.area_m2() / denominator_area * 100.0)
}

/// Shape regularity of a region: `perimeter / (2 * sqrt(pi * area))`.
///
/// 1.0 for a perfect circle, growing with elongation and irregularity.
/// Zero-area regions yield the same 0.0 sentinel as [`area_ratio`].
#[must_use]
pub fn compactness(region: &Region) -> f64 {
    let area = region.area_m2();
    if area == 0.0 {
        log::warn!("compactness of a zero-area region; returning 0");
        return 0.0;
    }
    region.perimeter_m() / (2.0 * (PI * area).sqrt())
}

/// Euclidean length of a line string in frame units.
pub(crate) fn ring_length(line: &LineString<f64>) -> f64 {
    line.lines()
        .map(|segment| (segment.end.x - segment.start.x).hypot(segment.end.y - segment.start.y))
        .sum()
}

/// Great-circle distance in metres between two geographic (lon, lat)
/// points.
#[must_use]
pub fn haversine_m(a: Point<f64>, b: Point<f64>) -> f64 {
    let (lat_a, lat_b) = (a.y().to_radians(), b.y().to_radians());
    let dlat = (b.y() - a.y()).to_radians();
    let dlon = (b.x() - a.x()).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
