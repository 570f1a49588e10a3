//! Mobility metric series derived from daily hulls.
//!
//! Hulls are stored geographic; every metric first reprojects the whole
//! set into one shared UTM zone (detected from the earliest day) so
//! areas and perimeters are true metre quantities.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use mobility_map_geometry::{
    Crs, OverlayOp, Region, area_ratio, compactness, dissolve, overlay,
};

use crate::{DailyHulls, LifeSpaceError};

/// A date-keyed scalar series, ready to join into a downstream table.
pub type MetricSeries = BTreeMap<NaiveDate, f64>;

/// The cumulative life-space: convex hull of the union of all daily
/// hulls, in the shared metric frame.
///
/// # Errors
///
/// Returns [`LifeSpaceError::EmptyLifeSpace`] when no day survived hull
/// construction.
pub fn overall_hull(hulls: &DailyHulls) -> Result<Region, LifeSpaceError> {
    let projected = project_hulls(hulls)?;
    let Some(frame) = projected.values().next().map(Region::crs) else {
        return Err(LifeSpaceError::EmptyLifeSpace);
    };
    let days: Vec<Region> = projected.into_values().collect();
    Ok(dissolve(&days, frame)?.convex_hull())
}

/// Per day, the percentage of that day's hull already covered by the
/// union of every other day's hull. 0 when nothing else intersects —
/// including the single-day case.
///
/// # Errors
///
/// Returns a [`LifeSpaceError::Geometry`] error if the set cannot be
/// reprojected into one frame.
pub fn revisit_overlap(hulls: &DailyHulls) -> Result<MetricSeries, LifeSpaceError> {
    let projected = project_hulls(hulls)?;
    let mut series = MetricSeries::new();
    for (date, hull) in &projected {
        let others: Vec<Region> = projected
            .iter()
            .filter(|(other, _)| *other != date)
            .map(|(_, region)| region.clone())
            .collect();
        let merged = dissolve(&others, hull.crs())?;
        let revisited = overlay(hull, &merged, OverlayOp::Intersection, false)?;
        series.insert(*date, area_ratio(&revisited, hull));
    }
    Ok(series)
}

/// Per day, the percentage of the cumulative life-space covered by that
/// single day's hull.
///
/// # Errors
///
/// Returns a [`LifeSpaceError::Geometry`] error if the set cannot be
/// reprojected into one frame.
pub fn overlap_with_overall(hulls: &DailyHulls) -> Result<MetricSeries, LifeSpaceError> {
    let projected = project_hulls(hulls)?;
    let Some(frame) = projected.values().next().map(Region::crs) else {
        return Ok(MetricSeries::new());
    };
    let days: Vec<Region> = projected.values().cloned().collect();
    let overall = dissolve(&days, frame)?.convex_hull();

    let mut series = MetricSeries::new();
    for (date, hull) in &projected {
        let covered = overlay(hull, &overall, OverlayOp::Intersection, false)?;
        series.insert(*date, area_ratio(&covered, &overall));
    }
    Ok(series)
}

/// Per-day hull compactness in the metric frame.
///
/// # Errors
///
/// Returns a [`LifeSpaceError::Geometry`] error if the set cannot be
/// reprojected into one frame.
pub fn compactness_series(hulls: &DailyHulls) -> Result<MetricSeries, LifeSpaceError> {
    let projected = project_hulls(hulls)?;
    Ok(projected
        .iter()
        .map(|(date, hull)| (*date, compactness(hull)))
        .collect())
}

/// Per-day hull area in km².
///
/// # Errors
///
/// Returns a [`LifeSpaceError::Geometry`] error if the set cannot be
/// reprojected into one frame.
pub fn daily_area_km2(hulls: &DailyHulls) -> Result<MetricSeries, LifeSpaceError> {
    let projected = project_hulls(hulls)?;
    Ok(projected
        .iter()
        .map(|(date, hull)| (*date, hull.area_m2() / 1e6))
        .collect())
}

/// Area of the cumulative life-space in km².
///
/// # Errors
///
/// Returns [`LifeSpaceError::EmptyLifeSpace`] when no day survived.
pub fn aggregate_area_km2(hulls: &DailyHulls) -> Result<f64, LifeSpaceError> {
    Ok(overall_hull(hulls)?.area_m2() / 1e6)
}

/// Compactness of the cumulative life-space.
///
/// # Errors
///
/// Returns [`LifeSpaceError::EmptyLifeSpace`] when no day survived.
pub fn aggregate_compactness(hulls: &DailyHulls) -> Result<f64, LifeSpaceError> {
    Ok(compactness(&overall_hull(hulls)?))
}

/// Reprojects every hull into one shared UTM zone, detected from the
/// earliest retained day.
fn project_hulls(hulls: &DailyHulls) -> Result<BTreeMap<NaiveDate, Region>, LifeSpaceError> {
    let mut projected = BTreeMap::new();
    let mut frame: Option<Crs> = None;
    for (date, hull) in hulls.hulls() {
        let region = match frame {
            None => {
                let region = hull.to_metric()?;
                frame = Some(region.crs());
                region
            }
            Some(frame) => hull.to_crs(frame)?,
        };
        projected.insert(*date, region);
    }
    Ok(projected)
}
