//! Daily convex hulls over a trace, with auditable degenerate-day
//! drops.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use geo::{Area, ConvexHull, Geometry, MultiPoint, Point};
use mobility_map_geometry::{Crs, Region};

use crate::TraceRecord;

/// Why a day was excluded from the daily region set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Every sample of the day sat on one position.
    SinglePosition,
    /// The day's positions are collinear; the hull has no area.
    CollinearPositions,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SinglePosition => write!(f, "all samples at a single position"),
            Self::CollinearPositions => write!(f, "samples are collinear"),
        }
    }
}

/// A day excluded from the daily region set, and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DroppedDay {
    /// The excluded calendar date.
    pub date: NaiveDate,
    /// The degeneracy that excluded it.
    pub reason: DropReason,
}

/// One convex hull per distinct calendar day of a trace, plus the
/// record of days dropped as degenerate.
///
/// Every date key is unique, and a dropped day is absent from the hull
/// map entirely so derived series stay consistent with each other.
#[derive(Debug, Clone)]
pub struct DailyHulls {
    hulls: BTreeMap<NaiveDate, Region>,
    dropped: Vec<DroppedDay>,
}

impl DailyHulls {
    /// The hull per retained day, in date order.
    #[must_use]
    pub const fn hulls(&self) -> &BTreeMap<NaiveDate, Region> {
        &self.hulls
    }

    /// The retained dates in order.
    #[must_use]
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.hulls.keys().copied().collect()
    }

    /// Days excluded as degenerate, in trace order.
    #[must_use]
    pub fn dropped(&self) -> &[DroppedDay] {
        &self.dropped
    }

    /// Number of retained days.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hulls.len()
    }

    /// Whether no day survived.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hulls.is_empty()
    }

    /// The hull for one date, if the date survived.
    #[must_use]
    pub fn get(&self, date: NaiveDate) -> Option<&Region> {
        self.hulls.get(&date)
    }
}

/// Partitions a trace by calendar date and reduces each day to the
/// convex hull of its positions, in WGS84.
///
/// Days that degenerate to a single position or a collinear set are
/// dropped and recorded, never returned as zero-area hulls.
#[must_use]
pub fn daily_hulls(trace: &[TraceRecord]) -> DailyHulls {
    let mut by_day: BTreeMap<NaiveDate, Vec<Point<f64>>> = BTreeMap::new();
    for record in trace {
        by_day
            .entry(record.timestamp.date_naive())
            .or_default()
            .push(Point::new(record.lon, record.lat));
    }

    let mut hulls = BTreeMap::new();
    let mut dropped = Vec::new();

    for (date, mut points) in by_day {
        points.sort_by(|a, b| {
            a.x()
                .total_cmp(&b.x())
                .then_with(|| a.y().total_cmp(&b.y()))
        });
        points.dedup_by(|a, b| a == b);

        if points.len() == 1 {
            log::warn!("dropping {date}: all samples at a single position");
            dropped.push(DroppedDay {
                date,
                reason: DropReason::SinglePosition,
            });
            continue;
        }

        let hull = MultiPoint::new(points).convex_hull();
        if hull.unsigned_area() == 0.0 {
            log::warn!("dropping {date}: samples are collinear");
            dropped.push(DroppedDay {
                date,
                reason: DropReason::CollinearPositions,
            });
            continue;
        }

        hulls.insert(date, Region::new(Geometry::Polygon(hull), Crs::Wgs84));
    }

    DailyHulls { hulls, dropped }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn record(day: u32, hour: u32, lon: f64, lat: f64) -> TraceRecord {
        TraceRecord {
            timestamp: Utc.with_ymd_and_hms(2021, 6, day, hour, 0, 0).unwrap(),
            lon,
            lat,
        }
    }

    #[test]
    fn one_hull_per_distinct_day() {
        let trace = vec![
            record(1, 8, 13.40, 52.52),
            record(1, 12, 13.41, 52.52),
            record(1, 18, 13.405, 52.528),
            record(2, 9, 13.42, 52.53),
            record(2, 13, 13.43, 52.53),
            record(2, 20, 13.425, 52.538),
        ];
        let hulls = daily_hulls(&trace);
        assert_eq!(hulls.len(), 2);
        assert!(hulls.dropped().is_empty());
        assert_eq!(
            hulls.dates(),
            vec![
                NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2021, 6, 2).unwrap(),
            ]
        );
    }

    #[test]
    fn degenerate_days_are_dropped_with_reasons() {
        let trace = vec![
            // Day 1: a proper triangle.
            record(1, 8, 13.40, 52.52),
            record(1, 12, 13.41, 52.52),
            record(1, 18, 13.405, 52.528),
            // Day 2: one sample.
            record(2, 9, 13.42, 52.53),
            // Day 3: the same position five times.
            record(3, 8, 13.44, 52.54),
            record(3, 10, 13.44, 52.54),
            record(3, 12, 13.44, 52.54),
            record(3, 14, 13.44, 52.54),
            record(3, 16, 13.44, 52.54),
            // Day 4: two positions, a line.
            record(4, 9, 13.45, 52.55),
            record(4, 17, 13.46, 52.55),
        ];
        let hulls = daily_hulls(&trace);

        // Hull count equals distinct dates minus dropped days.
        assert_eq!(hulls.len(), 4 - hulls.dropped().len());
        assert_eq!(hulls.len(), 1);

        let reasons: Vec<DropReason> = hulls.dropped().iter().map(|day| day.reason).collect();
        assert_eq!(
            reasons,
            vec![
                DropReason::SinglePosition,
                DropReason::SinglePosition,
                DropReason::CollinearPositions,
            ]
        );
    }

    #[test]
    fn hulls_are_geographic_polygons() {
        let trace = vec![
            record(1, 8, 13.40, 52.52),
            record(1, 12, 13.41, 52.52),
            record(1, 18, 13.405, 52.528),
        ];
        let hulls = daily_hulls(&trace);
        let region = hulls
            .get(NaiveDate::from_ymd_opt(2021, 6, 1).unwrap())
            .unwrap();
        assert_eq!(region.crs(), Crs::Wgs84);
        assert!(region.area_m2() > 0.0);
    }

    #[test]
    fn empty_trace_yields_empty_set() {
        let hulls = daily_hulls(&[]);
        assert!(hulls.is_empty());
        assert!(hulls.dropped().is_empty());
    }
}
