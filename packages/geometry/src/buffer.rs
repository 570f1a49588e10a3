//! Circular and corridor buffering in a metric frame.
//!
//! Buffers are assembled from primitive pieces: a fixed-segment circle
//! approximation around points and vertices, and a rectangular corridor
//! along each line segment, all unioned into one dissolved multi-polygon.

use std::f64::consts::TAU;

use geo::{Coord, Geometry, LineString, MultiPolygon, Point, Polygon};

use crate::{Crs, Region, crs, ops, region};

/// Segments used to approximate a circular arc. 32 keeps the area of a
/// unit buffer within 0.4% of a true circle.
const CIRCLE_SEGMENTS: usize = 32;

/// Projects a geographic point into its UTM frame and builds a circular
/// buffer of `radius_m` metres around it, tagged with that frame.
#[must_use]
pub fn point_buffer(lon: f64, lat: f64, radius_m: f64) -> Region {
    let frame = Crs::utm_for(lon, lat);
    let center = match frame {
        Crs::Utm { zone, north } => crs::wgs84_to_utm(Coord { x: lon, y: lat }, zone, north),
        Crs::Wgs84 => Coord { x: lon, y: lat },
    };
    Region::new(Geometry::Polygon(circle(center, radius_m)), frame)
}

/// Buffers every part of a metric-frame geometry by `radius_m` and
/// unions the pieces into one dissolved multi-polygon.
///
/// A non-positive radius degenerates to the polygonal parts of the
/// input; points and lines vanish.
#[must_use]
pub fn buffer_geometry(geometry: &Geometry<f64>, radius_m: f64) -> MultiPolygon<f64> {
    let mut pieces: Vec<Polygon<f64>> = Vec::new();
    let mut polygons = Vec::new();
    region::collect_polygons(geometry, &mut polygons);

    if radius_m <= 0.0 {
        log::warn!("non-positive buffer radius {radius_m}; returning polygonal parts unchanged");
        return ops::union_all(polygons);
    }

    let mut points: Vec<Point<f64>> = Vec::new();
    region::collect_points(geometry, &mut points);
    for point in points {
        pieces.push(circle(point.0, radius_m));
    }

    let mut lines: Vec<LineString<f64>> = Vec::new();
    region::collect_lines(geometry, &mut lines);
    for line in &lines {
        buffer_line(line, radius_m, &mut pieces);
    }

    // Outward polygon buffer: the polygon itself plus stroked rings.
    for polygon in polygons {
        buffer_line(polygon.exterior(), radius_m, &mut pieces);
        for interior in polygon.interiors() {
            buffer_line(interior, radius_m, &mut pieces);
        }
        pieces.push(polygon);
    }

    ops::union_all(pieces)
}

fn buffer_line(line: &LineString<f64>, radius_m: f64, out: &mut Vec<Polygon<f64>>) {
    for coord in line.coords() {
        out.push(circle(*coord, radius_m));
    }
    for segment in line.lines() {
        if let Some(corridor) = segment_corridor(segment.start, segment.end, radius_m) {
            out.push(corridor);
        }
    }
}

/// A closed ring approximating the circle of `radius` around `center`.
pub(crate) fn circle(center: Coord<f64>, radius: f64) -> Polygon<f64> {
    #[allow(clippy::cast_precision_loss)]
    let ring: Vec<Coord<f64>> = (0..=CIRCLE_SEGMENTS)
        .map(|i| {
            let theta = TAU * ((i % CIRCLE_SEGMENTS) as f64) / (CIRCLE_SEGMENTS as f64);
            Coord {
                x: center.x + radius * theta.cos(),
                y: center.y + radius * theta.sin(),
            }
        })
        .collect();
    Polygon::new(LineString::new(ring), Vec::new())
}

/// The rectangle swept by a disc of `radius` travelling from `a` to `b`,
/// without the end caps (vertex circles supply those).
fn segment_corridor(a: Coord<f64>, b: Coord<f64>, radius: f64) -> Option<Polygon<f64>> {
    let length = (b.x - a.x).hypot(b.y - a.y);
    if length == 0.0 {
        return None;
    }
    let nx = -(b.y - a.y) / length * radius;
    let ny = (b.x - a.x) / length * radius;
    let ring = vec![
        Coord {
            x: a.x + nx,
            y: a.y + ny,
        },
        Coord {
            x: b.x + nx,
            y: b.y + ny,
        },
        Coord {
            x: b.x - nx,
            y: b.y - ny,
        },
        Coord {
            x: a.x - nx,
            y: a.y - ny,
        },
        Coord {
            x: a.x + nx,
            y: a.y + ny,
        },
    ];
    Some(Polygon::new(LineString::new(ring), Vec::new()))
}
