//! The [`Region`] value type: a geometry tagged with its coordinate frame.

use geo::{
    Area, BoundingRect, ConvexHull, CoordsIter, Geometry, LineString, MapCoords, MultiLineString,
    MultiPoint, MultiPolygon, Point, Polygon,
};

use crate::{Crs, GeometryError, buffer, crs, measure, ops};

/// An immutable polygon, multi-polygon, or mixed geometry with an
/// explicit coordinate reference system.
///
/// Isochrones, point buffers, daily convex hulls, and overlay results are
/// all regions. Two regions may only be combined once they share a frame;
/// [`crate::overlay`] reprojects automatically where a WGS84 to UTM
/// projection suffices and fails with [`GeometryError::CrsMismatch`]
/// otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    geometry: Geometry<f64>,
    crs: Crs,
}

impl Region {
    /// Wraps a geometry with its frame tag.
    #[must_use]
    pub const fn new(geometry: Geometry<f64>, crs: Crs) -> Self {
        Self { geometry, crs }
    }

    /// An empty region in the given frame.
    #[must_use]
    pub fn empty(crs: Crs) -> Self {
        Self::new(Geometry::MultiPolygon(MultiPolygon::new(Vec::new())), crs)
    }

    /// The wrapped geometry.
    #[must_use]
    pub const fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    /// The coordinate frame this region's coordinates are expressed in.
    #[must_use]
    pub const fn crs(&self) -> Crs {
        self.crs
    }

    /// Whether the region carries no coordinates at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.geometry.coords_count() == 0
    }

    /// Unsigned area in square frame units (m² in a UTM frame).
    ///
    /// Points and lines contribute nothing, so non-polygonal overlay
    /// results naturally measure zero.
    #[must_use]
    pub fn area_m2(&self) -> f64 {
        self.geometry.unsigned_area()
    }

    /// Total perimeter of the polygonal parts, exterior and interior
    /// rings included, in frame units.
    #[must_use]
    pub fn perimeter_m(&self) -> f64 {
        self.polygons()
            .iter()
            .map(|polygon| {
                measure::ring_length(polygon.exterior())
                    + polygon
                        .interiors()
                        .iter()
                        .map(measure::ring_length)
                        .sum::<f64>()
            })
            .sum()
    }

    /// The polygonal parts of this region, flattened out of any nesting.
    #[must_use]
    pub fn polygons(&self) -> MultiPolygon<f64> {
        let mut out = Vec::new();
        collect_polygons(&self.geometry, &mut out);
        MultiPolygon::new(out)
    }

    /// The point parts of this region, flattened out of any nesting.
    #[must_use]
    pub fn points(&self) -> MultiPoint<f64> {
        let mut out = Vec::new();
        collect_points(&self.geometry, &mut out);
        MultiPoint::new(out)
    }

    /// The linear parts of this region, flattened out of any nesting.
    #[must_use]
    pub fn lines(&self) -> MultiLineString<f64> {
        let mut out = Vec::new();
        collect_lines(&self.geometry, &mut out);
        MultiLineString::new(out)
    }

    /// Reprojects into the given frame.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::CrsMismatch`] unless the request is an
    /// identity projection or a WGS84 to UTM forward projection.
    pub fn to_crs(&self, to: Crs) -> Result<Self, GeometryError> {
        if self.crs == to {
            return Ok(self.clone());
        }
        let (Crs::Wgs84, Crs::Utm { zone, north }) = (self.crs, to) else {
            return Err(GeometryError::CrsMismatch { from: self.crs, to });
        };
        let projected = self
            .geometry
            .map_coords(|coord| crs::wgs84_to_utm(coord, zone, north));
        Ok(Self::new(projected, to))
    }

    /// Reprojects a geographic region into its auto-detected UTM zone.
    /// Already-metric regions pass through unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::EmptyRegion`] when no coordinates exist
    /// to derive a zone from.
    pub fn to_metric(&self) -> Result<Self, GeometryError> {
        if self.crs.is_metric() {
            return Ok(self.clone());
        }
        let rect = self
            .geometry
            .bounding_rect()
            .ok_or(GeometryError::EmptyRegion)?;
        let center = rect.center();
        self.to_crs(Crs::utm_for(center.x, center.y))
    }

    /// Buffers every part of this region by `radius_m` metres and unions
    /// the result into a single polygonal region.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NotMetric`] when called in a geographic
    /// frame; buffer radii are metre distances.
    pub fn buffer(&self, radius_m: f64) -> Result<Self, GeometryError> {
        if !self.crs.is_metric() {
            return Err(GeometryError::NotMetric(self.crs));
        }
        Ok(Self::new(
            Geometry::MultiPolygon(buffer::buffer_geometry(&self.geometry, radius_m)),
            self.crs,
        ))
    }

    /// Unions the polygonal parts of this region into one dissolved
    /// multi-polygon, removing any self-overlap. Non-polygonal parts are
    /// discarded.
    #[must_use]
    pub fn dissolved(&self) -> Self {
        Self::new(
            Geometry::MultiPolygon(ops::union_all(self.polygons().0)),
            self.crs,
        )
    }

    /// The convex hull of every coordinate in this region.
    #[must_use]
    pub fn convex_hull(&self) -> Self {
        let points: Vec<Point<f64>> = self.geometry.coords_iter().map(Point::from).collect();
        Self::new(
            Geometry::Polygon(MultiPoint::new(points).convex_hull()),
            self.crs,
        )
    }

    /// Replaces each polygonal part by the fill of its exterior ring,
    /// removing interior holes so the region reads as solid.
    #[must_use]
    pub fn filled(&self) -> Self {
        let filled: Vec<Polygon<f64>> = self
            .polygons()
            .into_iter()
            .map(|polygon| Polygon::new(polygon.exterior().clone(), Vec::new()))
            .collect();
        Self::new(Geometry::MultiPolygon(MultiPolygon::new(filled)), self.crs)
    }

    /// Gathers several regions into one collection region.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::CrsMismatch`] if any region is not
    /// already expressed in `crs`.
    pub fn collection(regions: &[Self], crs: Crs) -> Result<Self, GeometryError> {
        let mut parts = Vec::with_capacity(regions.len());
        for region in regions {
            if region.crs != crs {
                return Err(GeometryError::CrsMismatch {
                    from: region.crs,
                    to: crs,
                });
            }
            parts.push(region.geometry.clone());
        }
        Ok(Self::new(
            Geometry::GeometryCollection(geo::GeometryCollection(parts)),
            crs,
        ))
    }
}

pub(crate) fn collect_polygons(geometry: &Geometry<f64>, out: &mut Vec<Polygon<f64>>) {
    match geometry {
        Geometry::Polygon(polygon) => out.push(polygon.clone()),
        Geometry::MultiPolygon(multi) => out.extend(multi.iter().cloned()),
        Geometry::Rect(rect) => out.push(rect.to_polygon()),
        Geometry::Triangle(triangle) => out.push(triangle.to_polygon()),
        Geometry::GeometryCollection(collection) => {
            for inner in collection {
                collect_polygons(inner, out);
            }
        }
        _ => {}
    }
}

pub(crate) fn collect_points(geometry: &Geometry<f64>, out: &mut Vec<Point<f64>>) {
    match geometry {
        Geometry::Point(point) => out.push(*point),
        Geometry::MultiPoint(multi) => out.extend(multi.iter().copied()),
        Geometry::GeometryCollection(collection) => {
            for inner in collection {
                collect_points(inner, out);
            }
        }
        _ => {}
    }
}

pub(crate) fn collect_lines(geometry: &Geometry<f64>, out: &mut Vec<LineString<f64>>) {
    match geometry {
        Geometry::Line(line) => out.push(LineString::new(vec![line.start, line.end])),
        Geometry::LineString(line) => out.push(line.clone()),
        Geometry::MultiLineString(multi) => out.extend(multi.iter().cloned()),
        Geometry::GeometryCollection(collection) => {
            for inner in collection {
                collect_lines(inner, out);
            }
        }
        _ => {}
    }
}
