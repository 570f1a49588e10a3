//! Coordinate reference systems and the WGS84 to UTM forward projection.
//!
//! The projection is the standard transverse Mercator series expansion on
//! the WGS84 ellipsoid. Only the forward direction (geographic to metric)
//! is implemented; nothing in the pipeline needs to leave the metric
//! frame once it is in one.

use std::fmt;

use geo::{Coord, LineString, Point};
use serde::{Deserialize, Serialize};

use crate::GeometryError;

/// WGS84 semi-major axis in metres.
const WGS84_A: f64 = 6_378_137.0;

/// WGS84 first eccentricity.
const WGS84_E: f64 = 0.081_819_190_842_621_49;

/// UTM central meridian scale factor.
const UTM_K0: f64 = 0.9996;

/// UTM false easting in metres.
const UTM_FALSE_EASTING: f64 = 500_000.0;

/// UTM false northing applied in the southern hemisphere.
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// A coordinate reference system tag carried by every [`crate::Region`].
///
/// Geographic coordinates are stored as (longitude, latitude) in
/// [`Crs::Wgs84`]; projected coordinates are metre-unit UTM eastings and
/// northings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Crs {
    /// Geographic lon/lat on the WGS84 ellipsoid (EPSG:4326).
    Wgs84,
    /// A projected UTM zone in metres (EPSG:326xx north, 327xx south).
    Utm {
        /// UTM zone number, 1 through 60.
        zone: u8,
        /// `true` for the northern hemisphere.
        north: bool,
    },
}

impl Crs {
    /// Picks the UTM zone containing the given geographic position.
    #[must_use]
    pub fn utm_for(lon: f64, lat: f64) -> Self {
        let index = ((lon + 180.0) / 6.0).floor();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let zone = (index.clamp(0.0, 59.0) as u8) + 1;
        Self::Utm {
            zone,
            north: lat >= 0.0,
        }
    }

    /// The EPSG code for this frame.
    #[must_use]
    pub const fn epsg(self) -> u32 {
        match self {
            Self::Wgs84 => 4326,
            Self::Utm { zone, north: true } => 32600 + zone as u32,
            Self::Utm { zone, north: false } => 32700 + zone as u32,
        }
    }

    /// Whether coordinates in this frame are metre units.
    #[must_use]
    pub const fn is_metric(self) -> bool {
        matches!(self, Self::Utm { .. })
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// Projects a single coordinate between frames.
///
/// # Errors
///
/// Returns [`GeometryError::CrsMismatch`] for anything other than an
/// identity projection or WGS84 to UTM.
pub fn project_coord(coord: Coord<f64>, from: Crs, to: Crs) -> Result<Coord<f64>, GeometryError> {
    if from == to {
        return Ok(coord);
    }
    match (from, to) {
        (Crs::Wgs84, Crs::Utm { zone, north }) => Ok(wgs84_to_utm(coord, zone, north)),
        _ => Err(GeometryError::CrsMismatch { from, to }),
    }
}

/// Projects a point between frames.
///
/// # Errors
///
/// Returns [`GeometryError::CrsMismatch`] when the frames cannot be
/// reconciled.
pub fn project_point(point: Point<f64>, from: Crs, to: Crs) -> Result<Point<f64>, GeometryError> {
    project_coord(point.0, from, to).map(Point)
}

/// Projects a line string between frames.
///
/// # Errors
///
/// Returns [`GeometryError::CrsMismatch`] when the frames cannot be
/// reconciled.
pub fn project_line(
    line: &LineString<f64>,
    from: Crs,
    to: Crs,
) -> Result<LineString<f64>, GeometryError> {
    if from == to {
        return Ok(line.clone());
    }
    let (Crs::Wgs84, Crs::Utm { zone, north }) = (from, to) else {
        return Err(GeometryError::CrsMismatch { from, to });
    };
    Ok(LineString::new(
        line.coords()
            .map(|coord| wgs84_to_utm(*coord, zone, north))
            .collect(),
    ))
}

/// Forward transverse Mercator projection of a (lon, lat) coordinate
/// into the given UTM zone.
pub(crate) fn wgs84_to_utm(coord: Coord<f64>, zone: u8, north: bool) -> Coord<f64> {
    let central_meridian = (f64::from(zone) - 1.0) * 6.0 - 180.0 + 3.0;
    let phi = coord.y.to_radians();
    let dlam = (coord.x - central_meridian).to_radians();

    let e2 = WGS84_E * WGS84_E;
    let ep2 = e2 / (1.0 - e2);
    let sin_phi = phi.sin();
    let cos_phi = phi.cos();
    let tan_phi = phi.tan();

    let n = WGS84_A / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let t = tan_phi * tan_phi;
    let c = ep2 * cos_phi * cos_phi;
    let a = cos_phi * dlam;

    // Meridional arc length from the equator to phi.
    let m = WGS84_A
        * ((1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2.powi(3) / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e2 * e2 / 32.0 + 45.0 * e2.powi(3) / 1024.0)
                * (2.0 * phi).sin()
            + (15.0 * e2 * e2 / 256.0 + 45.0 * e2.powi(3) / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e2.powi(3) / 3072.0) * (6.0 * phi).sin());

    let easting = UTM_FALSE_EASTING
        + UTM_K0
            * n
            * (a + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0);

    let mut northing = UTM_K0
        * (m + n
            * tan_phi
            * (a * a / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6) / 720.0));
    if !north {
        northing += UTM_FALSE_NORTHING_SOUTH;
    }

    Coord {
        x: easting,
        y: northing,
    }
}
