//! Coordinate types and reprojection to geographic WGS84.
//!
//! All geometry is computed in the working projected coordinate system
//! (Florida East, NAD83/GRS80, transverse Mercator, US survey feet) and
//! reprojected to geographic longitude/latitude only at emission time.
//! Working in a single projected system keeps the subdivision algebra a
//! matter of plain linear interpolation.
//!
//! The inverse transverse Mercator conversion uses the standard series
//! expansion (footprint latitude plus correction terms) on the GRS80
//! ellipsoid.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// EPSG code of the working projected coordinate system.
pub const WORKING_CRS: &str = "EPSG:2236";
/// EPSG code of the public geographic coordinate system.
pub const PUBLIC_CRS: &str = "EPSG:4326";

// GRS80 ellipsoid.
const SEMI_MAJOR_M: f64 = 6_378_137.0;
const FLATTENING: f64 = 1.0 / 298.257_222_101;

// Florida East zone parameters. The false easting is in meters; grid
// coordinates are in US survey feet.
const LAT_ORIGIN_DEG: f64 = 24.333_333_333_333_33; // 24 deg 20 min
const LON_ORIGIN_DEG: f64 = -81.0;
const SCALE_FACTOR: f64 = 0.999_941_177;
const FALSE_EASTING_M: f64 = 200_000.000_101_600_2;

/// Meters per US survey foot.
const US_FOOT_M: f64 = 1_200.0 / 3_937.0;

/// Point in the working projected coordinate system, in US survey feet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    /// Easting in feet.
    pub x: f64,
    /// Northing in feet.
    pub y: f64,
}

impl ProjectedPoint {
    /// Create a point from easting/northing in feet.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point, in feet.
    pub fn distance(self, other: Self) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Point in the public geographic coordinate system, in degrees.
///
/// Longitude-first, matching the coordinate order GeoJSON consumes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Longitude in degrees.
    pub lon: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

impl GeoPoint {
    /// Coordinate pair in GeoJSON position order.
    pub fn position(self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

/// Meridional arc length from the equator to latitude `phi` (radians),
/// in meters.
fn meridional_arc(phi: f64) -> f64 {
    let e2 = FLATTENING * (2.0 - FLATTENING);
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    SEMI_MAJOR_M
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

/// Reproject a working-grid point to geographic WGS84.
///
/// NAD83 and WGS84 are treated as coincident, the same zero-shift
/// assumption the zone definition carries.
pub fn to_wgs84(point: ProjectedPoint) -> GeoPoint {
    let e2 = FLATTENING * (2.0 - FLATTENING);
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let ep2 = e2 / (1.0 - e2);

    // Grid feet to meters relative to the projection origin.
    let x = point.x * US_FOOT_M - FALSE_EASTING_M;
    let y = point.y * US_FOOT_M;

    let lat0 = LAT_ORIGIN_DEG.to_radians();
    let m0 = meridional_arc(lat0);
    let m = m0 + y / SCALE_FACTOR;

    // Footprint latitude.
    let mu = m / (SEMI_MAJOR_M * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));
    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());
    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let sin1 = phi1.sin();
    let cos1 = phi1.cos();
    let tan1 = phi1.tan();

    let c1 = ep2 * cos1 * cos1;
    let t1 = tan1 * tan1;
    let n1 = SEMI_MAJOR_M / (1.0 - e2 * sin1 * sin1).sqrt();
    let r1 = SEMI_MAJOR_M * (1.0 - e2) / (1.0 - e2 * sin1 * sin1).powf(1.5);
    let d = x / (n1 * SCALE_FACTOR);

    let lat = phi1
        - (n1 * tan1 / r1)
            * (d.powi(2) / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                    - 252.0 * ep2
                    - 3.0 * c1 * c1)
                    * d.powi(6)
                    / 720.0);

    let lon = LON_ORIGIN_DEG.to_radians()
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                * d.powi(5)
                / 120.0)
            / cos1;

    GeoPoint {
        lon: lon.to_degrees(),
        lat: lat.to_degrees(),
    }
}

/// Reproject a flagged point sequence, preserving the flags.
pub fn reproject(points: &[(ProjectedPoint, bool)]) -> Vec<(GeoPoint, bool)> {
    points
        .iter()
        .map(|&(point, interpolated)| (to_wgs84(point), interpolated))
        .collect()
}

/// Normalize an angle in radians into `[0, 2*pi)`.
pub fn wrap_angle(angle: f64) -> f64 {
    let full = 2.0 * PI;
    angle.rem_euclid(full)
}
