//! Geographic coordinate type and spatial utilities.
//!
//! `Position` is the single display reference for everything the simulator
//! publishes: WGS-84 longitude/latitude in double precision.  Inputs given
//! in other references are converted once, at load time, by
//! [`projection`](crate::projection).

use ::geo::{Bearing, Distance, Geodesic, Haversine, Point};

/// Displacements below this many metres count as "did not move" for heading
/// purposes.
pub const STATIONARY_EPSILON_M: f64 = 1e-6;

/// A WGS-84 geographic coordinate.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub lon: f64,
    pub lat: f64,
}

impl Position {
    #[inline]
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// `geo` point with x = longitude, y = latitude.
    #[inline]
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }

    /// Haversine great-circle distance in metres.
    pub fn distance_m(self, other: Position) -> f64 {
        Haversine::distance(self.to_point(), other.to_point())
    }

    /// Linear interpolation in lon/lat space.  Adequate between adjacent
    /// vertices of a street-level polyline.
    #[inline]
    pub fn lerp(self, other: Position, t: f64) -> Position {
        Position {
            lon: self.lon + (other.lon - self.lon) * t,
            lat: self.lat + (other.lat - self.lat) * t,
        }
    }

    pub fn is_finite(self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }
}

impl From<Point<f64>> for Position {
    fn from(p: Point<f64>) -> Self {
        Position::new(p.x(), p.y())
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lon, self.lat)
    }
}

/// Heading of travel from `previous` to `current`, in degrees `[0, 360)`.
///
/// Computed as the geodesic azimuth from `current` back to `previous`, minus
/// 180°.  Returns `None` when the two positions coincide, so callers can keep
/// their last heading instead of publishing an undefined one.
pub fn travel_heading(previous: Position, current: Position) -> Option<f64> {
    if previous.distance_m(current) < STATIONARY_EPSILON_M {
        return None;
    }
    let back = Geodesic::bearing(current.to_point(), previous.to_point());
    Some((back - 180.0).rem_euclid(360.0))
}
