//! Conversion from input coordinate references to the display reference.
//!
//! Routing networks and extents are often published in Web Mercator
//! (EPSG:3857) while observers expect WGS-84 lon/lat.  Conversion happens
//! once at load time; nothing downstream of the loaders sees planar metres.

use crate::Position;

/// WGS-84 semi-major axis, metres (the Web Mercator sphere radius).
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Web Mercator latitude limit, degrees.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

/// Coordinate reference of raw `(x, y)` input pairs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpatialReference {
    /// Geographic lon/lat degrees (EPSG:4326).  `x` = longitude.
    #[default]
    Wgs84,
    /// Spherical Web Mercator metres (EPSG:3857).
    WebMercator,
}

impl SpatialReference {
    /// Convert a raw `(x, y)` pair in this reference to a WGS-84 `Position`.
    pub fn to_wgs84(self, x: f64, y: f64) -> Position {
        match self {
            SpatialReference::Wgs84 => Position::new(x, y),
            SpatialReference::WebMercator => web_mercator_to_wgs84(x, y),
        }
    }

    /// Convert a WGS-84 `Position` to a raw `(x, y)` pair in this reference.
    pub fn from_wgs84(self, pos: Position) -> (f64, f64) {
        match self {
            SpatialReference::Wgs84 => (pos.lon, pos.lat),
            SpatialReference::WebMercator => wgs84_to_web_mercator(pos),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SpatialReference::Wgs84       => "wgs84",
            SpatialReference::WebMercator => "web_mercator",
        }
    }
}

impl std::str::FromStr for SpatialReference {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wgs84" | "4326" | "epsg:4326" => Ok(SpatialReference::Wgs84),
            "web_mercator" | "webmercator" | "3857" | "epsg:3857" => {
                Ok(SpatialReference::WebMercator)
            }
            other => Err(crate::CoreError::Parse(format!(
                "unknown spatial reference {other:?}: expected \"wgs84\" or \"web_mercator\""
            ))),
        }
    }
}

impl std::fmt::Display for SpatialReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inverse spherical Mercator.
pub fn web_mercator_to_wgs84(x: f64, y: f64) -> Position {
    let lon = (x / EARTH_RADIUS_M).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    Position::new(lon, lat)
}

/// Forward spherical Mercator.  Latitude is clamped to the projection's
/// valid range.
pub fn wgs84_to_web_mercator(pos: Position) -> (f64, f64) {
    let lat = pos.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let x = pos.lon.to_radians() * EARTH_RADIUS_M;
    let y = (std::f64::consts::FRAC_PI_4 + lat * 0.5).tan().ln() * EARTH_RADIUS_M;
    (x, y)
}
