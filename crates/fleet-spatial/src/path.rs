//! Precomputed route path geometry.
//!
//! A `PathGeometry` is an immutable polyline in WGS-84 with cumulative
//! haversine distances cached per vertex, so `point_at_distance` is a binary
//! search plus one interpolation.

use fleet_core::Position;

use crate::{SpatialError, SpatialResult};

/// An ordered, single-part polyline with cached cumulative lengths.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathGeometry {
    vertices:   Vec<Position>,
    /// `cumulative_m[i]` = distance from the first vertex to vertex `i`.
    /// Same length as `vertices`; `cumulative_m[0] == 0`.
    cumulative_m: Vec<f64>,
}

impl PathGeometry {
    /// Build a path from its vertices.
    ///
    /// A single vertex is accepted and yields a zero-length path; callers
    /// that need movement check [`is_degenerate`](Self::is_degenerate).
    ///
    /// # Errors
    ///
    /// `EmptyPath` for no vertices, `NonFiniteVertex` for NaN/∞ coordinates.
    pub fn new(vertices: Vec<Position>) -> SpatialResult<Self> {
        if vertices.is_empty() {
            return Err(SpatialError::EmptyPath);
        }
        if let Some(index) = vertices.iter().position(|v| !v.is_finite()) {
            return Err(SpatialError::NonFiniteVertex { index });
        }

        let mut cumulative_m = Vec::with_capacity(vertices.len());
        let mut total = 0.0;
        cumulative_m.push(0.0);
        for pair in vertices.windows(2) {
            total += pair[0].distance_m(pair[1]);
            cumulative_m.push(total);
        }

        Ok(Self { vertices, cumulative_m })
    }

    /// Total length in metres.
    #[inline]
    pub fn length(&self) -> f64 {
        // Never empty: enforced by `new`.
        self.cumulative_m.last().copied().unwrap_or(0.0)
    }

    /// `true` if the path covers no distance.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.length() <= 0.0
    }

    #[inline]
    pub fn start(&self) -> Position {
        self.vertices[0]
    }

    #[inline]
    pub fn end(&self) -> Position {
        self.vertices[self.vertices.len() - 1]
    }

    pub fn vertices(&self) -> &[Position] {
        &self.vertices
    }

    /// The point reached after travelling `distance_m` metres from the start.
    ///
    /// Clamped: negative distances give the start, distances at or beyond
    /// [`length`](Self::length) give the final vertex exactly.
    pub fn point_at_distance(&self, distance_m: f64) -> Position {
        if distance_m.is_nan() || distance_m <= 0.0 {
            return self.start();
        }
        if distance_m >= self.length() {
            return self.end();
        }

        // First vertex strictly beyond `distance_m`; never 0 (cumulative[0] = 0
        // < distance) and never len (distance < length).
        let hi = self.cumulative_m.partition_point(|&c| c <= distance_m);
        let lo = hi - 1;
        let seg_len = self.cumulative_m[hi] - self.cumulative_m[lo];
        if seg_len <= 0.0 {
            return self.vertices[hi];
        }
        let t = (distance_m - self.cumulative_m[lo]) / seg_len;
        self.vertices[lo].lerp(self.vertices[hi], t)
    }
}
