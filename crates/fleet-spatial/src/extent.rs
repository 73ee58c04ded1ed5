//! Rectangular sampling extent for random destinations.

use fleet_core::{Position, SimRng, SpatialReference};

use crate::{SpatialError, SpatialResult};

/// An axis-aligned rectangle `(min_x, min_y, max_x, max_y)` in a declared
/// coordinate reference.
///
/// Destinations are sampled in the extent's own reference (independent
/// uniform x and y) and then projected to WGS-84.  No attempt is made to
/// keep samples on the road network; the solver either routes there or
/// fails that request.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Extent {
    pub min_x:     f64,
    pub min_y:     f64,
    pub max_x:     f64,
    pub max_y:     f64,
    pub reference: SpatialReference,
}

impl Extent {
    /// # Errors
    ///
    /// `InvalidExtent` if any bound is non-finite or `min > max` on either axis.
    pub fn new(
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
        reference: SpatialReference,
    ) -> SpatialResult<Self> {
        let finite = [min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite());
        if !finite || min_x > max_x || min_y > max_y {
            return Err(SpatialError::InvalidExtent(format!(
                "[{min_x}, {min_y}, {max_x}, {max_y}] in {reference}"
            )));
        }
        Ok(Self { min_x, min_y, max_x, max_y, reference })
    }

    /// `true` if the raw `(x, y)` pair lies inside the extent (inclusive).
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    /// Sample a raw `(x, y)` pair uniformly in the extent's own reference.
    pub fn sample_xy(&self, rng: &mut SimRng) -> (f64, f64) {
        (rng.uniform(self.min_x, self.max_x), rng.uniform(self.min_y, self.max_y))
    }

    /// Sample a destination uniformly and convert it to WGS-84.
    pub fn sample(&self, rng: &mut SimRng) -> Position {
        let (x, y) = self.sample_xy(rng);
        self.reference.to_wgs84(x, y)
    }
}
