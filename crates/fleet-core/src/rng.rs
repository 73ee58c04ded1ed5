//! Deterministic simulation-level RNG.
//!
//! The fleet manager owns one `SimRng` and only touches it while holding the
//! tick guard, so a given seed reproduces the same route ids and
//! destinations for the same sequence of routing outcomes.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Simulation-level RNG for ids, destinations, and fast-forward offsets.
///
/// Used only in single-threaded or explicitly synchronised contexts.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Expose the inner `SmallRng` for use with `rand` distribution types.
    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    /// Uniform `f64` in `[lo, hi]`.  Returns `lo` when the interval is empty
    /// or degenerate instead of panicking like `gen_range` would.
    #[inline]
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if lo.is_nan() || hi.is_nan() || hi <= lo {
            return lo;
        }
        self.0.gen_range(lo..=hi)
    }
}
