//! Simulation time model.
//!
//! # Design
//!
//! A tick is one simulation step.  Two clocks are involved and they are
//! deliberately independent:
//!
//! - **Simulated step** — `SimConfig::tick_step_secs` simulated seconds are
//!   applied to every route per tick (default 1 s).
//! - **Wall-clock cadence** — the scheduler fires every
//!   `1000 / speed_factor` milliseconds.
//!
//! Changing the speed factor changes how often ticks fire, never how far a
//! single tick moves a vehicle.  Skipped ticks are dropped, not caught up, so
//! simulated time only advances on ticks that actually ran.

use std::fmt;
use std::time::Duration;

use crate::{CoreError, CoreResult};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0.saturating_add(n))
    }

    /// Ticks elapsed from `earlier` to `self` (zero if `earlier` is later).
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Counts ticks that actually ran and converts them to simulated seconds.
#[derive(Clone, Debug)]
pub struct SimClock {
    /// Simulated seconds applied per tick.
    pub step_secs: f64,
    /// The next tick to run — advanced by `SimClock::advance()`.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(step_secs: f64) -> Self {
        Self { step_secs, current_tick: Tick::ZERO }
    }

    /// Advance the clock by one tick and return the tick that just ran.
    #[inline]
    pub fn advance(&mut self) -> Tick {
        let ran = self.current_tick;
        self.current_tick = ran.offset(1);
        ran
    }

    /// Simulated seconds covered by the ticks run so far.
    #[inline]
    pub fn elapsed_secs(&self) -> f64 {
        self.current_tick.0 as f64 * self.step_secs
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.1} s simulated)", self.current_tick, self.elapsed_secs())
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
///
/// Typically loaded from a JSON file by the application crate; missing
/// fields take their [`Default`] values.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Wall-clock speed multiplier.  The timer fires every
    /// `1000 / speed_factor` ms.  Must be positive.
    pub speed_factor: f64,

    /// Simulated seconds applied to every route per tick.
    pub tick_step_secs: f64,

    /// Delay before the first timer tick after a start or a speed change.
    pub start_delay_ms: u64,

    /// Trucks dispatched from each warehouse when the fleet is built.
    pub trucks_per_warehouse: usize,

    /// Pre-apply a uniform random share of each initial route's duration so
    /// the fleet does not start bunched at the warehouses.
    pub fast_forward: bool,

    /// Seed for the fleet RNG.
    pub seed: u64,

    /// Maximum solve attempts for a replacement route before the truck is
    /// abandoned.
    pub max_dispatch_attempts: u32,

    /// Ticks to wait before retrying a failed routing request.
    pub retry_delay_ticks: u64,

    /// Largest allowed gap, in metres, between a route's current end point
    /// and the start of a path handed to `reset_path`.
    pub path_join_tolerance_m: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            speed_factor:          5.0,
            tick_step_secs:        1.0,
            start_delay_ms:        100,
            trucks_per_warehouse:  2,
            fast_forward:          true,
            seed:                  42,
            max_dispatch_attempts: 5,
            retry_delay_ticks:     1,
            path_join_tolerance_m: 25.0,
        }
    }
}

impl SimConfig {
    /// Wall-clock interval between ticks for `speed_factor`.
    pub fn interval(&self) -> Duration {
        interval_for_speed(self.speed_factor)
    }

    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }

    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.tick_step_secs)
    }

    /// Reject values the scheduler cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        validate_speed(self.speed_factor)?;
        if !(self.tick_step_secs.is_finite() && self.tick_step_secs > 0.0) {
            return Err(CoreError::Config(format!(
                "tick_step_secs must be positive, got {}",
                self.tick_step_secs
            )));
        }
        if !(self.path_join_tolerance_m.is_finite() && self.path_join_tolerance_m >= 0.0) {
            return Err(CoreError::Config(format!(
                "path_join_tolerance_m must be non-negative, got {}",
                self.path_join_tolerance_m
            )));
        }
        if self.max_dispatch_attempts == 0 {
            return Err(CoreError::Config("max_dispatch_attempts must be at least 1".into()));
        }
        Ok(())
    }
}

/// Check a speed factor: positive, finite, non-zero.
pub fn validate_speed(speed_factor: f64) -> CoreResult<()> {
    if speed_factor.is_finite() && speed_factor > 0.0 {
        Ok(())
    } else {
        Err(CoreError::Config(format!(
            "speed_factor must be positive and finite, got {speed_factor}"
        )))
    }
}

/// Longest wall-clock gap between ticks, reached by very small speed factors.
pub const MAX_TICK_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// `1000 / speed_factor` milliseconds, clamped to `[1 ms, MAX_TICK_INTERVAL]`.
pub fn interval_for_speed(speed_factor: f64) -> Duration {
    let max_ms = MAX_TICK_INTERVAL.as_millis() as f64;
    let ms = (1000.0 / speed_factor).clamp(1.0, max_ms);
    Duration::try_from_secs_f64(ms / 1000.0).unwrap_or(MAX_TICK_INTERVAL)
}
