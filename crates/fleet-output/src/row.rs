//! Plain data row types written by output backends.

use fleet_core::{RouteId, RouteStatus};
use fleet_mobility::Observation;

/// One entity's published state at a given tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationRow {
    pub tick:        u64,
    pub entity_id:   RouteId,
    pub lon:         f64,
    pub lat:         f64,
    pub heading:     f64,
    pub status_code: i32,
}

impl ObservationRow {
    pub fn new(tick: u64, obs: &Observation) -> Self {
        Self {
            tick,
            entity_id:   obs.entity_id,
            lon:         obs.position.lon,
            lat:         obs.position.lat,
            heading:     obs.heading,
            status_code: obs.status_code(),
        }
    }
}

/// Fleet composition after one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSummaryRow {
    pub tick:           u64,
    /// Simulated seconds covered once this tick has run.
    pub elapsed_secs:   f64,
    pub en_route:       u64,
    pub returning:      u64,
    pub at_destination: u64,
    pub complete:       u64,
}

impl TickSummaryRow {
    /// Count statuses across one tick's observations.
    pub fn from_observations(tick: u64, elapsed_secs: f64, observations: &[Observation]) -> Self {
        let mut row = Self {
            tick,
            elapsed_secs,
            en_route:       0,
            returning:      0,
            at_destination: 0,
            complete:       0,
        };
        for obs in observations {
            match obs.status {
                RouteStatus::EnRoute       => row.en_route += 1,
                RouteStatus::Returning     => row.returning += 1,
                RouteStatus::AtDestination => row.at_destination += 1,
                RouteStatus::Complete      => row.complete += 1,
            }
        }
        row
    }

    pub fn total(&self) -> u64 {
        self.en_route + self.returning + self.at_destination + self.complete
    }
}

/// An entity removed from the fleet, with the tick it was last published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetirementRow {
    pub tick:      u64,
    pub entity_id: RouteId,
}
