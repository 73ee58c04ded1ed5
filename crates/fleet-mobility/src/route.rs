//! `ActiveRoute` — one vehicle's progress along its current leg.

use fleet_core::geo::travel_heading;
use fleet_core::{Position, RouteId, RouteStatus, WarehouseId};
use fleet_spatial::{PathGeometry, SolvedRoute};

use crate::{InvalidPathReason, MobilityError, MobilityResult, Observation};

/// A vehicle travelling a precomputed path.
///
/// Plain owned state with two explicit transitions, [`advance`](Self::advance)
/// and [`reset_path`](Self::reset_path).  Nothing is notified; the caller
/// reads the updated state and decides what to publish.
///
/// # Invariants
///
/// - `seconds_traveled >= 0`.
/// - Within one path assignment the status only moves forward; it changes
///   leg only through `reset_path`.
#[derive(Debug, Clone)]
pub struct ActiveRoute {
    id:               RouteId,
    warehouse:        WarehouseId,
    path:             PathGeometry,
    speed_mps:        f64,
    seconds_traveled: f64,
    last_position:    Position,
    heading:          f64,
    status:           RouteStatus,
}

impl ActiveRoute {
    /// Start a new outbound leg along `path` at `speed_mps`.
    ///
    /// # Errors
    ///
    /// `InvalidPath` if the path has zero length or the speed is not a
    /// positive finite number.
    pub fn new(
        id:        RouteId,
        warehouse: WarehouseId,
        path:      PathGeometry,
        speed_mps: f64,
    ) -> MobilityResult<Self> {
        check_path(id, &path, speed_mps)?;
        Ok(Self {
            id,
            warehouse,
            last_position: path.start(),
            path,
            speed_mps,
            seconds_traveled: 0.0,
            heading: 0.0,
            status: RouteStatus::EnRoute,
        })
    }

    /// Start a new outbound leg from a solver result.
    pub fn from_solved(id: RouteId, warehouse: WarehouseId, route: SolvedRoute) -> MobilityResult<Self> {
        let speed = route.speed_mps().unwrap_or(0.0);
        Self::new(id, warehouse, route.path, speed)
    }

    // ── Transitions ───────────────────────────────────────────────────────

    /// Advance by `elapsed_secs` simulated seconds and return the new position.
    ///
    /// Moving states accumulate time; reaching the end of the path moves
    /// EnRoute → AtDestination and Returning → Complete.  Terminal states
    /// hold their position.  The heading is only updated when the vehicle
    /// actually moved.
    pub fn advance(&mut self, elapsed_secs: f64) -> Position {
        if self.status.is_moving() && elapsed_secs > 0.0 {
            self.seconds_traveled += elapsed_secs;
        }

        let distance = self.distance_traveled();
        let point = self.path.point_at_distance(distance);

        if self.status.is_moving() && distance >= self.path.length() {
            self.status = match self.status {
                RouteStatus::EnRoute => RouteStatus::AtDestination,
                _ => RouteStatus::Complete,
            };
        }

        if let Some(heading) = travel_heading(self.last_position, point) {
            self.heading = heading;
        }
        self.last_position = point;
        point
    }

    /// Replace the finished outbound path with the return path.
    ///
    /// Resets `seconds_traveled` to exactly zero and moves to Returning.
    ///
    /// # Errors
    ///
    /// - `NotAtDestination` unless the route is at AtDestination.
    /// - `InvalidPath` if the new path has zero length or no usable speed,
    ///   or starts more than `join_tolerance_m` from where the route stopped.
    ///   The route is left untouched on error.
    pub fn reset_path(
        &mut self,
        path:             PathGeometry,
        speed_mps:        f64,
        join_tolerance_m: f64,
    ) -> MobilityResult<()> {
        if self.status != RouteStatus::AtDestination {
            return Err(MobilityError::NotAtDestination { route: self.id, status: self.status });
        }
        check_path(self.id, &path, speed_mps)?;

        let gap_m = self.last_position.distance_m(path.start());
        if gap_m > join_tolerance_m {
            return Err(MobilityError::InvalidPath {
                route:  self.id,
                reason: InvalidPathReason::Disconnected { gap_m },
            });
        }

        self.path = path;
        self.speed_mps = speed_mps;
        self.seconds_traveled = 0.0;
        self.status = RouteStatus::Returning;
        Ok(())
    }

    /// [`reset_path`](Self::reset_path) from a solver result.
    pub fn reset_from_solved(&mut self, route: SolvedRoute, join_tolerance_m: f64) -> MobilityResult<()> {
        let speed = route.speed_mps().unwrap_or(0.0);
        self.reset_path(route.path, speed, join_tolerance_m)
    }

    /// Pre-apply `seconds` of travel on a fresh outbound leg so fleets do
    /// not all start at the warehouse.  The status is left for the next
    /// `advance` to settle.
    pub fn fast_forward(&mut self, seconds: f64) {
        if self.status != RouteStatus::EnRoute || seconds.is_nan() || seconds <= 0.0 {
            return;
        }
        self.seconds_traveled = seconds;
        self.last_position = self.path.point_at_distance(self.distance_traveled());
    }

    /// The tuple published for this route.
    pub fn observe(&self) -> Observation {
        Observation {
            entity_id: self.id,
            heading:   self.heading,
            status:    self.status,
            position:  self.last_position,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn id(&self) -> RouteId { self.id }
    pub fn warehouse(&self) -> WarehouseId { self.warehouse }
    pub fn path(&self) -> &PathGeometry { &self.path }
    pub fn speed_mps(&self) -> f64 { self.speed_mps }
    pub fn seconds_traveled(&self) -> f64 { self.seconds_traveled }
    pub fn last_position(&self) -> Position { self.last_position }
    pub fn heading(&self) -> f64 { self.heading }
    pub fn status(&self) -> RouteStatus { self.status }

    /// Start of the current path.
    pub fn start_point(&self) -> Position { self.path.start() }

    /// End of the current path.
    pub fn end_point(&self) -> Position { self.path.end() }

    /// Metres covered on the current leg (not clamped to the path length).
    #[inline]
    pub fn distance_traveled(&self) -> f64 {
        self.seconds_traveled * self.speed_mps
    }

    /// Expected seconds to traverse the current path.
    pub fn leg_duration_secs(&self) -> f64 {
        self.path.length() / self.speed_mps
    }
}

fn check_path(id: RouteId, path: &PathGeometry, speed_mps: f64) -> MobilityResult<()> {
    if path.is_degenerate() {
        return Err(MobilityError::InvalidPath { route: id, reason: InvalidPathReason::ZeroLength });
    }
    if !(speed_mps.is_finite() && speed_mps > 0.0) {
        return Err(MobilityError::InvalidPath { route: id, reason: InvalidPathReason::ZeroDuration });
    }
    Ok(())
}
