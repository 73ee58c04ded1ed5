//! Routing requests issued by the fleet manager and their responses.

use fleet_core::{Position, RouteId, WarehouseId};
use fleet_spatial::{RouteSolver, SolvedRoute, SpatialResult};

/// One routing job for the solver.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteRequest {
    /// A new outbound leg from a warehouse to a random destination.
    Dispatch {
        warehouse: WarehouseId,
        from:      Position,
        to:        Position,
        /// 1 for the first try; bounded by `max_dispatch_attempts`.
        attempt:   u32,
        /// Part of the initial fleet: fast-forwarded on success, not
        /// retried on failure.
        initial:   bool,
    },
    /// The return leg for a route waiting at its destination.
    Return {
        route: RouteId,
        from:  Position,
        to:    Position,
    },
}

impl RouteRequest {
    /// `(start, end)` to hand to the solver.
    pub fn endpoints(&self) -> (Position, Position) {
        match *self {
            RouteRequest::Dispatch { from, to, .. } | RouteRequest::Return { from, to, .. } => (from, to),
        }
    }

    /// Run this request against `solver`.  Blocking.
    pub fn solve<S: RouteSolver + ?Sized>(self, solver: &S) -> RouteResponse {
        let (from, to) = self.endpoints();
        let result = solver.solve(from, to);
        RouteResponse { request: self, result }
    }
}

/// A finished solve, fed back through `RouteFleetManager::apply`.
#[derive(Debug)]
pub struct RouteResponse {
    pub request: RouteRequest,
    pub result:  SpatialResult<SolvedRoute>,
}
