//! `RouteFleetManager` — the set of active routes and their replacement
//! policy.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info, warn};

use fleet_core::{Position, RouteId, RouteStatus, SimConfig, SimRng, Tick, WarehouseId};
use fleet_mobility::{ActiveRoute, MobilityError, Observation};
use fleet_spatial::RouteSolver;

use crate::{RouteRequest, RouteResponse, WarehouseSet};

// ── Outcomes ──────────────────────────────────────────────────────────────────

/// What [`RouteFleetManager::apply`] did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A new outbound route joined the fleet.
    Started(RouteId),
    /// A waiting route took its return path.
    Reset(RouteId),
    /// The route was given an unusable return path and removed; a
    /// replacement dispatch is queued.
    Dropped(RouteId),
    /// An initial-fleet truck could not be routed and was skipped.
    Skipped(WarehouseId),
    /// The request failed and will be retried on a later tick.
    Deferred,
    /// A replacement dispatch ran out of attempts.
    Abandoned(WarehouseId),
    /// The response refers to a route that is gone or no longer waiting.
    Stale,
}

/// Result of one [`RouteFleetManager::reconcile`] pass.
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Entities removed from the fleet since the previous pass.
    pub retired:  Vec<RouteId>,
    /// Routing jobs to issue now.
    pub requests: Vec<RouteRequest>,
}

/// A replacement dispatch waiting for its tick.
#[derive(Debug, Clone, Copy)]
struct PendingDispatch {
    warehouse: WarehouseId,
    attempt:   u32,
    due:       Tick,
}

// ── RouteFleetManager ─────────────────────────────────────────────────────────

/// Owns every `ActiveRoute` and decides what to ask the solver next.
///
/// Single-threaded: the caller serialises `advance_all`, `reconcile` and
/// `apply` under one guard.  Routes are keyed by id in a `BTreeMap` so
/// iteration, and therefore observation order and RNG consumption, is
/// deterministic for a given seed.
pub struct RouteFleetManager {
    config:     SimConfig,
    warehouses: WarehouseSet,
    routes:     BTreeMap<RouteId, ActiveRoute>,
    /// Replacement dispatches waiting for their due tick.
    pending:    Vec<PendingDispatch>,
    /// Routes with a return solve in flight.
    returning:  BTreeSet<RouteId>,
    /// Routes whose last return solve failed, with the tick to retry at.
    retry_at:   BTreeMap<RouteId, Tick>,
    /// Ids removed outside `reconcile`, reported by the next pass.
    retired:    Vec<RouteId>,
    rng:        SimRng,
}

impl RouteFleetManager {
    pub fn new(warehouses: WarehouseSet, config: SimConfig) -> Self {
        let rng = SimRng::new(config.seed);
        Self {
            config,
            warehouses,
            routes:    BTreeMap::new(),
            pending:   Vec::new(),
            returning: BTreeSet::new(),
            retry_at:  BTreeMap::new(),
            retired:   Vec::new(),
            rng,
        }
    }

    // ── Initial fleet ─────────────────────────────────────────────────────

    /// `trucks_per_warehouse` outbound requests for every warehouse, each to
    /// its own random destination.
    pub fn initial_requests(&mut self) -> Vec<RouteRequest> {
        let trucks = self.config.trucks_per_warehouse;
        let origins: Vec<(WarehouseId, Position)> =
            self.warehouses.iter().map(|w| (w.id, w.position)).collect();

        let mut requests = Vec::with_capacity(origins.len() * trucks);
        for (warehouse, from) in origins {
            for _ in 0..trucks {
                requests.push(RouteRequest::Dispatch {
                    warehouse,
                    from,
                    to:      self.random_destination(),
                    attempt: 1,
                    initial: true,
                });
            }
        }
        requests
    }

    /// Build the initial fleet by solving inline.  Trucks whose route cannot
    /// be solved are logged and skipped.  Returns the number of routes
    /// started.
    pub fn populate<S: RouteSolver + ?Sized>(&mut self, solver: &S) -> usize {
        let requests = self.initial_requests();
        let wanted = requests.len();
        let mut started = 0;
        for request in requests {
            if let Applied::Started(_) = self.apply(request.solve(solver), Tick::ZERO) {
                started += 1;
            }
        }
        info!("[Fleet] initial fleet: {started}/{wanted} trucks routed");
        started
    }

    // ── Responses ─────────────────────────────────────────────────────────

    /// Apply a finished solve.  Every failure is contained to the request it
    /// belongs to.
    pub fn apply(&mut self, response: RouteResponse, now: Tick) -> Applied {
        let RouteResponse { request, result } = response;
        match request {
            RouteRequest::Dispatch { warehouse, attempt, initial, .. } => {
                let solved = match result {
                    Ok(solved) => solved,
                    Err(e) if initial => {
                        warn!("[Fleet] skipping initial truck at {warehouse}: {e}");
                        return Applied::Skipped(warehouse);
                    }
                    Err(e) => {
                        warn!("[Fleet] dispatch from {warehouse} failed (attempt {attempt}): {e}");
                        return self.defer_dispatch(warehouse, attempt, now);
                    }
                };

                let routes = &self.routes;
                let id = RouteId::generate_unique(self.rng.inner(), |id| routes.contains_key(id));
                match ActiveRoute::from_solved(id, warehouse, solved) {
                    Ok(mut route) => {
                        if initial && self.config.fast_forward {
                            let offset = self.rng.uniform(0.0, route.leg_duration_secs());
                            route.fast_forward(offset);
                        }
                        debug!(
                            "[Fleet] {id} dispatched from {warehouse}: {:.0} m at {:.1} m/s",
                            route.path().length(),
                            route.speed_mps(),
                        );
                        self.routes.insert(id, route);
                        Applied::Started(id)
                    }
                    Err(e) if initial => {
                        warn!("[Fleet] skipping initial truck at {warehouse}: {e}");
                        Applied::Skipped(warehouse)
                    }
                    Err(e) => {
                        warn!("[Fleet] dispatch from {warehouse} returned an unusable path: {e}");
                        self.defer_dispatch(warehouse, attempt, now)
                    }
                }
            }

            RouteRequest::Return { route: id, .. } => {
                self.returning.remove(&id);
                let Some(route) = self.routes.get_mut(&id) else {
                    return Applied::Stale;
                };
                if route.status() != RouteStatus::AtDestination {
                    return Applied::Stale;
                }

                let solved = match result {
                    Ok(solved) => solved,
                    Err(e) => {
                        let due = now.offset(self.config.retry_delay_ticks.max(1));
                        warn!("[Fleet] return solve for {id} failed, retrying at {due}: {e}");
                        self.retry_at.insert(id, due);
                        return Applied::Deferred;
                    }
                };

                match route.reset_from_solved(solved, self.config.path_join_tolerance_m) {
                    Ok(()) => {
                        self.retry_at.remove(&id);
                        debug!("[Fleet] {id} returning to {}", route.warehouse());
                        Applied::Reset(id)
                    }
                    Err(MobilityError::NotAtDestination { .. }) => Applied::Stale,
                    Err(e @ MobilityError::InvalidPath { .. }) => {
                        let warehouse = route.warehouse();
                        warn!("[Fleet] dropping {id}: {e}");
                        self.remove_route(id);
                        self.queue_dispatch(warehouse, 1, now);
                        Applied::Dropped(id)
                    }
                }
            }
        }
    }

    // ── Per-tick work ─────────────────────────────────────────────────────

    /// Advance every route by `step_secs` and return one observation per
    /// route, in id order.
    pub fn advance_all(&mut self, step_secs: f64) -> Vec<Observation> {
        #[cfg(not(feature = "parallel"))]
        {
            self.routes
                .values_mut()
                .map(|route| {
                    route.advance(step_secs);
                    route.observe()
                })
                .collect()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            // Routes never interact, so each advances independently; collect
            // keeps the map's id order.
            self.routes
                .par_iter_mut()
                .map(|(_, route)| {
                    route.advance(step_secs);
                    route.observe()
                })
                .collect()
        }
    }

    /// Reclaim finished routes and issue the routing jobs due at `now`.
    ///
    /// - Complete routes are removed and a replacement dispatch is queued
    ///   from the same warehouse.
    /// - AtDestination routes with no return solve in flight (and no pending
    ///   retry delay) get a return request.
    /// - Queued dispatches due at or before `now` get a fresh random
    ///   destination.
    pub fn reconcile(&mut self, now: Tick) -> Reconciliation {
        let mut out = Reconciliation {
            retired: std::mem::take(&mut self.retired),
            ..Reconciliation::default()
        };

        // ── Complete → retire + replace ───────────────────────────────────
        let complete: Vec<(RouteId, WarehouseId)> = self
            .routes
            .values()
            .filter(|r| r.status() == RouteStatus::Complete)
            .map(|r| (r.id(), r.warehouse()))
            .collect();
        for (id, warehouse) in complete {
            debug!("[Fleet] {id} complete, replacing from {warehouse}");
            self.remove_route(id);
            out.retired.append(&mut self.retired);
            self.queue_dispatch(warehouse, 1, now);
        }

        // ── AtDestination → return leg ────────────────────────────────────
        for route in self.routes.values() {
            let id = route.id();
            if route.status() != RouteStatus::AtDestination || self.returning.contains(&id) {
                continue;
            }
            if self.retry_at.get(&id).is_some_and(|&due| due > now) {
                continue;
            }
            self.retry_at.remove(&id);
            self.returning.insert(id);
            out.requests.push(RouteRequest::Return {
                route: id,
                from:  route.end_point(),
                to:    route.start_point(),
            });
        }

        // ── Queued dispatches ─────────────────────────────────────────────
        let (due, later): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.pending).into_iter().partition(|p| p.due <= now);
        self.pending = later;
        for p in due {
            let Some(from) = self.warehouses.position(p.warehouse) else {
                warn!("[Fleet] unknown warehouse {}, dropping dispatch", p.warehouse);
                continue;
            };
            out.requests.push(RouteRequest::Dispatch {
                warehouse: p.warehouse,
                from,
                to:        self.random_destination(),
                attempt:   p.attempt,
                initial:   false,
            });
        }

        out
    }

    /// Uniform random point inside the destination extent, in WGS-84.
    pub fn random_destination(&mut self) -> Position {
        self.warehouses.extent().sample(&mut self.rng)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &SimConfig { &self.config }
    pub fn warehouses(&self) -> &WarehouseSet { &self.warehouses }
    pub fn len(&self) -> usize { self.routes.len() }
    pub fn is_empty(&self) -> bool { self.routes.is_empty() }

    pub fn route(&self, id: RouteId) -> Option<&ActiveRoute> {
        self.routes.get(&id)
    }

    /// Routes in id order.
    pub fn routes(&self) -> impl Iterator<Item = &ActiveRoute> {
        self.routes.values()
    }

    /// Number of routes in each status, indexed by status code.
    pub fn status_counts(&self) -> [usize; 4] {
        let mut counts = [0; 4];
        for route in self.routes.values() {
            counts[route.status().code() as usize] += 1;
        }
        counts
    }

    /// Replacement dispatches waiting for a later tick.
    pub fn pending_dispatches(&self) -> usize {
        self.pending.len()
    }

    /// Return solves currently in flight.
    pub fn returns_in_flight(&self) -> usize {
        self.returning.len()
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn remove_route(&mut self, id: RouteId) {
        if self.routes.remove(&id).is_some() {
            self.returning.remove(&id);
            self.retry_at.remove(&id);
            self.retired.push(id);
        }
    }

    fn queue_dispatch(&mut self, warehouse: WarehouseId, attempt: u32, due: Tick) {
        self.pending.push(PendingDispatch { warehouse, attempt, due });
    }

    /// Queue the next attempt after a failed dispatch, or give up once
    /// `max_dispatch_attempts` is reached.
    fn defer_dispatch(&mut self, warehouse: WarehouseId, attempt: u32, now: Tick) -> Applied {
        if attempt >= self.config.max_dispatch_attempts {
            warn!("[Fleet] abandoning dispatch from {warehouse} after {attempt} attempts");
            return Applied::Abandoned(warehouse);
        }
        let due = now.offset(self.config.retry_delay_ticks.max(1));
        self.queue_dispatch(warehouse, attempt + 1, due);
        Applied::Deferred
    }
}
