//! Unit tests for fleet-dispatch.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use fleet_core::{Position, RouteStatus, SimConfig, SpatialReference, Tick};
use fleet_spatial::{Extent, PathGeometry, RouteSolver, SolvedRoute, SpatialError, SpatialResult};

use crate::{RouteFleetManager, WarehouseSet};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Straight-line solver at a fixed speed.  Failures and path offsets can be
/// switched on between calls.
struct LineSolver {
    speed_mps:   f64,
    fail:        AtomicBool,
    /// Shift the start of every path north by this many degrees.
    offset_deg:  f64,
    calls:       AtomicUsize,
}

impl LineSolver {
    fn new(speed_mps: f64) -> Self {
        Self { speed_mps, fail: AtomicBool::new(false), offset_deg: 0.0, calls: AtomicUsize::new(0) }
    }

    fn failing() -> Self {
        let s = Self::new(10.0);
        s.fail.store(true, Ordering::SeqCst);
        s
    }

    fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl RouteSolver for LineSolver {
    fn solve(&self, start: Position, end: Position) -> SpatialResult<SolvedRoute> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(SpatialError::NoRoute { from: start, to: end });
        }
        let start = Position::new(start.lon, start.lat + self.offset_deg);
        let path = PathGeometry::new(vec![start, end])?;
        let length = path.length();
        Ok(SolvedRoute { path, total_length_m: length, total_duration_secs: length / self.speed_mps })
    }
}

/// Two warehouses in a ~2 km square of WGS-84 degrees.
fn warehouses() -> WarehouseSet {
    let extent = Extent::new(-117.02, 32.70, -117.00, 32.72, SpatialReference::Wgs84).unwrap();
    WarehouseSet::from_positions(
        [Position::new(-117.015, 32.705), Position::new(-117.005, 32.715)],
        extent,
    )
    .unwrap()
}

fn config() -> SimConfig {
    SimConfig { fast_forward: false, ..SimConfig::default() }
}

fn manager(config: SimConfig) -> RouteFleetManager {
    RouteFleetManager::new(warehouses(), config)
}

/// Advance until every route is in `status` or the step budget runs out.
fn advance_until(fleet: &mut RouteFleetManager, status: RouteStatus) {
    for _ in 0..10_000 {
        if fleet.routes().all(|r| r.status() == status) {
            return;
        }
        fleet.advance_all(1.0);
    }
    panic!("fleet never reached {status}");
}

// ── Warehouses ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod warehouse {
    use super::*;
    use crate::{DispatchError, InMemoryWarehouses, WarehouseSource};
    use fleet_core::WarehouseId;

    #[test]
    fn empty_set_is_fatal() {
        let extent = Extent::new(0.0, 0.0, 1.0, 1.0, SpatialReference::Wgs84).unwrap();
        let err = WarehouseSet::from_positions(Vec::new(), extent).unwrap_err();
        assert!(matches!(err, DispatchError::NoWarehouses));
        assert!(err.is_fatal_setup());
    }

    #[test]
    fn non_finite_position_rejected() {
        let extent = Extent::new(0.0, 0.0, 1.0, 1.0, SpatialReference::Wgs84).unwrap();
        let err = WarehouseSet::from_positions([Position::new(f64::NAN, 0.0)], extent).unwrap_err();
        assert!(matches!(err, DispatchError::Parse(_)));
    }

    #[test]
    fn inverted_bounds_are_fatal() {
        let points = vec![("depot".to_string(), Position::new(0.5, 0.5))];
        let err = WarehouseSet::with_bounds(points, [1.0, 0.0, 0.0, 1.0], SpatialReference::Wgs84)
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidExtent(_)));
        assert!(err.is_fatal_setup());
    }

    #[test]
    fn bounds_build_the_extent() {
        let points = vec![("depot".to_string(), Position::new(0.5, 0.5))];
        let set = WarehouseSet::with_bounds(points, [0.0, 0.0, 1.0, 1.0], SpatialReference::Wgs84)
            .unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.extent().contains(0.25, 0.75));
    }

    #[test]
    fn ids_follow_input_order() {
        let set = warehouses();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(WarehouseId(1)).unwrap().position, Position::new(-117.005, 32.715));
        assert!(set.get(WarehouseId(2)).is_none());
    }

    #[test]
    fn in_memory_source_loads() {
        let extent = Extent::new(0.0, 0.0, 1.0, 1.0, SpatialReference::Wgs84).unwrap();
        let source = InMemoryWarehouses::named(vec![("depot".into(), Position::new(0.5, 0.5))], extent);
        let set = source.load().unwrap();
        assert_eq!(set.get(WarehouseId(0)).unwrap().name, "depot");
    }

    #[test]
    fn in_memory_source_empty_is_fatal() {
        let extent = Extent::new(0.0, 0.0, 1.0, 1.0, SpatialReference::Wgs84).unwrap();
        let source = InMemoryWarehouses::new(Vec::new(), extent);
        assert!(matches!(source.load(), Err(DispatchError::NoWarehouses)));
    }
}

// ── CSV loader ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader {
    use super::*;
    use crate::{load_warehouses_reader, CsvWarehouseSource, DispatchError, WarehouseSource};
    use fleet_core::WarehouseId;
    use std::io::Cursor;

    fn extent() -> Extent {
        Extent::new(-13053376.1, 3851361.7, -13029715.0, 3863009.5, SpatialReference::WebMercator)
            .unwrap()
    }

    #[test]
    fn web_mercator_rows_are_projected() {
        let csv = "name,x,y\nOtay,-13033020.5,3857270.1\nMiramar,-13040910.0,3860115.8\n";
        let set = load_warehouses_reader(Cursor::new(csv), SpatialReference::WebMercator, extent())
            .unwrap();
        assert_eq!(set.len(), 2);
        let otay = set.get(WarehouseId(0)).unwrap();
        assert_eq!(otay.name, "Otay");
        assert!((otay.position.lon - -117.08).abs() < 0.01, "lon {}", otay.position.lon);
        assert!((otay.position.lat - 32.71).abs() < 0.02, "lat {}", otay.position.lat);
    }

    #[test]
    fn header_only_is_fatal() {
        let result = load_warehouses_reader(Cursor::new("name,x,y\n"), SpatialReference::Wgs84, extent());
        assert!(matches!(result, Err(DispatchError::NoWarehouses)));
    }

    #[test]
    fn malformed_row_is_a_parse_error() {
        let csv = "name,x,y\nOtay,not-a-number,3857270.1\n";
        let result = load_warehouses_reader(Cursor::new(csv), SpatialReference::WebMercator, extent());
        assert!(matches!(result, Err(DispatchError::Parse(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let source = CsvWarehouseSource::new(
            "/nonexistent/warehouses.csv",
            SpatialReference::Wgs84,
            extent(),
        );
        let err = source.load().unwrap_err();
        assert!(matches!(err, DispatchError::Io(_)));
        assert!(err.is_fatal_setup());
    }
}

// ── Initial fleet ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod initial {
    use super::*;
    use crate::RouteRequest;

    #[test]
    fn one_request_per_truck() {
        let mut fleet = manager(SimConfig { trucks_per_warehouse: 3, ..config() });
        let requests = fleet.initial_requests();
        assert_eq!(requests.len(), 6);
        assert!(requests.iter().all(|r| matches!(
            r,
            RouteRequest::Dispatch { initial: true, attempt: 1, .. }
        )));
    }

    #[test]
    fn populate_routes_every_truck() {
        let mut fleet = manager(config());
        let started = fleet.populate(&LineSolver::new(10.0));
        assert_eq!(started, 4);
        assert_eq!(fleet.len(), 4);
        assert!(fleet.routes().all(|r| r.status() == RouteStatus::EnRoute));
        assert!(fleet.routes().all(|r| r.seconds_traveled() == 0.0));
    }

    #[test]
    fn failures_are_skipped_not_fatal() {
        let mut fleet = manager(config());
        assert_eq!(fleet.populate(&LineSolver::failing()), 0);
        assert!(fleet.is_empty());
        assert_eq!(fleet.pending_dispatches(), 0);
    }

    #[test]
    fn fast_forward_stays_within_duration() {
        let mut fleet = manager(SimConfig { fast_forward: true, trucks_per_warehouse: 20, ..config() });
        fleet.populate(&LineSolver::new(10.0));
        assert_eq!(fleet.len(), 40);
        for route in fleet.routes() {
            assert!(route.seconds_traveled() >= 0.0);
            assert!(route.seconds_traveled() <= route.leg_duration_secs());
        }
        assert!(fleet.routes().any(|r| r.seconds_traveled() > 0.0));
    }

    #[test]
    fn same_seed_same_fleet() {
        let mut a = manager(config());
        let mut b = manager(config());
        a.populate(&LineSolver::new(10.0));
        b.populate(&LineSolver::new(10.0));
        let ids_a: Vec<_> = a.routes().map(|r| r.id()).collect();
        let ids_b: Vec<_> = b.routes().map(|r| r.id()).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn destinations_inside_extent() {
        let mut fleet = manager(config());
        let extent = *fleet.warehouses().extent();
        for _ in 0..1_000 {
            let p = fleet.random_destination();
            assert!(extent.contains(p.lon, p.lat), "{p} outside extent");
        }
    }
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle {
    use super::*;
    use crate::{Applied, RouteRequest};

    #[test]
    fn advance_all_observes_every_route_in_id_order() {
        let mut fleet = manager(config());
        fleet.populate(&LineSolver::new(10.0));
        let obs = fleet.advance_all(1.0);
        assert_eq!(obs.len(), 4);
        assert!(obs.windows(2).all(|w| w[0].entity_id < w[1].entity_id));
    }

    #[test]
    fn full_round_trip_replaces_the_truck() {
        let solver = LineSolver::new(50.0);
        let mut fleet = manager(SimConfig { trucks_per_warehouse: 1, ..config() });
        fleet.populate(&solver);
        let original: Vec<_> = fleet.routes().map(|r| (r.id(), r.warehouse())).collect();

        advance_until(&mut fleet, RouteStatus::AtDestination);
        let now = Tick(1);
        let rec = fleet.reconcile(now);
        assert!(rec.retired.is_empty());
        assert_eq!(rec.requests.len(), 2);
        assert!(rec.requests.iter().all(|r| matches!(r, RouteRequest::Return { .. })));

        // Requests in flight are not issued again.
        assert!(fleet.reconcile(now).requests.is_empty());
        assert_eq!(fleet.returns_in_flight(), 2);

        for request in rec.requests {
            assert!(matches!(fleet.apply(request.solve(&solver), now), Applied::Reset(_)));
        }
        assert!(fleet.routes().all(|r| r.status() == RouteStatus::Returning));
        assert!(fleet.routes().all(|r| r.seconds_traveled() == 0.0));

        advance_until(&mut fleet, RouteStatus::Complete);
        let rec = fleet.reconcile(Tick(2));
        let mut retired = rec.retired.clone();
        retired.sort();
        let mut expected: Vec<_> = original.iter().map(|(id, _)| *id).collect();
        expected.sort();
        assert_eq!(retired, expected);
        assert!(fleet.is_empty());

        let mut from: Vec<_> = rec
            .requests
            .iter()
            .map(|r| match r {
                RouteRequest::Dispatch { warehouse, initial: false, attempt: 1, .. } => *warehouse,
                other => panic!("unexpected request {other:?}"),
            })
            .collect();
        from.sort();
        let mut wanted: Vec<_> = original.iter().map(|(_, w)| *w).collect();
        wanted.sort();
        assert_eq!(from, wanted);

        for request in rec.requests {
            let applied = fleet.apply(request.solve(&solver), Tick(2));
            let Applied::Started(id) = applied else { panic!("expected a new route, got {applied:?}") };
            assert!(!expected.contains(&id));
        }
        assert_eq!(fleet.len(), 2);
    }

    #[test]
    fn failed_return_waits_then_retries() {
        let solver = LineSolver::new(50.0);
        let mut fleet = manager(SimConfig { trucks_per_warehouse: 1, retry_delay_ticks: 2, ..config() });
        fleet.populate(&solver);
        advance_until(&mut fleet, RouteStatus::AtDestination);

        let rec = fleet.reconcile(Tick(10));
        solver.set_fail(true);
        for request in rec.requests {
            assert_eq!(fleet.apply(request.solve(&solver), Tick(10)), Applied::Deferred);
        }
        assert!(fleet.routes().all(|r| r.status() == RouteStatus::AtDestination));

        // Stalled routes hold still and are not re-requested before the delay.
        fleet.advance_all(1.0);
        assert!(fleet.reconcile(Tick(11)).requests.is_empty());

        let rec = fleet.reconcile(Tick(12));
        assert_eq!(rec.requests.len(), 2);
        solver.set_fail(false);
        for request in rec.requests {
            assert!(matches!(fleet.apply(request.solve(&solver), Tick(12)), Applied::Reset(_)));
        }
    }

    #[test]
    fn disconnected_return_drops_and_replaces() {
        let solver = LineSolver::new(50.0);
        let mut fleet = manager(SimConfig { trucks_per_warehouse: 1, ..config() });
        fleet.populate(&solver);
        advance_until(&mut fleet, RouteStatus::AtDestination);

        let rec = fleet.reconcile(Tick(5));
        let bad = LineSolver { offset_deg: 0.05, ..LineSolver::new(50.0) };
        let mut dropped = Vec::new();
        for request in rec.requests {
            match fleet.apply(request.solve(&bad), Tick(5)) {
                Applied::Dropped(id) => dropped.push(id),
                other => panic!("expected drop, got {other:?}"),
            }
        }
        assert!(fleet.is_empty());

        let rec = fleet.reconcile(Tick(5));
        dropped.sort();
        let mut retired = rec.retired;
        retired.sort();
        assert_eq!(retired, dropped);
        assert_eq!(rec.requests.len(), 2);
        assert!(rec.requests.iter().all(|r| matches!(r, RouteRequest::Dispatch { initial: false, .. })));
    }

    #[test]
    fn replacement_dispatch_is_bounded() {
        let solver = LineSolver::new(50.0);
        let mut fleet = manager(SimConfig {
            trucks_per_warehouse:  1,
            max_dispatch_attempts: 3,
            ..config()
        });
        fleet.populate(&solver);
        advance_until(&mut fleet, RouteStatus::AtDestination);
        let rec = fleet.reconcile(Tick(0));
        for request in rec.requests {
            fleet.apply(request.solve(&solver), Tick(0));
        }
        advance_until(&mut fleet, RouteStatus::Complete);

        solver.set_fail(true);
        let mut abandoned = 0;
        let mut issued = 0;
        for t in 1..20 {
            let rec = fleet.reconcile(Tick(t));
            for request in rec.requests {
                issued += 1;
                match fleet.apply(request.solve(&solver), Tick(t)) {
                    Applied::Deferred => {}
                    Applied::Abandoned(_) => abandoned += 1,
                    other => panic!("unexpected {other:?}"),
                }
            }
        }
        assert_eq!(issued, 2 * 3);
        assert_eq!(abandoned, 2);
        assert_eq!(fleet.pending_dispatches(), 0);
        assert!(fleet.is_empty());
    }

    #[test]
    fn stale_return_is_ignored() {
        let solver = LineSolver::new(50.0);
        let mut fleet = manager(SimConfig { trucks_per_warehouse: 1, ..config() });
        fleet.populate(&solver);
        let id = fleet.routes().next().unwrap().id();
        let route = fleet.route(id).unwrap();
        let request = RouteRequest::Return { route: id, from: route.end_point(), to: route.start_point() };

        // Still EnRoute: the response no longer applies.
        assert_eq!(fleet.apply(request.solve(&solver), Tick(0)), Applied::Stale);
        assert_eq!(fleet.route(id).unwrap().status(), RouteStatus::EnRoute);
    }

    #[test]
    fn status_counts_track_the_fleet() {
        let mut fleet = manager(config());
        fleet.populate(&LineSolver::new(50.0));
        assert_eq!(fleet.status_counts(), [4, 0, 0, 0]);
        advance_until(&mut fleet, RouteStatus::AtDestination);
        assert_eq!(fleet.status_counts(), [0, 0, 4, 0]);
    }
}
