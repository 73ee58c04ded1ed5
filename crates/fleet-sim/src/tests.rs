//! Unit tests for fleet-sim.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fleet_core::{Position, RouteId, SimConfig, SpatialReference, Tick};
use fleet_dispatch::WarehouseSet;
use fleet_mobility::Observation;
use fleet_spatial::{Extent, PathGeometry, RouteSolver, SolvedRoute, SpatialError, SpatialResult};

use crate::{ObservationSink, SimulationScheduler, TickOutcome};

// ── Helpers ───────────────────────────────────────────────────────────────────

struct LineSolver {
    speed_mps: f64,
}

impl RouteSolver for LineSolver {
    fn solve(&self, start: Position, end: Position) -> SpatialResult<SolvedRoute> {
        let path = PathGeometry::new(vec![start, end])?;
        if path.is_degenerate() {
            return Err(SpatialError::DegenerateRoute { from: start, to: end });
        }
        let length = path.length();
        Ok(SolvedRoute { path, total_length_m: length, total_duration_secs: length / self.speed_mps })
    }
}

/// Records every publish and retirement.
#[derive(Default)]
struct RecordingSink {
    batches: Mutex<Vec<(Tick, Vec<RouteId>)>>,
    retired: Mutex<Vec<(Tick, RouteId)>>,
    last_tick: Mutex<Option<Tick>>,
}

impl ObservationSink for RecordingSink {
    fn publish(&self, tick: Tick, observations: &[Observation]) {
        *self.last_tick.lock().unwrap() = Some(tick);
        let ids = observations.iter().map(|o| o.entity_id).collect();
        self.batches.lock().unwrap().push((tick, ids));
    }

    fn retire(&self, entity_id: RouteId) {
        let tick = self.last_tick.lock().unwrap().unwrap();
        self.retired.lock().unwrap().push((tick, entity_id));
    }
}

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

type Recording = SimulationScheduler<LineSolver, Arc<RecordingSink>>;

fn scheduler(config: SimConfig, speed_mps: f64) -> (Recording, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let sched = SimulationScheduler::new(config, warehouses(), LineSolver { speed_mps }, Arc::clone(&sink))
        .unwrap();
    (sched, sink)
}

fn ran(outcome: TickOutcome) -> crate::TickReport {
    match outcome {
        TickOutcome::Ran(report) => report,
        other => panic!("expected the tick to run, got {other:?}"),
    }
}

// ── Construction ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod construction {
    use super::*;
    use crate::{NoopSink, SimError};
    use fleet_dispatch::{DispatchError, InMemoryWarehouses};

    #[test]
    fn requires_a_runtime() {
        let result = SimulationScheduler::new(config(), warehouses(), LineSolver { speed_mps: 10.0 }, NoopSink);
        assert!(matches!(result, Err(SimError::Runtime(_))));
    }

    #[tokio::test]
    async fn rejects_invalid_config() {
        let bad = SimConfig { speed_factor: 0.0, ..config() };
        let result = SimulationScheduler::new(bad, warehouses(), LineSolver { speed_mps: 10.0 }, NoopSink);
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[tokio::test]
    async fn empty_warehouse_source_is_fatal() {
        let extent = Extent::new(0.0, 0.0, 1.0, 1.0, SpatialReference::Wgs84).unwrap();
        let source = InMemoryWarehouses::new(Vec::new(), extent);
        let result = SimulationScheduler::from_source(config(), &source, LineSolver { speed_mps: 10.0 }, NoopSink);
        assert!(matches!(result, Err(SimError::Setup(DispatchError::NoWarehouses))));
    }

    #[tokio::test]
    async fn stopped_until_started() {
        let (sched, sink) = scheduler(config(), 10.0);
        assert!(!sched.is_running());
        assert_eq!(sched.tick_once(), TickOutcome::Stopped);
        assert!(sched.with_fleet(|f| f.len()).await.is_none());
        assert!(sink.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_start_is_refused() {
        let (sched, _sink) = scheduler(config(), 10.0);
        sched.start_manual().await.unwrap();
        assert!(matches!(sched.start_manual().await, Err(SimError::AlreadyRunning)));
    }
}

// ── Ticks ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod ticks {
    use super::*;
    use crate::{ChannelSink, SinkEvent};

    #[tokio::test]
    async fn each_tick_publishes_every_route() {
        let (sched, sink) = scheduler(config(), 10.0);
        sched.start_manual().await.unwrap();
        assert_eq!(sched.with_fleet(|f| f.len()).await, Some(4));

        let first = ran(sched.tick_once());
        let second = ran(sched.tick_once());
        assert_eq!(first.tick, Tick(0));
        assert_eq!(second.tick, Tick(1));
        assert_eq!(first.observations, 4);

        let batches = sink.batches.lock().unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].1, batches[1].1);
        assert_eq!(sched.stats().ticks_run, 2);
    }

    #[tokio::test]
    async fn step_is_independent_of_speed() {
        // Slow enough that no truck arrives within two ticks.
        let (sched, _sink) = scheduler(SimConfig { tick_step_secs: 2.0, ..config() }, 0.5);
        sched.start_manual().await.unwrap();
        sched.set_speed(50.0).unwrap();
        sched.tick_once();
        sched.tick_once();
        let secs = sched.with_fleet(|f| f.routes().map(|r| r.seconds_traveled()).collect::<Vec<_>>()).await;
        assert!(secs.unwrap().iter().all(|&s| s == 4.0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn completed_routes_are_retired_and_replaced() {
        let (sched, sink) = scheduler(SimConfig { trucks_per_warehouse: 1, ..config() }, 1_000.0);
        sched.start_manual().await.unwrap();

        for _ in 0..40 {
            sched.tick_once();
            sched.wait_for_routing(Duration::from_millis(1)).await;
        }

        let retired = sink.retired.lock().unwrap().clone();
        let batches = sink.batches.lock().unwrap().clone();
        assert!(retired.len() >= 2, "only {} routes retired", retired.len());

        for (tick, id) in &retired {
            assert!(batches.iter().any(|(t, ids)| t <= tick && ids.contains(id)));
            assert!(
                !batches.iter().any(|(t, ids)| t > tick && ids.contains(id)),
                "{id} published after retirement"
            );
        }
        let stats = sched.stats();
        assert!(stats.requests_issued >= 4);
        assert_eq!(stats.requests_in_flight, 0);
        assert_eq!(stats.responses_discarded, 0);
    }

    #[tokio::test]
    async fn channel_sink_forwards_batches() {
        let (sink, mut rx) = ChannelSink::new();
        let sched = SimulationScheduler::new(config(), warehouses(), LineSolver { speed_mps: 10.0 }, sink).unwrap();
        sched.start_manual().await.unwrap();
        sched.tick_once();

        match rx.try_recv().unwrap() {
            SinkEvent::Batch(batch) => {
                assert_eq!(batch.tick, Tick(0));
                assert_eq!(batch.observations.len(), 4);
            }
            other => panic!("expected a batch, got {other:?}"),
        }
    }
}

// ── Overlap and cancellation ──────────────────────────────────────────────────

#[cfg(test)]
mod guard {
    use super::*;
    use std::sync::mpsc;

    /// Blocks inside the first `publish` until released.
    struct GateSink {
        armed:   AtomicBool,
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl ObservationSink for GateSink {
        fn publish(&self, _tick: Tick, _observations: &[Observation]) {
            if self.armed.swap(false, Ordering::SeqCst) {
                self.entered.lock().unwrap().send(()).unwrap();
                self.release.lock().unwrap().recv().unwrap();
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn overlapping_tick_is_skipped() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let sink = GateSink {
            armed:   AtomicBool::new(true),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        };
        let sched = SimulationScheduler::new(config(), warehouses(), LineSolver { speed_mps: 10.0 }, sink).unwrap();
        sched.start_manual().await.unwrap();

        std::thread::scope(|s| {
            let first = s.spawn(|| sched.tick_once());
            entered_rx.recv().unwrap();

            assert_eq!(sched.tick_once(), TickOutcome::Skipped);
            assert_eq!(sched.stats().ticks_skipped, 1);
            assert_eq!(sched.stats().ticks_run, 0);

            release_tx.send(()).unwrap();
            let report = ran(first.join().unwrap());
            assert_eq!(report.tick, Tick(0));
        });

        // The skipped tick did not consume simulated time.
        assert_eq!(ran(sched.tick_once()).tick, Tick(1));
        assert_eq!(sched.stats().ticks_run, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_waits_for_tick_in_progress() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let sink = GateSink {
            armed:   AtomicBool::new(true),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        };
        let sched = SimulationScheduler::new(config(), warehouses(), LineSolver { speed_mps: 10.0 }, sink).unwrap();
        sched.start_manual().await.unwrap();
        let handle = tokio::runtime::Handle::current();
        let done = AtomicBool::new(false);

        std::thread::scope(|s| {
            let tick = s.spawn(|| sched.tick_once());
            entered_rx.recv().unwrap();

            let waiter = s.spawn(|| {
                handle.block_on(sched.shutdown());
                done.store(true, Ordering::SeqCst);
            });
            std::thread::sleep(Duration::from_millis(50));
            assert!(!done.load(Ordering::SeqCst), "shutdown returned while a tick was publishing");

            release_tx.send(()).unwrap();
            ran(tick.join().unwrap());
            waiter.join().unwrap();
        });

        assert!(done.load(Ordering::SeqCst));
        assert!(!sched.is_running());
        assert_eq!(sched.tick_once(), TickOutcome::Stopped);
        assert_eq!(sched.stats().ticks_run, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_discards_late_completions() {
        let (sched, _sink) = scheduler(SimConfig { trucks_per_warehouse: 1, ..config() }, 1_000.0);
        sched.start_manual().await.unwrap();

        let mut issued = 0;
        for _ in 0..20 {
            issued = ran(sched.tick_once()).requests;
            if issued > 0 {
                break;
            }
        }
        assert!(issued > 0, "no routing request was issued");

        sched.stop();
        assert_eq!(sched.tick_once(), TickOutcome::Stopped);
        sched.wait_for_routing(Duration::from_millis(1)).await;

        // The stopped fleet is still readable and untouched by the results.
        assert!(sched.with_fleet(|f| f.returns_in_flight()).await.unwrap() > 0);

        sched.start_manual().await.unwrap();
        assert_eq!(sched.stats().responses_discarded, issued as u64);
        assert_eq!(sched.with_fleet(|f| f.returns_in_flight()).await, Some(0));
    }
}

// ── Timer ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod timer {
    use super::*;
    use crate::SimError;
    use fleet_core::time::MAX_TICK_INTERVAL;

    #[tokio::test]
    async fn interval_follows_speed() {
        let (sched, _sink) = scheduler(config(), 10.0);
        assert_eq!(sched.interval(), Duration::from_millis(200));
        sched.set_speed(20.0).unwrap();
        assert_eq!(sched.interval(), Duration::from_millis(50));
        assert_eq!(sched.config().tick_step_secs, 1.0);
    }

    #[tokio::test]
    async fn invalid_speed_rejected() {
        let (sched, _sink) = scheduler(config(), 10.0);
        for bad in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(sched.set_speed(bad), Err(SimError::InvalidSpeed(_))));
        }
        assert_eq!(sched.speed(), 5.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn tiny_speed_runs_with_capped_interval() {
        let cfg = SimConfig { speed_factor: 1e-20, start_delay_ms: 0, ..config() };
        let (sched, _sink) = scheduler(cfg, 10.0);
        assert_eq!(sched.interval(), MAX_TICK_INTERVAL);

        // The first tick fires at once; the next is a day away.
        sched.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sched.stats().ticks_run, 1);

        sched.set_speed(1e-300).unwrap();
        assert_eq!(sched.interval(), MAX_TICK_INTERVAL);
        sched.set_speed(100.0).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(sched.stats().ticks_run >= 5, "{:?}", sched.stats());
        sched.stop();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn timer_ticks_until_stopped() {
        let cfg = SimConfig { speed_factor: 100.0, start_delay_ms: 0, ..config() };
        let (sched, _sink) = scheduler(cfg, 10.0);
        sched.start().await.unwrap();
        assert!(sched.is_running());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(sched.stats().ticks_run >= 5, "{:?}", sched.stats());

        sched.stop();
        assert!(!sched.is_running());
        tokio::time::sleep(Duration::from_millis(50)).await;
        let after_stop = sched.stats().ticks_run;
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(sched.stats().ticks_run, after_stop);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn speed_change_reschedules_running_timer() {
        let cfg = SimConfig { speed_factor: 1.0, start_delay_ms: 0, ..config() };
        let (sched, _sink) = scheduler(cfg, 10.0);
        sched.start().await.unwrap();

        // One tick fires immediately at speed 1; the next would be 1 s away.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let slow = sched.stats().ticks_run;
        assert!(slow <= 1);

        sched.set_speed(100.0).unwrap();
        assert!(sched.is_running());
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(sched.stats().ticks_run >= slow + 5, "{:?}", sched.stats());
        sched.stop();
    }
}
