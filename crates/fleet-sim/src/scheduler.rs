//! `SimulationScheduler` — periodic tick engine with a non-blocking guard.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use fleet_core::time::{interval_for_speed, validate_speed};
use fleet_core::{SimClock, SimConfig, Tick};
use fleet_dispatch::{RouteFleetManager, RouteRequest, RouteResponse, WarehouseSet, WarehouseSource};
use fleet_spatial::RouteSolver;

use crate::{ObservationSink, SimError, SimResult};

// ── Public result types ───────────────────────────────────────────────────────

/// What one tick attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Ran(TickReport),
    /// The previous tick still held the guard; nothing changed.
    Skipped,
    /// No session is running.
    Stopped,
}

/// Summary of a tick that ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub tick:         Tick,
    /// Routing completions applied at the start of the tick.
    pub applied:      usize,
    /// Observations published (one per active route).
    pub observations: usize,
    pub retired:      usize,
    /// Routing requests issued at the end of the tick.
    pub requests:     usize,
}

/// Counters since the scheduler was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub ticks_run:           u64,
    pub ticks_skipped:       u64,
    pub requests_issued:     u64,
    /// Completions that arrived after their session was stopped.
    pub responses_discarded: u64,
    pub requests_in_flight:  u64,
}

#[derive(Default)]
struct Counters {
    ticks_run:           AtomicU64,
    ticks_skipped:       AtomicU64,
    requests_issued:     AtomicU64,
    responses_discarded: AtomicU64,
    requests_in_flight:  AtomicU64,
}

// ── Shared state ──────────────────────────────────────────────────────────────

/// A finished solve tagged with the session that asked for it.
struct Completion {
    generation: u64,
    response:   RouteResponse,
}

/// Everything the tick guard protects.
struct TickState {
    fleet:       Option<RouteFleetManager>,
    clock:       SimClock,
    completions: mpsc::UnboundedReceiver<Completion>,
}

struct Shared<S, K> {
    config:      SimConfig,
    warehouses:  WarehouseSet,
    solver:      Arc<S>,
    sink:        K,
    state:       Mutex<TickState>,
    completions: mpsc::UnboundedSender<Completion>,
    running:     AtomicBool,
    /// Bumped on every stop; completions from older sessions are dropped.
    generation:  AtomicU64,
    /// `f64` bits of the current speed factor.
    speed_bits:  AtomicU64,
    timer:       std::sync::Mutex<Option<JoinHandle<()>>>,
    runtime:     Handle,
    counters:    Counters,
}

// ── SimulationScheduler ───────────────────────────────────────────────────────

/// Drives a [`RouteFleetManager`] on a wall-clock timer.
///
/// Each timer fire runs one tick on the blocking pool.  A tick that finds
/// the guard held by the previous one is skipped, never queued; simulated
/// time is not caught up.  Changing the speed only changes how often ticks
/// fire.
///
/// Dropping the scheduler stops it.
pub struct SimulationScheduler<S: RouteSolver + 'static, K: ObservationSink> {
    shared: Arc<Shared<S, K>>,
}

impl<S: RouteSolver + 'static, K: ObservationSink> SimulationScheduler<S, K> {
    /// Create a stopped scheduler.  Must be called from within a tokio
    /// runtime, which is used for the timer and routing tasks.
    ///
    /// # Errors
    ///
    /// `Config` if `config` fails validation, `Runtime` outside a runtime.
    pub fn new(config: SimConfig, warehouses: WarehouseSet, solver: S, sink: K) -> SimResult<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|e| SimError::Runtime(e.to_string()))?;
        let (tx, rx) = mpsc::unbounded_channel();

        let state = TickState { fleet: None, clock: config.make_clock(), completions: rx };
        let speed_bits = AtomicU64::new(config.speed_factor.to_bits());

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                warehouses,
                solver: Arc::new(solver),
                sink,
                state: Mutex::new(state),
                completions: tx,
                running: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                speed_bits,
                timer: std::sync::Mutex::new(None),
                runtime,
                counters: Counters::default(),
            }),
        })
    }

    /// Load warehouses from `source`, then [`new`](Self::new).
    ///
    /// # Errors
    ///
    /// `Setup` if the source fails to load or is empty.
    pub fn from_source(
        config: SimConfig,
        source: &dyn WarehouseSource,
        solver: S,
        sink:   K,
    ) -> SimResult<Self> {
        let warehouses = source.load()?;
        info!("[Scheduler] loaded {} warehouses", warehouses.len());
        Self::new(config, warehouses, solver, sink)
    }

    // ── Controls ──────────────────────────────────────────────────────────

    /// Build a fresh fleet and start the periodic timer.
    ///
    /// # Errors
    ///
    /// `AlreadyRunning` if a session is active.
    pub async fn start(&self) -> SimResult<()> {
        self.begin(true).await
    }

    /// Build a fresh fleet without starting the timer; ticks are driven by
    /// [`tick_once`](Self::tick_once).
    pub async fn start_manual(&self) -> SimResult<()> {
        self.begin(false).await
    }

    /// Halt the timer immediately.  Routing requests already in flight run
    /// to completion but their results are discarded.  The stopped fleet
    /// stays readable through [`with_fleet`](Self::with_fleet).
    pub fn stop(&self) {
        let shared = &self.shared;
        if !shared.running.swap(false, Ordering::SeqCst) {
            return;
        }
        shared.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(timer) = shared.timer.lock().unwrap_or_else(PoisonError::into_inner).take() {
            timer.abort();
        }
        info!("[Scheduler] stopped");
    }

    /// [`stop`](Self::stop), then wait for a tick already in progress to
    /// finish.  Nothing reaches the sink after this returns.
    pub async fn shutdown(&self) {
        self.stop();
        drop(self.shared.state.lock().await);
    }

    /// Change the wall-clock cadence.  A running timer is rescheduled with
    /// the new interval; the simulated step per tick is unchanged.
    ///
    /// # Errors
    ///
    /// `InvalidSpeed` unless `speed_factor` is positive and finite.
    pub fn set_speed(&self, speed_factor: f64) -> SimResult<()> {
        validate_speed(speed_factor).map_err(|_| SimError::InvalidSpeed(speed_factor))?;
        self.shared.speed_bits.store(speed_factor.to_bits(), Ordering::SeqCst);

        let mut timer = self.shared.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = timer.take() {
            old.abort();
            *timer = Some(spawn_timer(&self.shared));
        }
        info!("[Scheduler] speed set to {speed_factor} ({:?} per tick)", interval_for_speed(speed_factor));
        Ok(())
    }

    /// Run one tick now, subject to the same guard as timer ticks.
    pub fn tick_once(&self) -> TickOutcome {
        run_tick(&self.shared)
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn speed(&self) -> f64 {
        f64::from_bits(self.shared.speed_bits.load(Ordering::SeqCst))
    }

    /// Current wall-clock interval between ticks.
    pub fn interval(&self) -> Duration {
        interval_for_speed(self.speed())
    }

    pub fn config(&self) -> &SimConfig {
        &self.shared.config
    }

    pub fn sink(&self) -> &K {
        &self.shared.sink
    }

    pub fn stats(&self) -> SchedulerStats {
        let c = &self.shared.counters;
        SchedulerStats {
            ticks_run:           c.ticks_run.load(Ordering::SeqCst),
            ticks_skipped:       c.ticks_skipped.load(Ordering::SeqCst),
            requests_issued:     c.requests_issued.load(Ordering::SeqCst),
            responses_discarded: c.responses_discarded.load(Ordering::SeqCst),
            requests_in_flight:  c.requests_in_flight.load(Ordering::SeqCst),
        }
    }

    /// Read the fleet under the tick guard.  Waits for a running tick to
    /// finish.  `None` before the first start.
    pub async fn with_fleet<R>(&self, f: impl FnOnce(&RouteFleetManager) -> R) -> Option<R> {
        let state = self.shared.state.lock().await;
        state.fleet.as_ref().map(f)
    }

    /// Wait until no routing request is in flight, polling every `poll`.
    pub async fn wait_for_routing(&self, poll: Duration) {
        while self.shared.counters.requests_in_flight.load(Ordering::SeqCst) > 0 {
            tokio::time::sleep(poll).await;
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────

    async fn begin(&self, with_timer: bool) -> SimResult<()> {
        let shared = &self.shared;
        let mut state = shared.state.lock().await;
        if shared.running.load(Ordering::SeqCst) {
            return Err(SimError::AlreadyRunning);
        }

        let mut fleet = RouteFleetManager::new(shared.warehouses.clone(), shared.config.clone());
        let solver = Arc::clone(&shared.solver);
        let fleet = tokio::task::spawn_blocking(move || {
            fleet.populate(&*solver);
            fleet
        })
        .await
        .map_err(|e| SimError::Join(e.to_string()))?;

        let mut stale = 0;
        while state.completions.try_recv().is_ok() {
            stale += 1;
        }
        shared.counters.responses_discarded.fetch_add(stale, Ordering::SeqCst);

        info!(
            "[Scheduler] starting with {} routes from {} warehouses",
            fleet.len(),
            shared.warehouses.len(),
        );
        state.fleet = Some(fleet);
        state.clock = shared.config.make_clock();
        shared.running.store(true, Ordering::SeqCst);

        if with_timer {
            let mut timer = shared.timer.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(old) = timer.take() {
                old.abort();
            }
            *timer = Some(spawn_timer(shared));
        }
        Ok(())
    }
}

impl<S: RouteSolver + 'static, K: ObservationSink> Drop for SimulationScheduler<S, K> {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Timer ─────────────────────────────────────────────────────────────────────

fn spawn_timer<S, K>(shared: &Arc<Shared<S, K>>) -> JoinHandle<()>
where
    S: RouteSolver + 'static,
    K: ObservationSink,
{
    let speed = f64::from_bits(shared.speed_bits.load(Ordering::SeqCst));
    let period = interval_for_speed(speed);
    let first = Instant::now() + shared.config.start_delay();
    let shared_tick = Arc::clone(shared);

    shared.runtime.spawn(async move {
        let mut ticker = tokio::time::interval_at(first, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let shared = Arc::clone(&shared_tick);
            // Fire and move on: an overlapping tick is skipped by the guard.
            drop(tokio::task::spawn_blocking(move || run_tick(&shared)));
        }
    })
}

// ── Tick body ─────────────────────────────────────────────────────────────────

fn run_tick<S, K>(shared: &Arc<Shared<S, K>>) -> TickOutcome
where
    S: RouteSolver + 'static,
    K: ObservationSink,
{
    let Ok(mut guard) = shared.state.try_lock() else {
        let skipped = shared.counters.ticks_skipped.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("[Scheduler] previous tick still running, skipped ({skipped} total)");
        return TickOutcome::Skipped;
    };
    if !shared.running.load(Ordering::SeqCst) {
        return TickOutcome::Stopped;
    }

    let generation = shared.generation.load(Ordering::SeqCst);
    let TickState { fleet, clock, completions } = &mut *guard;
    let Some(fleet) = fleet.as_mut() else {
        return TickOutcome::Stopped;
    };
    let now = clock.current_tick;

    // ① Apply routing completions from this session.
    let mut applied = 0;
    while let Ok(completion) = completions.try_recv() {
        if completion.generation != generation {
            shared.counters.responses_discarded.fetch_add(1, Ordering::SeqCst);
            continue;
        }
        fleet.apply(completion.response, now);
        applied += 1;
    }

    // ② Advance.
    let observations = fleet.advance_all(clock.step_secs);

    // ③ Reconcile.
    let reconciliation = fleet.reconcile(now);

    // ④ Publish.
    shared.sink.publish(now, &observations);
    for &id in &reconciliation.retired {
        shared.sink.retire(id);
    }

    // ⑤ Issue routing requests.
    let requests = reconciliation.requests.len();
    for request in reconciliation.requests {
        issue(shared, generation, request);
    }

    clock.advance();
    shared.counters.ticks_run.fetch_add(1, Ordering::SeqCst);

    TickOutcome::Ran(TickReport {
        tick: now,
        applied,
        observations: observations.len(),
        retired: reconciliation.retired.len(),
        requests,
    })
}

/// Solve `request` on the blocking pool and queue the completion.
fn issue<S, K>(shared: &Arc<Shared<S, K>>, generation: u64, request: RouteRequest)
where
    S: RouteSolver + 'static,
    K: ObservationSink,
{
    shared.counters.requests_issued.fetch_add(1, Ordering::SeqCst);
    shared.counters.requests_in_flight.fetch_add(1, Ordering::SeqCst);

    let task = Arc::clone(shared);
    drop(shared.runtime.spawn_blocking(move || {
        let response = request.solve(&*task.solver);
        if task.completions.send(Completion { generation, response }).is_err() {
            warn!("[Scheduler] completion queue closed, dropping routing result");
        }
        task.counters.requests_in_flight.fetch_sub(1, Ordering::SeqCst);
    }));
}
