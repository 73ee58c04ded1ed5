//! `fleet-sim` — the tick engine.
//!
//! # Tick body
//!
//! ```text
//! timer fires (every 1000 / speed_factor ms)
//!   try-lock the tick guard ── busy ──▶ skip, count, return
//!   ① Apply     — drain routing completions from this session, apply each
//!   ② Advance   — every route moves tick_step_secs simulated seconds
//!   ③ Reconcile — retire Complete routes, collect new routing requests
//!   ④ Publish   — observations, then retirements, to the ObservationSink
//!   ⑤ Issue     — each request is solved on the blocking pool; its
//!                 completion is queued for step ① of a later tick
//! ```
//!
//! Routing never holds the guard, so a slow solver stalls individual routes
//! (they wait at AtDestination) rather than the whole fleet.  Completions
//! only mutate the route set from inside a tick, under the guard.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                 |
//! |---------------|----------------------------------------------------------|
//! | [`scheduler`] | `SimulationScheduler`, `TickOutcome`, `SchedulerStats`   |
//! | [`observer`]  | `ObservationSink`, `NoopSink`, `ChannelSink`             |
//! | [`error`]     | `SimError`, `SimResult<T>`                               |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Advances routes on Rayon's thread pool.                |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use fleet_core::SimConfig;
//! use fleet_dispatch::InMemoryWarehouses;
//! use fleet_sim::{NoopSink, SimulationScheduler};
//!
//! let scheduler = SimulationScheduler::from_source(
//!     SimConfig::default(), &warehouses, solver, NoopSink,
//! )?;
//! scheduler.start().await?;
//! scheduler.set_speed(20.0)?;
//! scheduler.stop();
//! ```

pub mod error;
pub mod observer;
pub mod scheduler;

#[cfg(test)]
mod tests;

pub use error::{SimError, SimResult};
pub use observer::{ChannelSink, NoopSink, ObservationBatch, ObservationSink, SinkEvent};
pub use scheduler::{SchedulerStats, SimulationScheduler, TickOutcome, TickReport};
