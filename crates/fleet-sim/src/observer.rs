//! Observation sinks: where each tick's positions go.

use std::sync::Arc;

use tokio::sync::mpsc;

use fleet_core::{RouteId, Tick};
use fleet_mobility::Observation;

/// Receives the observations produced by every tick.
///
/// Called from inside the tick body while the tick guard is held, so
/// implementations should hand data off quickly.  A slow sink makes later
/// ticks skip.
pub trait ObservationSink: Send + Sync + 'static {
    /// One observation per active route, in route-id order.
    fn publish(&self, tick: Tick, observations: &[Observation]);

    /// The entity has been removed from the fleet and will not be
    /// published again.
    fn retire(&self, _entity_id: RouteId) {}
}

impl<K: ObservationSink + ?Sized> ObservationSink for Arc<K> {
    fn publish(&self, tick: Tick, observations: &[Observation]) {
        (**self).publish(tick, observations)
    }

    fn retire(&self, entity_id: RouteId) {
        (**self).retire(entity_id)
    }
}

/// A sink that discards everything.
pub struct NoopSink;

impl ObservationSink for NoopSink {
    fn publish(&self, _tick: Tick, _observations: &[Observation]) {}
}

// ── ChannelSink ───────────────────────────────────────────────────────────────

/// All observations from one tick.
#[derive(Debug, Clone)]
pub struct ObservationBatch {
    pub tick:         Tick,
    pub observations: Vec<Observation>,
}

/// What a [`ChannelSink`] forwards to its subscriber.
#[derive(Debug, Clone)]
pub enum SinkEvent {
    Batch(ObservationBatch),
    Retired(RouteId),
}

/// Forwards observations over an unbounded tokio channel so a renderer or
/// follow strategy can consume them on its own task.
///
/// Sends never block the tick.  Once the receiver is dropped events are
/// discarded.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SinkEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SinkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ObservationSink for ChannelSink {
    fn publish(&self, tick: Tick, observations: &[Observation]) {
        let batch = ObservationBatch { tick, observations: observations.to_vec() };
        let _ = self.tx.send(SinkEvent::Batch(batch));
    }

    fn retire(&self, entity_id: RouteId) {
        let _ = self.tx.send(SinkEvent::Retired(entity_id));
    }
}
