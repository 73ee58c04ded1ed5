//! `OutputSink<W>` — bridges `ObservationSink` to an `OutputWriter`.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::warn;

use fleet_core::{RouteId, Tick};
use fleet_mobility::Observation;
use fleet_sim::ObservationSink;

use crate::row::{ObservationRow, RetirementRow, TickSummaryRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// An [`ObservationSink`] that writes observations, tick summaries, and
/// retirements to any [`OutputWriter`] backend.
///
/// Errors from the writer are stored internally because sink callbacks have
/// no return value.  Check with [`take_error`][Self::take_error].  Share it
/// with the scheduler through an `Arc` to keep a handle for `finish`.
pub struct OutputSink<W: OutputWriter> {
    inner:     Mutex<Inner<W>>,
    step_secs: f64,
}

struct Inner<W> {
    writer:     W,
    last_tick:  Tick,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> OutputSink<W> {
    /// `step_secs` is the simulated step per tick, used for the summary's
    /// elapsed time.
    pub fn new(writer: W, step_secs: f64) -> Self {
        Self {
            inner: Mutex::new(Inner { writer, last_tick: Tick::ZERO, last_error: None }),
            step_secs,
        }
    }

    /// Take the stored write error (if any).
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&self) -> Option<OutputError> {
        self.lock().last_error.take()
    }

    /// Flush the writer.  Returns the first stored error, if any, before the
    /// flush result.
    pub fn finish(&self) -> OutputResult<()> {
        let mut inner = self.lock();
        if let Some(e) = inner.last_error.take() {
            return Err(e);
        }
        inner.writer.finish()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner).writer
    }

    fn lock(&self) -> MutexGuard<'_, Inner<W>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W> Inner<W> {
    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                warn!("[Output] write failed: {e}");
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter + Send + 'static> ObservationSink for OutputSink<W> {
    fn publish(&self, tick: Tick, observations: &[Observation]) {
        let rows: Vec<ObservationRow> = observations
            .iter()
            .map(|obs| ObservationRow::new(tick.0, obs))
            .collect();
        let summary = TickSummaryRow::from_observations(
            tick.0,
            (tick.0 + 1) as f64 * self.step_secs,
            observations,
        );

        let mut inner = self.lock();
        inner.last_tick = tick;
        if !rows.is_empty() {
            let result = inner.writer.write_observations(&rows);
            inner.store_err(result);
        }
        let result = inner.writer.write_tick_summary(&summary);
        inner.store_err(result);
    }

    fn retire(&self, entity_id: RouteId) {
        let mut inner = self.lock();
        let row = RetirementRow { tick: inner.last_tick.0, entity_id };
        let result = inner.writer.write_retirement(&row);
        inner.store_err(result);
    }
}
