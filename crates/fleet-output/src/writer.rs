//! The `OutputWriter` trait implemented by backend writers.

use crate::{ObservationRow, OutputResult, RetirementRow, TickSummaryRow};

/// A destination for simulation output.
///
/// Errors surface through [`OutputSink::take_error`][crate::OutputSink::take_error]
/// because the sink callbacks have no return value.
pub trait OutputWriter {
    /// Write one tick's observations.
    fn write_observations(&mut self, rows: &[ObservationRow]) -> OutputResult<()>;

    /// Write one tick summary row.
    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    /// Record that an entity left the fleet.
    fn write_retirement(&mut self, row: &RetirementRow) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
