//! `fleet-output` — writes what the simulator publishes to disk.
//!
//! | Backend | Files created                                                   |
//! |---------|-----------------------------------------------------------------|
//! | CSV     | `observations.csv`, `tick_summaries.csv`, `retirements.csv`     |
//!
//! Backends implement [`OutputWriter`] and are driven by [`OutputSink`],
//! which implements `fleet_sim::ObservationSink`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use fleet_output::{CsvWriter, OutputSink};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let sink = Arc::new(OutputSink::new(writer, config.tick_step_secs));
//! let scheduler = SimulationScheduler::new(config, warehouses, solver, Arc::clone(&sink))?;
//! // ... run ...
//! sink.finish()?;
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use self::csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::OutputSink;
pub use row::{ObservationRow, RetirementRow, TickSummaryRow};
pub use writer::OutputWriter;
