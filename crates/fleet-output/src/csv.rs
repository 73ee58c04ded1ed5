//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `observations.csv`
//! - `tick_summaries.csv`
//! - `retirements.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{ObservationRow, OutputResult, RetirementRow, TickSummaryRow};

pub const OBSERVATIONS_FILE: &str = "observations.csv";
pub const SUMMARIES_FILE:    &str = "tick_summaries.csv";
pub const RETIREMENTS_FILE:  &str = "retirements.csv";

/// Writes simulation output to three CSV files.
pub struct CsvWriter {
    observations: Writer<File>,
    summaries:    Writer<File>,
    retirements:  Writer<File>,
    finished:     bool,
}

impl CsvWriter {
    /// Create the CSV files in `dir` (which must exist) and write the
    /// header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut observations = Writer::from_path(dir.join(OBSERVATIONS_FILE))?;
        observations.write_record(["tick", "entity_id", "lon", "lat", "heading", "status_code"])?;

        let mut summaries = Writer::from_path(dir.join(SUMMARIES_FILE))?;
        summaries.write_record([
            "tick", "elapsed_secs", "en_route", "returning", "at_destination", "complete",
        ])?;

        let mut retirements = Writer::from_path(dir.join(RETIREMENTS_FILE))?;
        retirements.write_record(["tick", "entity_id"])?;

        Ok(Self {
            observations,
            summaries,
            retirements,
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_observations(&mut self, rows: &[ObservationRow]) -> OutputResult<()> {
        for row in rows {
            self.observations.write_record(&[
                row.tick.to_string(),
                row.entity_id.to_string(),
                format!("{:.7}", row.lon),
                format!("{:.7}", row.lat),
                format!("{:.2}", row.heading),
                row.status_code.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.tick.to_string(),
            row.elapsed_secs.to_string(),
            row.en_route.to_string(),
            row.returning.to_string(),
            row.at_destination.to_string(),
            row.complete.to_string(),
        ])?;
        Ok(())
    }

    fn write_retirement(&mut self, row: &RetirementRow) -> OutputResult<()> {
        self.retirements.write_record(&[row.tick.to_string(), row.entity_id.to_string()])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.observations.flush()?;
        self.summaries.flush()?;
        self.retirements.flush()?;
        Ok(())
    }
}
