//! Row serialization
//!
//! Rows are written as JSON Lines or as CSV with a header, always in the
//! column order `tenant, sensor_id, vin, read_at, trigger, reading, ingested_at`.

use super::reading::SensorReading;
use crate::simulation::SimulationResult;
use crate::types::OutputFormat;
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Column names in output order
pub const COLUMNS: [&str; 7] =
    ["tenant", "sensor_id", "vin", "read_at", "trigger", "reading", "ingested_at"];

/// Writes telemetry rows in one of the supported formats
#[derive(Debug, Clone, Copy)]
pub struct RowWriter {
    format: OutputFormat,
}

impl RowWriter {
    /// Create a writer for a format
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write rows to any sink; returns the number of rows written
    pub fn write_to<W: Write>(&self, rows: &[SensorReading], sink: W) -> SimulationResult<usize> {
        match self.format {
            OutputFormat::Json => {
                let mut writer = BufWriter::new(sink);
                for row in rows {
                    let line = serde_json::to_string(row)?;
                    writeln!(writer, "{}", line)?;
                }
                writer.flush()?;
            }
            OutputFormat::Csv => {
                let mut writer = csv::Writer::from_writer(sink);
                writer.write_record(COLUMNS)?;
                for row in rows {
                    writer.write_record(row.to_record())?;
                }
                writer.flush()?;
            }
        }
        Ok(rows.len())
    }

    /// Write rows to a file, replacing it if present
    pub fn write_file<P: AsRef<Path>>(&self, rows: &[SensorReading], path: P) -> SimulationResult<usize> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let written = self.write_to(rows, file)?;
        info!(path = %path.display(), rows = written, format = %self.format, "Rows written");
        Ok(written)
    }
}

/// Default output file name, e.g. `tpms_data_moving_20240301_080000.jsonl`
pub fn default_filename(stationary: bool, format: OutputFormat, timestamp: DateTime<Utc>) -> String {
    let mode = if stationary { "stationary" } else { "moving" };
    format!("tpms_data_{}_{}.{}", mode, timestamp.format("%Y%m%d_%H%M%S"), format.extension())
}

/// Order rows by (ingested_at, vin, sensor_id)
pub fn sort_by_ingestion(rows: &mut [SensorReading]) {
    rows.sort_by(|a, b| {
        a.ingested_at
            .cmp(&b.ingested_at)
            .then_with(|| a.vin.cmp(&b.vin))
            .then_with(|| a.sensor_id.cmp(&b.sensor_id))
    });
}
