//! Statistics collection and reporting
//!
//! This module contains the per-vehicle summaries and the run-wide statistics
//! printed at the end of a run.

use crate::telemetry::{RowClass, SensorReading};
use crate::traffic::TrafficEventKind;
use crate::types::AnomalyKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Traffic event observed on a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedTrafficEvent {
    /// Event kind
    pub kind: TrafficEventKind,
    /// Cycle on which it started
    pub cycle: u32,
}

/// What happened to one vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleSummary {
    /// Vehicle identification number
    pub vin: String,
    /// Cycles emitted, including the terminal burst
    pub cycles_emitted: u32,
    /// Stream ended by an accident
    pub terminated: bool,
    /// Traffic events in order of occurrence
    pub traffic_events: Vec<ObservedTrafficEvent>,
    /// Lowest effective speed over the trip, in mph
    pub min_effective_speed_mph: f64,
    /// Highest effective speed over the trip, in mph
    pub max_effective_speed_mph: f64,
    /// Rows the anomaly injector rolled for
    pub candidate_rows: usize,
    /// Corruptions applied, by kind
    pub corruptions: BTreeMap<AnomalyKind, usize>,
}

impl VehicleSummary {
    /// Start a summary for a vehicle
    pub fn new(vin: impl Into<String>) -> Self {
        Self {
            vin: vin.into(),
            cycles_emitted: 0,
            terminated: false,
            traffic_events: Vec::new(),
            min_effective_speed_mph: f64::INFINITY,
            max_effective_speed_mph: f64::NEG_INFINITY,
            candidate_rows: 0,
            corruptions: BTreeMap::new(),
        }
    }

    /// Record one emitted cycle at an effective speed
    pub fn record_cycle(&mut self, effective_speed_mph: f64) {
        self.cycles_emitted += 1;
        self.min_effective_speed_mph = self.min_effective_speed_mph.min(effective_speed_mph);
        self.max_effective_speed_mph = self.max_effective_speed_mph.max(effective_speed_mph);
    }

    /// Record the start of a traffic event
    pub fn record_event(&mut self, kind: TrafficEventKind, cycle: u32) {
        self.traffic_events.push(ObservedTrafficEvent { kind, cycle });
    }

    /// Record injector activity for one interval
    pub fn record_injection(&mut self, candidates: usize, corrupted: &BTreeMap<AnomalyKind, usize>) {
        self.candidate_rows += candidates;
        for (kind, count) in corrupted {
            *self.corruptions.entry(*kind).or_insert(0) += count;
        }
    }
}

/// Run-wide statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationStatistics {
    /// Vehicles simulated
    pub vehicles: usize,
    /// Vehicles stopped by an accident
    pub terminated_vehicles: usize,
    /// Master seed of the run
    pub seed: u64,
    /// Total rows produced
    pub total_rows: usize,
    /// Rows with a pressure sensor identifier
    pub pressure_rows: usize,
    /// Rows with a temperature sensor identifier
    pub temperature_rows: usize,
    /// Latitude and longitude rows
    pub gps_rows: usize,
    /// Rows with an unrecognized sensor identifier
    pub other_rows: usize,
    /// Rows with trigger = "1"
    pub anomaly_rows: usize,
    /// Rows the anomaly injector rolled for
    pub candidate_rows: usize,
    /// Traffic events started, by kind
    pub traffic_events: BTreeMap<TrafficEventKind, usize>,
    /// Corruptions applied, by kind
    pub corruptions: BTreeMap<AnomalyKind, usize>,
    /// Wall-clock generation time
    pub simulation_duration: Duration,
}

impl SimulationStatistics {
    /// Aggregate statistics from the rows and vehicle summaries of a run
    pub fn collect(seed: u64, rows: &[SensorReading], vehicles: &[VehicleSummary]) -> Self {
        let mut stats = Self { seed, vehicles: vehicles.len(), ..Self::default() };

        for row in rows {
            stats.total_rows += 1;
            match row.class() {
                RowClass::Pressure => stats.pressure_rows += 1,
                RowClass::Temperature => stats.temperature_rows += 1,
                RowClass::Latitude | RowClass::Longitude => stats.gps_rows += 1,
                RowClass::Unknown => stats.other_rows += 1,
            }
            if row.trigger.is_anomaly() {
                stats.anomaly_rows += 1;
            }
        }

        for vehicle in vehicles {
            if vehicle.terminated {
                stats.terminated_vehicles += 1;
            }
            for event in &vehicle.traffic_events {
                *stats.traffic_events.entry(event.kind).or_insert(0) += 1;
            }
            stats.candidate_rows += vehicle.candidate_rows;
            for (kind, count) in &vehicle.corruptions {
                *stats.corruptions.entry(*kind).or_insert(0) += count;
            }
        }

        stats
    }

    /// Set the generation time
    pub fn set_simulation_duration(&mut self, duration: Duration) {
        self.simulation_duration = duration;
    }

    /// Total corruptions applied
    pub fn total_corruptions(&self) -> usize {
        self.corruptions.values().sum()
    }

    /// Total traffic events started
    pub fn total_traffic_events(&self) -> usize {
        self.traffic_events.values().sum()
    }

    /// Share of injector candidates that were corrupted
    pub fn observed_anomaly_rate(&self) -> f64 {
        if self.candidate_rows == 0 {
            0.0
        } else {
            self.total_corruptions() as f64 / self.candidate_rows as f64
        }
    }

    /// Share of output rows flagged as anomalous, as a percentage
    pub fn anomaly_row_percentage(&self) -> f64 {
        if self.total_rows == 0 {
            0.0
        } else {
            (self.anomaly_rows as f64 / self.total_rows as f64) * 100.0
        }
    }

    /// Pressure rows per GPS pair
    pub fn gps_ratio(&self) -> f64 {
        let gps_pairs = self.gps_rows / 2;
        if gps_pairs == 0 {
            0.0
        } else {
            self.pressure_rows as f64 / gps_pairs as f64
        }
    }

    /// End-of-run report
    pub fn generate_summary_output(&self) -> String {
        let mut output = String::new();

        output.push_str("🎯 TPMS Telemetry Simulation Complete!\n");
        output.push_str("======================================\n\n");

        output.push_str("📊 Simulation Summary:\n");
        output.push_str(&format!("   Vehicles: {} ({} terminated by accident)\n", self.vehicles, self.terminated_vehicles));
        output.push_str(&format!("   Seed: {}\n", self.seed));
        output.push_str(&format!("   Duration: {:.2} seconds\n\n", self.simulation_duration.as_secs_f64()));

        output.push_str("📈 Row Statistics:\n");
        output.push_str(&format!("   Total Rows: {}\n", self.total_rows));
        output.push_str(&format!(
            "   Pressure: {}, Temperature: {}, GPS: {}, Other: {}\n",
            self.pressure_rows, self.temperature_rows, self.gps_rows, self.other_rows
        ));
        if self.gps_rows > 0 {
            output.push_str(&format!("   Pressure rows per GPS pair: {:.1}\n", self.gps_ratio()));
        }
        output.push_str(&format!(
            "   Flagged Rows: {} ({:.1}%)\n\n",
            self.anomaly_rows,
            self.anomaly_row_percentage()
        ));

        if !self.traffic_events.is_empty() {
            output.push_str("🚦 Traffic Events:\n");
            for (kind, count) in &self.traffic_events {
                output.push_str(&format!("   {}: {}\n", kind, count));
            }
            output.push('\n');
        }

        if self.candidate_rows > 0 {
            output.push_str("🚨 Injected Anomalies:\n");
            output.push_str(&format!(
                "   {} of {} candidate rows ({:.2}%)\n",
                self.total_corruptions(),
                self.candidate_rows,
                self.observed_anomaly_rate() * 100.0
            ));
            for (kind, count) in &self.corruptions {
                output.push_str(&format!("   {}: {}\n", kind, count));
            }
            output.push('\n');
        }

        if self.simulation_duration.as_secs_f64() > 0.0 {
            let rows_per_second = self.total_rows as f64 / self.simulation_duration.as_secs_f64();
            output.push_str("⚡ Performance:\n");
            output.push_str(&format!("   Generated {:.0} rows/second\n\n", rows_per_second));
        }

        output.push_str("💡 Summary: ");
        output.push_str(&self.generate_compact_summary());
        output.push('\n');

        output
    }

    /// One-line summary suitable for logging
    pub fn generate_compact_summary(&self) -> String {
        format!(
            "{} vehicles, {} rows ({} flagged), {} traffic events, {} injected anomalies",
            self.vehicles,
            self.total_rows,
            self.anomaly_rows,
            self.total_traffic_events(),
            self.total_corruptions()
        )
    }
}

impl Default for SimulationStatistics {
    fn default() -> Self {
        Self {
            vehicles: 0,
            terminated_vehicles: 0,
            seed: 0,
            total_rows: 0,
            pressure_rows: 0,
            temperature_rows: 0,
            gps_rows: 0,
            other_rows: 0,
            anomaly_rows: 0,
            candidate_rows: 0,
            traffic_events: BTreeMap::new(),
            corruptions: BTreeMap::new(),
            simulation_duration: Duration::from_secs(0),
        }
    }
}

impl fmt::Display for SimulationStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.generate_summary_output())
    }
}
