//! Enumeration types for the TPMS telemetry simulator
//!
//! This module contains the closed enumerations used by the configuration surface
//! and the generated rows: vehicle classes, sensor kinds, anomaly modes and kinds,
//! and output formats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Vehicle class, which determines the baseline tire pressure band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    /// Passenger cars and light trucks (31-35 PSI)
    Regular,
    /// Tractors, trailers and heavy trucks (85-120 PSI)
    HeavyDuty,
}

impl VehicleClass {
    /// Physically valid pressure band for this class, in PSI
    pub fn pressure_band(&self) -> (f64, f64) {
        match self {
            VehicleClass::Regular => (31.0, 35.0),
            VehicleClass::HeavyDuty => (85.0, 120.0),
        }
    }

    /// Range the per-wheel baseline is drawn from at trip start.
    ///
    /// Sits inside the class band so that baseline plus noise never leaves it.
    pub fn baseline_range(&self) -> (f64, f64) {
        match self {
            VehicleClass::Regular => (32.0, 34.0),
            VehicleClass::HeavyDuty => (90.0, 110.0),
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleClass::Regular => write!(f, "regular"),
            VehicleClass::HeavyDuty => write!(f, "heavy_duty"),
        }
    }
}

impl FromStr for VehicleClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "regular" => Ok(VehicleClass::Regular),
            "heavy_duty" | "heavy duty" | "heavy-duty" | "heavyduty" => Ok(VehicleClass::HeavyDuty),
            _ => Err(format!("Unknown vehicle class: {}", s)),
        }
    }
}

/// Physical quantity measured by a wheel sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Tire pressure in PSI
    Pressure,
    /// Tire temperature in degrees Fahrenheit
    Temperature,
}

impl SensorKind {
    /// Suffix used in sensor identifiers
    pub fn suffix(&self) -> &'static str {
        match self {
            SensorKind::Pressure => "pressure",
            SensorKind::Temperature => "temperature",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// How corruption kinds are chosen during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyMode {
    /// One corruption kind for the whole run
    Single,
    /// Each corruption picks a kind uniformly at random
    Mixed,
}

impl fmt::Display for AnomalyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyMode::Single => write!(f, "single"),
            AnomalyMode::Mixed => write!(f, "mixed"),
        }
    }
}

impl FromStr for AnomalyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(AnomalyMode::Single),
            "mixed" => Ok(AnomalyMode::Mixed),
            _ => Err(format!("Unknown anomaly mode: {}", s)),
        }
    }
}

/// Data-quality defect the anomaly injector can apply to a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Drop the affected row
    MissingSensor,
    /// Drop every row of the interval
    MissingAll,
    /// Drop a row of the interval chosen independently at random
    MissingRandom,
    /// Replace the reading with a physically impossible value
    OutOfRangeValue,
    /// Null out the reading
    NullValue,
    /// Emit the row twice
    DuplicateRecord,
    /// Move read_at before the previous reading of the same sensor
    TimestampReversal,
    /// Move read_at past the wall-clock time of the run
    FutureTimestamp,
    /// Move ingested_at before read_at
    IngestionInversion,
    /// Replace the VIN with a malformed identifier
    InvalidVin,
    /// Replace the sensor identifier with an unknown one
    InvalidSensorId,
    /// Replace the reading with non-numeric text
    CorruptedPayload,
}

impl AnomalyKind {
    /// Every corruption kind, in a stable order
    pub const ALL: [AnomalyKind; 12] = [
        AnomalyKind::MissingSensor,
        AnomalyKind::MissingAll,
        AnomalyKind::MissingRandom,
        AnomalyKind::OutOfRangeValue,
        AnomalyKind::NullValue,
        AnomalyKind::DuplicateRecord,
        AnomalyKind::TimestampReversal,
        AnomalyKind::FutureTimestamp,
        AnomalyKind::IngestionInversion,
        AnomalyKind::InvalidVin,
        AnomalyKind::InvalidSensorId,
        AnomalyKind::CorruptedPayload,
    ];

    /// Snake-case name used in configuration and statistics
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::MissingSensor => "missing_sensor",
            AnomalyKind::MissingAll => "missing_all",
            AnomalyKind::MissingRandom => "missing_random",
            AnomalyKind::OutOfRangeValue => "out_of_range_value",
            AnomalyKind::NullValue => "null_value",
            AnomalyKind::DuplicateRecord => "duplicate_record",
            AnomalyKind::TimestampReversal => "timestamp_reversal",
            AnomalyKind::FutureTimestamp => "future_timestamp",
            AnomalyKind::IngestionInversion => "ingestion_inversion",
            AnomalyKind::InvalidVin => "invalid_vin",
            AnomalyKind::InvalidSensorId => "invalid_sensor_id",
            AnomalyKind::CorruptedPayload => "corrupted_payload",
        }
    }

    /// Whether the kind removes rows instead of mutating them
    pub fn is_drop(&self) -> bool {
        matches!(
            self,
            AnomalyKind::MissingSensor | AnomalyKind::MissingAll | AnomalyKind::MissingRandom
        )
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AnomalyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        AnomalyKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("Unknown anomaly kind: {}", s))
    }
}

/// Output formats supported by the row writer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputFormat {
    /// One JSON object per line
    Json,
    /// Comma-separated values with a header row
    Csv,
}

impl OutputFormat {
    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "jsonl",
            OutputFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" | "jsonl" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_class_parsing() {
        assert_eq!("regular".parse::<VehicleClass>().unwrap(), VehicleClass::Regular);
        assert_eq!("Heavy Duty".parse::<VehicleClass>().unwrap(), VehicleClass::HeavyDuty);
        assert_eq!("heavy_duty".parse::<VehicleClass>().unwrap(), VehicleClass::HeavyDuty);
        assert!("bicycle".parse::<VehicleClass>().is_err());
    }

    #[test]
    fn test_baseline_range_inside_band() {
        for class in [VehicleClass::Regular, VehicleClass::HeavyDuty] {
            let (band_lo, band_hi) = class.pressure_band();
            let (lo, hi) = class.baseline_range();
            assert!(band_lo + 0.5 <= lo);
            assert!(hi + 0.5 <= band_hi);
        }
    }

    #[test]
    fn test_anomaly_kind_round_trip_names() {
        for kind in AnomalyKind::ALL {
            assert_eq!(kind.as_str().parse::<AnomalyKind>().unwrap(), kind);
        }
        assert_eq!("Out-Of-Range-Value".parse::<AnomalyKind>().unwrap(), AnomalyKind::OutOfRangeValue);
        assert!("meteor_strike".parse::<AnomalyKind>().is_err());
    }

    #[test]
    fn test_anomaly_kind_serde_uses_snake_case() {
        let json = serde_json::to_string(&AnomalyKind::IngestionInversion).unwrap();
        assert_eq!(json, "\"ingestion_inversion\"");
    }

    #[test]
    fn test_drop_kinds() {
        let drops: Vec<_> = AnomalyKind::ALL.iter().filter(|k| k.is_drop()).collect();
        assert_eq!(drops.len(), 3);
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert!("parquet".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Csv.extension(), "csv");
    }
}
