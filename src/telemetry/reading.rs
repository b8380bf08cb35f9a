//! The output row

use crate::types::SensorKind;
use crate::vehicle::{LATITUDE_SENSOR_ID, LONGITUDE_SENSOR_ID};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// Timestamp layout used in every output format (UTC, millisecond precision)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Whether a row was shaped by a traffic event or an injected defect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Trigger {
    /// Normal reading
    #[default]
    None,
    /// Traffic event or injected defect
    Anomaly,
}

impl Trigger {
    /// Column value: empty for normal rows, "1" for anomalies
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::None => "",
            Trigger::Anomaly => "1",
        }
    }

    /// Whether the row is flagged
    pub fn is_anomaly(&self) -> bool {
        matches!(self, Trigger::Anomaly)
    }
}

impl Serialize for Trigger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The `reading` column
#[derive(Debug, Clone, PartialEq)]
pub enum ReadingValue {
    /// PSI, °F or a coordinate
    Number(f64),
    /// Missing value
    Null,
    /// Non-numeric text standing in for a number
    Garbage(String),
}

impl ReadingValue {
    /// Numeric value, if any
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ReadingValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Whether the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, ReadingValue::Null)
    }
}

impl fmt::Display for ReadingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingValue::Number(v) => write!(f, "{}", v),
            ReadingValue::Null => Ok(()),
            ReadingValue::Garbage(text) => write!(f, "{}", text),
        }
    }
}

impl Serialize for ReadingValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ReadingValue::Number(v) => serializer.serialize_f64(*v),
            ReadingValue::Null => serializer.serialize_none(),
            ReadingValue::Garbage(text) => serializer.serialize_str(text),
        }
    }
}

/// What a row measures, judged from its sensor identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowClass {
    /// `sensor{code}_pressure`
    Pressure,
    /// `sensor{code}_temperature`
    Temperature,
    /// `latitude`
    Latitude,
    /// `longitude`
    Longitude,
    /// Anything else
    Unknown,
}

/// One telemetry row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    /// Tenant or fleet identifier
    pub tenant: String,
    /// Sensor identifier
    pub sensor_id: String,
    /// Vehicle identifier; may be deliberately malformed
    pub vin: String,
    /// Simulated reading time
    #[serde(serialize_with = "serialize_timestamp")]
    pub read_at: DateTime<Utc>,
    /// Anomaly flag
    pub trigger: Trigger,
    /// Measured value
    pub reading: ReadingValue,
    /// Time the row reached the store
    #[serde(serialize_with = "serialize_timestamp")]
    pub ingested_at: DateTime<Utc>,
}

impl SensorReading {
    /// Create a normal numeric row
    pub fn new(
        tenant: &str,
        sensor_id: impl Into<String>,
        vin: &str,
        read_at: DateTime<Utc>,
        reading: f64,
        ingested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tenant: tenant.to_string(),
            sensor_id: sensor_id.into(),
            vin: vin.to_string(),
            read_at,
            trigger: Trigger::None,
            reading: ReadingValue::Number(reading),
            ingested_at,
        }
    }

    /// Flag the row as anomalous
    pub fn flag(&mut self) {
        self.trigger = Trigger::Anomaly;
    }

    /// Classify the row by its sensor identifier
    pub fn class(&self) -> RowClass {
        match self.sensor_id.as_str() {
            LATITUDE_SENSOR_ID => RowClass::Latitude,
            LONGITUDE_SENSOR_ID => RowClass::Longitude,
            id if id.starts_with("sensor") && id.ends_with(SensorKind::Pressure.suffix()) => {
                RowClass::Pressure
            }
            id if id.starts_with("sensor") && id.ends_with(SensorKind::Temperature.suffix()) => {
                RowClass::Temperature
            }
            _ => RowClass::Unknown,
        }
    }

    /// Whether the row carries a GPS coordinate
    pub fn is_gps(&self) -> bool {
        matches!(self.class(), RowClass::Latitude | RowClass::Longitude)
    }

    /// Fields in output column order, rendered as text
    pub fn to_record(&self) -> [String; 7] {
        [
            self.tenant.clone(),
            self.sensor_id.clone(),
            self.vin.clone(),
            format_timestamp(&self.read_at),
            self.trigger.as_str().to_string(),
            self.reading.to_string(),
            format_timestamp(&self.ingested_at),
        ]
    }
}

/// Render a timestamp in the output layout
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

fn serialize_timestamp<S: Serializer>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn row(sensor_id: &str) -> SensorReading {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap() + Duration::milliseconds(250);
        SensorReading::new("test0123456789", sensor_id, "1HGBH41JXMN109186", t, 33.2, t + Duration::minutes(2))
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(row("sensor11_pressure")).unwrap();
        assert_eq!(json["read_at"], "2024-05-01 12:30:00.250");
        assert_eq!(json["ingested_at"], "2024-05-01 12:32:00.250");
        assert_eq!(json["trigger"], "");
        assert_eq!(json["reading"], 33.2);
    }

    #[test]
    fn test_flagged_null_row() {
        let mut r = row("sensor11_temperature");
        r.flag();
        r.reading = ReadingValue::Null;
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["trigger"], "1");
        assert!(json["reading"].is_null());
        assert_eq!(r.to_record()[5], "");
    }

    #[test]
    fn test_row_classes() {
        assert_eq!(row("sensor11_pressure").class(), RowClass::Pressure);
        assert_eq!(row("sensor34_temperature").class(), RowClass::Temperature);
        assert_eq!(row("latitude").class(), RowClass::Latitude);
        assert!(row("longitude").is_gps());
        assert_eq!(row("tpms_unknown_3").class(), RowClass::Unknown);
    }

    #[test]
    fn test_record_column_order() {
        let record = row("latitude").to_record();
        assert_eq!(record[0], "test0123456789");
        assert_eq!(record[1], "latitude");
        assert_eq!(record[3], "2024-05-01 12:30:00.250");
        assert_eq!(record[4], "");
        assert_eq!(record[5], "33.2");
    }
}
