//! Wheel position codes and sensor identifiers
//!
//! Each wheel is identified by a two-digit code: the first digit is the axle,
//! the second the track position across that axle (1 = left outer, 4 = right
//! outer, 2 and 3 the inner duals).

use crate::types::{ConfigValidationError, SensorKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wheel counts with a defined layout
pub const SUPPORTED_WHEEL_COUNTS: [u8; 4] = [4, 6, 8, 10];

/// Sensor identifier for GPS latitude rows
pub const LATITUDE_SENSOR_ID: &str = "latitude";

/// Sensor identifier for GPS longitude rows
pub const LONGITUDE_SENSOR_ID: &str = "longitude";

const FOUR_WHEEL: [u8; 4] = [11, 14, 21, 24];
const SIX_WHEEL: [u8; 6] = [11, 14, 21, 22, 23, 24];
const EIGHT_WHEEL: [u8; 8] = [11, 14, 21, 24, 31, 32, 33, 34];
const TEN_WHEEL: [u8; 10] = [11, 14, 21, 22, 23, 24, 31, 32, 33, 34];

/// Axle-and-track code of a single wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WheelPosition(u8);

impl WheelPosition {
    /// Two-digit position code
    pub fn code(&self) -> u8 {
        self.0
    }

    /// Axle number, starting at 1 for the steer axle
    pub fn axle(&self) -> u8 {
        self.0 / 10
    }

    /// Track position across the axle
    pub fn track(&self) -> u8 {
        self.0 % 10
    }

    /// Rear wheels run slightly hotter than the steer axle
    pub fn is_rear(&self) -> bool {
        self.axle() >= 2
    }
}

impl fmt::Display for WheelPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered wheel positions for a wheel count
pub fn positions(wheel_count: u8) -> Result<Vec<WheelPosition>, ConfigValidationError> {
    let codes: &[u8] = match wheel_count {
        4 => &FOUR_WHEEL,
        6 => &SIX_WHEEL,
        8 => &EIGHT_WHEEL,
        10 => &TEN_WHEEL,
        other => return Err(ConfigValidationError::InvalidWheelCount(other)),
    };
    Ok(codes.iter().copied().map(WheelPosition).collect())
}

/// Sensor identifier for a wheel sensor, e.g. `sensor21_pressure`
pub fn sensor_id(position: WheelPosition, kind: SensorKind) -> String {
    format!("sensor{}_{}", position.code(), kind.suffix())
}

/// The fixed wheel layout of a vehicle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelLayout {
    wheel_count: u8,
    positions: Vec<WheelPosition>,
}

impl WheelLayout {
    /// Build the layout for a wheel count
    pub fn new(wheel_count: u8) -> Result<Self, ConfigValidationError> {
        Ok(Self { wheel_count, positions: positions(wheel_count)? })
    }

    /// Number of wheels
    pub fn wheel_count(&self) -> u8 {
        self.wheel_count
    }

    /// Wheel positions in emission order
    pub fn positions(&self) -> &[WheelPosition] {
        &self.positions
    }

    /// Every identifier a well-formed row of this layout may carry
    pub fn sensor_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .positions
            .iter()
            .flat_map(|&p| [sensor_id(p, SensorKind::Pressure), sensor_id(p, SensorKind::Temperature)])
            .collect();
        ids.push(LATITUDE_SENSOR_ID.to_string());
        ids.push(LONGITUDE_SENSOR_ID.to_string());
        ids
    }

    /// Check whether an identifier belongs to this layout
    pub fn is_known_sensor_id(&self, id: &str) -> bool {
        if id == LATITUDE_SENSOR_ID || id == LONGITUDE_SENSOR_ID {
            return true;
        }
        self.positions.iter().any(|&p| {
            id == sensor_id(p, SensorKind::Pressure) || id == sensor_id(p, SensorKind::Temperature)
        })
    }
}
