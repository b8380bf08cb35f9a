//! Vehicle modeling
//!
//! This module contains the fixed wheel layouts and the per-vehicle trip state
//! that the simulation loop advances interval by interval.
//!
//! # Usage Example
//!
//! ```rust
//! use tpms_telemetry_simulator::types::SensorKind;
//! use tpms_telemetry_simulator::vehicle::*;
//!
//! let layout = WheelLayout::new(6).unwrap();
//! let codes: Vec<u8> = layout.positions().iter().map(|p| p.code()).collect();
//! assert_eq!(codes, vec![11, 14, 21, 22, 23, 24]);
//! assert_eq!(sensor_id(layout.positions()[0], SensorKind::Pressure), "sensor11_pressure");
//! ```

pub mod profile;
pub mod wheel_layout;

pub use profile::*;
pub use wheel_layout::*;
