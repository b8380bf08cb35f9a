//! Core types and identifiers for the TPMS telemetry simulator
//!
//! This module contains fundamental types, identifiers, and configuration structures
//! used throughout the simulation system.
//!
//! # Overview
//!
//! - **Identifiers**: VINs, generated tenant names and UUID-based run identifiers
//! - **Enums**: Vehicle classes, sensor kinds, anomaly modes and kinds, output formats
//! - **Configuration**: Simulation configuration with validation and CLI support
//!
//! # Usage Example
//!
//! ```rust
//! use tpms_telemetry_simulator::types::*;
//!
//! let config = SimulationConfig {
//!     vehicle_count: 3,
//!     wheel_count: 10,
//!     vehicle_class: VehicleClass::HeavyDuty,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod enums;
pub mod identifiers;

// Re-export all public types for convenience
pub use config::*;
pub use enums::*;
pub use identifiers::*;
