//! Simulation orchestration
//!
//! - **SimulationEngine**: runs every vehicle through the trip and collects rows
//! - **SimulationStatistics**: per-run counts of rows, events and corruptions
//! - **SimulationError**: failures surfaced by setup, generation and output
//! - **LoggingConfig**: tracing subscriber setup shared by the binary and tests
//!
//! # Usage Example
//!
//! ```rust
//! use tpms_telemetry_simulator::route::{Coordinates, RoutePlan};
//! use tpms_telemetry_simulator::simulation::SimulationEngine;
//! use tpms_telemetry_simulator::types::SimulationConfig;
//!
//! let config = SimulationConfig { seed: Some(7), ..Default::default() };
//! let start = Coordinates::new(32.7157, -117.1611).unwrap();
//! let end = Coordinates::new(34.0522, -118.2437).unwrap();
//! let plan = RoutePlan::from_parts(start, end, 20.0, 55.0);
//!
//! let output = SimulationEngine::new(config, plan).unwrap().run().unwrap();
//! assert!(!output.rows.is_empty());
//! ```

pub mod engine;
pub mod error;
pub mod logging;
pub mod statistics;

pub use engine::*;
pub use error::*;
pub use logging::*;
pub use statistics::*;
