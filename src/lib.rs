//! TPMS Telemetry Simulator
//!
//! Synthesizes tire-pressure-monitoring telemetry for a fleet of vehicles
//! driving a route, with traffic events shaping the physics and optional
//! data-quality defects injected into the rows.
//!
//! # Overview
//!
//! Every vehicle emits one pressure and one temperature reading per wheel each
//! interval, plus a GPS fix every other interval. Rows share a seven-column
//! shape (tenant, sensor_id, vin, read_at, trigger, reading, ingested_at) and
//! anything a traffic event or the anomaly injector touched carries
//! `trigger = "1"`.
//!
//! ## Key Features
//!
//! - **Trip physics**: per-wheel pressure baselines, temperature warm-up, rear-axle bias
//! - **Traffic events**: congestion, signal stops, punctures, engine and sensor failures, accidents
//! - **Anomaly injection**: twelve corruption kinds in single or mixed mode
//! - **Deterministic runs**: a master seed fixes every random draw
//! - **Parallel generation**: vehicles run concurrently, output stays in vehicle order
//!
//! ## Quick Start
//!
//! ```rust
//! use tpms_telemetry_simulator::*;
//!
//! let config = SimulationConfig {
//!     vehicle_count: 2,
//!     seed: Some(42),
//!     distance_miles: Some(20.0),
//!     ..Default::default()
//! };
//!
//! let engine = SimulationEngine::from_locations(
//!     config,
//!     &StaticGeocoder::new(),
//!     &FixedDistanceProvider::new(20.0),
//! )?;
//! let output = engine.run()?;
//! println!("{} rows from {} vehicles", output.rows.len(), output.vehicles.len());
//! # Ok::<(), SimulationError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`types`]: configuration, enumerations and identifiers
//! - [`route`]: geocoding, route distance and legal speed
//! - [`vehicle`]: wheel layouts and per-trip physical state
//! - [`traffic`]: traffic event scheduling and effects
//! - [`anomaly`]: data-quality defect injection
//! - [`telemetry`]: row model and writers
//! - [`simulation`]: engine, statistics, errors and logging
#![warn(missing_docs, missing_debug_implementations, unreachable_pub)]

pub mod anomaly;
pub mod route;
pub mod simulation;
pub mod telemetry;
pub mod traffic;
pub mod types;
pub mod vehicle;

pub use types::{
    AnomalyKind, AnomalyMode, ConfigError, ConfigValidationError, OutputFormat, RunId, SensorKind,
    SimulationConfig, VehicleClass, Vin,
};

pub use route::{
    Coordinates, FixedDistanceProvider, Geocoder, LegalSpeedPolicy, RouteDistanceProvider, RouteError,
    RoutePlan, StaticGeocoder, StraightLineRouteProvider,
};

pub use vehicle::{TripParameters, TripProfile, WheelLayout, WheelPosition};

pub use traffic::{TrafficEvent, TrafficEventEngine, TrafficEventKind, TrafficModifiers, TrafficRates};

pub use anomaly::{AnomalyInjector, AnomalySelection, InjectionOutcome};

pub use telemetry::{ReadingValue, RowWriter, SensorReading, Trigger};

pub use simulation::{
    LoggingConfig, SimulationEngine, SimulationError, SimulationOutput, SimulationResult,
    SimulationStatistics, VehicleSummary,
};
