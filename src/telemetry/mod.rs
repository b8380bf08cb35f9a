//! Telemetry rows and their serialization
//!
//! [`SensorReading`] is the atomic output unit. [`RowWriter`] serializes a batch
//! of rows to JSON Lines or CSV.

pub mod reading;
pub mod writer;

pub use reading::*;
pub use writer::*;
