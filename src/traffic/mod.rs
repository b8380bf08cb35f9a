//! Stochastic traffic events
//!
//! Each moving vehicle may have at most one active [`TrafficEvent`]. The
//! [`TrafficEventEngine`] rolls for new events once per interval while none is
//! active, ticks down the active one otherwise, and turns it into the
//! [`TrafficModifiers`] the simulation loop applies to that interval's readings.

pub mod engine;
pub mod events;

pub use engine::*;
pub use events::*;
