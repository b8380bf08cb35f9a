//! Traffic event kinds, their per-vehicle state and the modifiers they produce

use crate::types::SensorKind;
use crate::vehicle::WheelPosition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of traffic event, without its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficEventKind {
    /// Slow traffic
    Congestion,
    /// Traffic light or stop sign
    SignalStop,
    /// Sudden loss of pressure in one tire
    TirePuncture,
    /// Vehicle can no longer move
    EngineFailure,
    /// One sensor reports garbage
    SensorFailure,
    /// Collision; ends the vehicle's stream
    Accident,
}

impl TrafficEventKind {
    /// Snake-case name used in logs and statistics
    pub fn as_str(&self) -> &'static str {
        match self {
            TrafficEventKind::Congestion => "congestion",
            TrafficEventKind::SignalStop => "signal_stop",
            TrafficEventKind::TirePuncture => "tire_puncture",
            TrafficEventKind::EngineFailure => "engine_failure",
            TrafficEventKind::SensorFailure => "sensor_failure",
            TrafficEventKind::Accident => "accident",
        }
    }
}

impl fmt::Display for TrafficEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A traffic event with its severity parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrafficEvent {
    /// Speed drops to a fraction of the configured average
    Congestion {
        /// Multiplier on average speed, 0.2-0.3
        speed_factor: f64,
    },
    /// Vehicle stands still; tires cool slightly
    SignalStop {
        /// Temperature drop in °F
        temperature_dip: f64,
    },
    /// One wheel loses pressure for the rest of the trip
    TirePuncture {
        /// Affected wheel
        wheel: WheelPosition,
        /// Pressure the tire settles at, 5-15 PSI
        residual_psi: f64,
    },
    /// Vehicle stops for the rest of the trip
    EngineFailure,
    /// One sensor emits out-of-band values
    SensorFailure {
        /// Wheel carrying the faulty sensor
        wheel: WheelPosition,
        /// Which of its sensors fails
        sensor: SensorKind,
    },
    /// Collision
    Accident,
}

impl TrafficEvent {
    /// Kind of this event
    pub fn kind(&self) -> TrafficEventKind {
        match self {
            TrafficEvent::Congestion { .. } => TrafficEventKind::Congestion,
            TrafficEvent::SignalStop { .. } => TrafficEventKind::SignalStop,
            TrafficEvent::TirePuncture { .. } => TrafficEventKind::TirePuncture,
            TrafficEvent::EngineFailure => TrafficEventKind::EngineFailure,
            TrafficEvent::SensorFailure { .. } => TrafficEventKind::SensorFailure,
            TrafficEvent::Accident => TrafficEventKind::Accident,
        }
    }

    /// Effect of the event on the interval being emitted
    pub fn modifiers(&self) -> TrafficModifiers {
        let mut modifiers = TrafficModifiers { active: Some(self.kind()), ..TrafficModifiers::none() };
        match *self {
            TrafficEvent::Congestion { speed_factor } => {
                modifiers.speed_factor = speed_factor;
                modifiers.ramp_factor = CONGESTION_RAMP_FACTOR;
                modifiers.flag_all = true;
            }
            TrafficEvent::SignalStop { temperature_dip } => {
                modifiers.speed_factor = 0.0;
                modifiers.ramp_factor = 0.0;
                modifiers.temperature_offset = -temperature_dip;
                modifiers.flag_all = true;
            }
            TrafficEvent::TirePuncture { wheel, residual_psi } => {
                modifiers.deflated_wheel = Some((wheel, residual_psi));
            }
            TrafficEvent::EngineFailure => {
                modifiers.speed_factor = 0.0;
                modifiers.ramp_factor = 0.0;
                modifiers.flag_all = true;
            }
            TrafficEvent::SensorFailure { wheel, sensor } => {
                modifiers.faulty_sensor = Some((wheel, sensor));
            }
            TrafficEvent::Accident => {
                modifiers.speed_factor = 0.0;
                modifiers.ramp_factor = 0.0;
                modifiers.flag_all = true;
                modifiers.crash = true;
            }
        }
        modifiers
    }
}

/// Share of the normal temperature ramp kept while crawling in congestion
pub const CONGESTION_RAMP_FACTOR: f64 = 0.25;

/// The single active event of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrafficEventState {
    /// The event and its parameters
    pub event: TrafficEvent,
    /// Minutes left; `None` persists until the trip ends
    pub remaining_minutes: Option<f64>,
    /// Cycle on which the event started
    pub started_cycle: u32,
}

impl TrafficEventState {
    /// Consume one interval; returns true once the event has run out
    pub fn tick(&mut self, interval_minutes: f64) -> bool {
        match self.remaining_minutes.as_mut() {
            Some(remaining) => {
                *remaining -= interval_minutes;
                *remaining <= 0.0
            }
            None => false,
        }
    }
}

/// Per-interval perturbations applied to a vehicle's readings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrafficModifiers {
    /// Multiplier on the configured average speed
    pub speed_factor: f64,
    /// Multiplier on the temperature ramp growth this interval
    pub ramp_factor: f64,
    /// Added to every temperature reading
    pub temperature_offset: f64,
    /// Flag every row of the interval
    pub flag_all: bool,
    /// Deflated wheel and the pressure it reports
    pub deflated_wheel: Option<(WheelPosition, f64)>,
    /// Sensor emitting out-of-band values
    pub faulty_sensor: Option<(WheelPosition, SensorKind)>,
    /// Emit an extreme burst and end the vehicle's stream
    pub crash: bool,
    /// Event in effect this interval
    pub active: Option<TrafficEventKind>,
    /// Event that started this interval
    pub started: Option<TrafficEventKind>,
}

impl TrafficModifiers {
    /// No perturbation
    pub fn none() -> Self {
        Self {
            speed_factor: 1.0,
            ramp_factor: 1.0,
            temperature_offset: 0.0,
            flag_all: false,
            deflated_wheel: None,
            faulty_sensor: None,
            crash: false,
            active: None,
            started: None,
        }
    }

    /// Whether any event shapes this interval
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

impl Default for TrafficModifiers {
    fn default() -> Self {
        Self::none()
    }
}
