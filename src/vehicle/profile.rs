//! Per-vehicle trip state
//!
//! A [`TripProfile`] is created once per vehicle from the shared
//! [`TripParameters`] and that vehicle's own random stream. The simulation
//! loop reads readings from it every interval and then advances it.

use super::wheel_layout::WheelPosition;
use crate::route::RoutePlan;
use crate::traffic::{TrafficEventState, TrafficModifiers};
use crate::types::{SimulationConfig, Vin, VehicleClass};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Pressure noise amplitude for moving vehicles, in PSI
pub const MOVING_PRESSURE_NOISE: f64 = 0.5;

/// Pressure noise amplitude for parked vehicles, in PSI
pub const STATIONARY_PRESSURE_NOISE: f64 = 0.2;

/// Temperature noise amplitude, in °F
pub const TEMPERATURE_NOISE: f64 = 1.0;

/// Asymptotic tire temperature rise over a full trip, in °F
pub const MAX_TEMPERATURE_RISE: f64 = 10.0;

/// Upper bound of the extra heat on rear axles, in °F
pub const REAR_AXLE_BIAS: f64 = 2.0;

/// Run-wide trip parameters shared by every vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripParameters {
    /// Tenant written on every row
    pub tenant: String,
    /// Wheel positions in emission order
    pub wheels: Vec<WheelPosition>,
    /// Vehicle class
    pub vehicle_class: VehicleClass,
    /// Ambient temperature in °F
    pub ambient_temperature_f: f64,
    /// Configured average speed in mph
    pub average_speed_mph: f64,
    /// Minutes between readings
    pub interval_minutes: u32,
    /// Time of the first reading
    pub trip_start: DateTime<Utc>,
    /// Route length in miles
    pub distance_miles: f64,
    /// Trip duration in hours
    pub duration_hours: f64,
    /// Number of reading cycles for a vehicle that is never stopped early
    pub total_cycles: u32,
}

impl TripParameters {
    /// Derive trip parameters from the configuration and resolved route
    pub fn new(
        config: &SimulationConfig,
        plan: &RoutePlan,
        tenant: String,
        trip_start: DateTime<Utc>,
    ) -> Result<Self, crate::types::ConfigValidationError> {
        let wheels = super::positions(config.wheel_count)?;
        let duration_hours = plan.duration_hours(config.average_speed_mph);

        Ok(Self {
            tenant,
            wheels,
            vehicle_class: config.vehicle_class,
            ambient_temperature_f: config.ambient_temperature_f,
            average_speed_mph: config.average_speed_mph,
            interval_minutes: config.interval_minutes,
            trip_start,
            distance_miles: plan.distance_miles,
            duration_hours,
            total_cycles: cycle_count(duration_hours, config.interval_minutes),
        })
    }

    /// Whether vehicles stay parked
    pub fn is_stationary(&self) -> bool {
        self.average_speed_mph <= 0.0
    }

    /// Interval length in hours
    pub fn interval_hours(&self) -> f64 {
        f64::from(self.interval_minutes) / 60.0
    }
}

/// Number of reading cycles covering a trip; at least one
pub fn cycle_count(duration_hours: f64, interval_minutes: u32) -> u32 {
    if interval_minutes == 0 || !duration_hours.is_finite() {
        return 1;
    }
    let cycles = (duration_hours * 60.0 / f64::from(interval_minutes) - 1e-9).ceil();
    cycles.clamp(1.0, f64::from(u32::MAX)) as u32
}

/// Lifecycle of a vehicle's stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripLifecycle {
    /// Still emitting
    Active,
    /// Every cycle emitted
    Completed,
    /// Stopped by an accident; no further rows
    Terminated,
}

/// Baseline and thermal state of one wheel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelState {
    /// Wheel position
    pub position: WheelPosition,
    /// Pressure drawn at trip start, in PSI
    pub baseline_pressure: f64,
    /// Accumulated temperature rise, in °F
    pub temperature_rise: f64,
}

/// State of one vehicle's trip
#[derive(Debug, Clone)]
pub struct TripProfile {
    vin: Vin,
    wheels: Vec<WheelState>,
    params: TripParameters,
    cycle: u32,
    distance_covered: f64,
    lifecycle: TripLifecycle,
    /// Traffic event currently shaping this vehicle's readings
    pub active_event: Option<TrafficEventState>,
}

impl TripProfile {
    /// Create the profile of a vehicle, drawing its VIN and baselines from `rng`
    pub fn new<R: Rng + ?Sized>(params: &TripParameters, rng: &mut R) -> Self {
        let vin = Vin::generate(rng);
        let (low, high) = params.vehicle_class.baseline_range();
        let wheels = params
            .wheels
            .iter()
            .map(|&position| WheelState {
                position,
                baseline_pressure: rng.gen_range(low..=high),
                temperature_rise: 0.0,
            })
            .collect();

        Self {
            vin,
            wheels,
            params: params.clone(),
            cycle: 0,
            distance_covered: 0.0,
            lifecycle: TripLifecycle::Active,
            active_event: None,
        }
    }

    /// Vehicle identification number
    pub fn vin(&self) -> &Vin {
        &self.vin
    }

    /// Wheel states in emission order
    pub fn wheels(&self) -> &[WheelState] {
        &self.wheels
    }

    /// Shared trip parameters
    pub fn params(&self) -> &TripParameters {
        &self.params
    }

    /// Index of the cycle about to be emitted
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    /// Current lifecycle state
    pub fn lifecycle(&self) -> TripLifecycle {
        self.lifecycle
    }

    /// Whether another cycle should be emitted
    pub fn is_active(&self) -> bool {
        self.lifecycle == TripLifecycle::Active
    }

    /// Whether the vehicle is configured to move
    pub fn is_moving(&self) -> bool {
        !self.params.is_stationary()
    }

    /// Miles covered so far
    pub fn distance_covered(&self) -> f64 {
        self.distance_covered
    }

    /// Elapsed time since trip start for the current cycle
    pub fn elapsed(&self) -> Duration {
        Duration::minutes(i64::from(self.cycle) * i64::from(self.params.interval_minutes))
    }

    /// Timestamp of the current cycle's readings
    pub fn read_at(&self) -> DateTime<Utc> {
        self.params.trip_start + self.elapsed()
    }

    /// GPS rows go out on every second cycle, never the first
    pub fn is_gps_cycle(&self) -> bool {
        self.cycle % 2 == 1
    }

    /// Fraction of the route already driven
    pub fn route_fraction(&self) -> f64 {
        if self.params.is_stationary() {
            return 0.0;
        }
        if self.params.distance_miles > 0.0 {
            (self.distance_covered / self.params.distance_miles).clamp(0.0, 1.0)
        } else {
            f64::from(self.cycle) / f64::from(self.params.total_cycles.max(1))
        }
    }

    /// Current position on the route; parked vehicles report the start
    pub fn position(&self, plan: &RoutePlan) -> crate::route::Coordinates {
        if self.params.is_stationary() {
            plan.start
        } else {
            plan.position_at(self.route_fraction())
        }
    }

    /// Effective speed in mph under the given modifiers
    pub fn effective_speed(&self, modifiers: &TrafficModifiers) -> f64 {
        self.params.average_speed_mph * modifiers.speed_factor
    }

    /// Baseline pressure plus uniform noise, clamped to the class band
    pub fn pressure_reading<R: Rng + ?Sized>(&self, wheel: &WheelState, rng: &mut R) -> f64 {
        let amplitude = if self.is_moving() { MOVING_PRESSURE_NOISE } else { STATIONARY_PRESSURE_NOISE };
        let (low, high) = self.params.vehicle_class.pressure_band();
        let value = wheel.baseline_pressure + rng.gen_range(-amplitude..=amplitude);
        round_to(value.clamp(low, high), 1)
    }

    /// Ambient plus ramp and noise while moving; ambient plus noise while parked
    pub fn temperature_reading<R: Rng + ?Sized>(
        &self,
        wheel: &WheelState,
        modifiers: &TrafficModifiers,
        rng: &mut R,
    ) -> f64 {
        let ambient = self.params.ambient_temperature_f;
        let noise = rng.gen_range(-TEMPERATURE_NOISE..=TEMPERATURE_NOISE);
        if !self.is_moving() {
            return round_to(ambient + noise, 1);
        }

        let mut value = ambient + wheel.temperature_rise + noise + modifiers.temperature_offset;
        if wheel.position.is_rear() {
            value += rng.gen_range(0.0..=REAR_AXLE_BIAS);
        }
        round_to(value, 1)
    }

    /// Move to the next cycle after the current one has been emitted
    pub fn advance(&mut self, modifiers: &TrafficModifiers) {
        if !self.is_active() {
            return;
        }

        if self.is_moving() {
            let miles = self.effective_speed(modifiers) * self.params.interval_hours();
            self.distance_covered = (self.distance_covered + miles).min(self.params.distance_miles);

            // Asymptotic rise towards the cap; never decreases
            let progress = if self.params.distance_miles > 0.0 {
                self.route_fraction()
            } else {
                f64::from(self.cycle + 1) / f64::from(self.params.total_cycles.max(1))
            };
            let target = MAX_TEMPERATURE_RISE * (1.0 - (-3.0 * progress).exp());
            for wheel in &mut self.wheels {
                let gap = (target - wheel.temperature_rise).max(0.0);
                wheel.temperature_rise += gap * modifiers.ramp_factor.clamp(0.0, 1.0);
            }
        }

        self.cycle += 1;
        if self.cycle >= self.params.total_cycles {
            self.lifecycle = TripLifecycle::Completed;
        }
    }

    /// End the stream after an accident
    pub fn terminate(&mut self) {
        self.lifecycle = TripLifecycle::Terminated;
        self.active_event = None;
    }
}

/// Round to a number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
