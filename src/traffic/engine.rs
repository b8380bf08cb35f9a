//! Traffic event engine
//!
//! Rolls for new events on moving vehicles and ticks down the active one.

use super::events::{TrafficEvent, TrafficEventKind, TrafficEventState, TrafficModifiers};
use crate::types::SensorKind;
use crate::vehicle::{TripParameters, TripProfile};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Occurrence rates and duration ranges of traffic events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficRates {
    /// Congestion episodes per hour of driving
    pub congestion_per_hour: f64,
    /// Signal stops per hour at urban speeds
    pub urban_signal_stops_per_hour: f64,
    /// Signal stops per hour at highway speeds
    pub highway_signal_stops_per_hour: f64,
    /// Average speeds at or below this count as urban driving
    pub urban_speed_threshold_mph: f64,
    /// Chance of a puncture, engine or sensor failure over a whole trip
    pub mechanical_trip_probability: f64,
    /// Chance of an accident over a whole trip
    pub accident_trip_probability: f64,
    /// Congestion duration range in minutes
    pub congestion_minutes: (f64, f64),
    /// Signal stop duration range in minutes
    pub signal_stop_minutes: (f64, f64),
    /// Congested speed as a fraction of the average
    pub congestion_speed_factor: (f64, f64),
    /// Pressure a punctured tire settles at, in PSI
    pub puncture_residual_psi: (f64, f64),
    /// Temperature dip while standing at a signal, in °F
    pub signal_stop_temperature_dip: (f64, f64),
    /// Chance that a sensor failure lasts for the rest of the trip
    pub permanent_sensor_failure_probability: f64,
    /// Length of a temporary sensor failure, in intervals
    pub sensor_failure_intervals: (u32, u32),
}

impl Default for TrafficRates {
    fn default() -> Self {
        Self {
            congestion_per_hour: 0.4,
            urban_signal_stops_per_hour: 8.0,
            highway_signal_stops_per_hour: 0.5,
            urban_speed_threshold_mph: 35.0,
            mechanical_trip_probability: 0.10,
            accident_trip_probability: 0.05,
            congestion_minutes: (5.0, 30.0),
            signal_stop_minutes: (0.5, 2.0),
            congestion_speed_factor: (0.2, 0.3),
            puncture_residual_psi: (5.0, 15.0),
            signal_stop_temperature_dip: (0.5, 1.5),
            permanent_sensor_failure_probability: 0.5,
            sensor_failure_intervals: (2, 6),
        }
    }
}

impl TrafficRates {
    /// Rates with every event disabled
    pub fn disabled() -> Self {
        Self {
            congestion_per_hour: 0.0,
            urban_signal_stops_per_hour: 0.0,
            highway_signal_stops_per_hour: 0.0,
            mechanical_trip_probability: 0.0,
            accident_trip_probability: 0.0,
            ..Self::default()
        }
    }
}

/// Per-interval trigger probabilities for one trip
#[derive(Debug, Clone, Copy, PartialEq)]
struct IntervalProbabilities {
    accident: f64,
    tire_puncture: f64,
    engine_failure: f64,
    sensor_failure: f64,
    congestion: f64,
    signal_stop: f64,
}

/// Decides which traffic event, if any, shapes each interval of a trip
#[derive(Debug, Clone)]
pub struct TrafficEventEngine {
    enabled: bool,
    rates: TrafficRates,
    interval_minutes: f64,
    probabilities: IntervalProbabilities,
}

impl TrafficEventEngine {
    /// Create an engine for trips described by `params`
    pub fn new(enabled: bool, rates: TrafficRates, params: &TripParameters) -> Self {
        let interval_hours = params.interval_hours();
        let cycles = f64::from(params.total_cycles.max(1));

        // Poisson arrivals for recurring events
        let per_interval = |per_hour: f64| 1.0 - (-per_hour.max(0.0) * interval_hours).exp();
        // Spread a whole-trip probability evenly across its intervals
        let per_trip = |p: f64| 1.0 - (1.0 - p.clamp(0.0, 1.0)).powf(1.0 / cycles);

        let signal_rate = if params.average_speed_mph <= rates.urban_speed_threshold_mph {
            rates.urban_signal_stops_per_hour
        } else {
            rates.highway_signal_stops_per_hour
        };
        let mechanical = per_trip(rates.mechanical_trip_probability) / 3.0;

        let probabilities = IntervalProbabilities {
            accident: per_trip(rates.accident_trip_probability),
            tire_puncture: mechanical,
            engine_failure: mechanical,
            sensor_failure: mechanical,
            congestion: per_interval(rates.congestion_per_hour),
            signal_stop: per_interval(signal_rate),
        };

        Self { enabled, rates, interval_minutes: f64::from(params.interval_minutes), probabilities }
    }

    /// Whether events are simulated at all
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Modifiers for the vehicle's current interval.
    ///
    /// Ticks down an active event, or rolls for a new one when none is active.
    /// Parked vehicles and disabled engines never see an event.
    pub fn step<R: Rng + ?Sized>(&self, profile: &mut TripProfile, rng: &mut R) -> TrafficModifiers {
        if !self.enabled || !profile.is_moving() || !profile.is_active() {
            return TrafficModifiers::none();
        }

        if let Some(state) = profile.active_event.as_mut() {
            let kind = state.event.kind();
            let modifiers = state.event.modifiers();
            if state.tick(self.interval_minutes) {
                profile.active_event = None;
                debug!(kind = %kind, vin = %profile.vin(), "Traffic event cleared");
            }
            return modifiers;
        }

        let Some(event) = self.roll(profile, rng) else {
            return TrafficModifiers::none();
        };

        let mut state = TrafficEventState {
            event,
            remaining_minutes: self.duration_minutes(&event, rng),
            started_cycle: profile.cycle(),
        };
        let mut modifiers = event.modifiers();
        modifiers.started = Some(event.kind());

        if !state.tick(self.interval_minutes) {
            profile.active_event = Some(state);
        }
        modifiers
    }

    /// Single roll against the cumulative per-interval thresholds
    fn roll<R: Rng + ?Sized>(&self, profile: &TripProfile, rng: &mut R) -> Option<TrafficEvent> {
        let p = &self.probabilities;
        let thresholds = [
            (TrafficEventKind::Accident, p.accident),
            (TrafficEventKind::TirePuncture, p.tire_puncture),
            (TrafficEventKind::EngineFailure, p.engine_failure),
            (TrafficEventKind::SensorFailure, p.sensor_failure),
            (TrafficEventKind::Congestion, p.congestion),
            (TrafficEventKind::SignalStop, p.signal_stop),
        ];

        let roll = rng.gen::<f64>();
        let mut cumulative = 0.0;
        for (kind, probability) in thresholds {
            cumulative += probability;
            if roll < cumulative {
                return Some(self.instantiate(kind, profile, rng));
            }
        }
        None
    }

    /// Draw the severity parameters of a new event
    fn instantiate<R: Rng + ?Sized>(
        &self,
        kind: TrafficEventKind,
        profile: &TripProfile,
        rng: &mut R,
    ) -> TrafficEvent {
        let wheel = profile
            .wheels()
            .choose(rng)
            .map(|w| w.position)
            .unwrap_or_else(|| profile.params().wheels[0]);

        match kind {
            TrafficEventKind::Congestion => TrafficEvent::Congestion {
                speed_factor: uniform(rng, self.rates.congestion_speed_factor),
            },
            TrafficEventKind::SignalStop => TrafficEvent::SignalStop {
                temperature_dip: uniform(rng, self.rates.signal_stop_temperature_dip),
            },
            TrafficEventKind::TirePuncture => TrafficEvent::TirePuncture {
                wheel,
                residual_psi: uniform(rng, self.rates.puncture_residual_psi),
            },
            TrafficEventKind::EngineFailure => TrafficEvent::EngineFailure,
            TrafficEventKind::SensorFailure => TrafficEvent::SensorFailure {
                wheel,
                sensor: if rng.gen_bool(0.5) { SensorKind::Pressure } else { SensorKind::Temperature },
            },
            TrafficEventKind::Accident => TrafficEvent::Accident,
        }
    }

    /// How long a new event lasts; `None` persists until the trip ends
    fn duration_minutes<R: Rng + ?Sized>(&self, event: &TrafficEvent, rng: &mut R) -> Option<f64> {
        match event {
            TrafficEvent::Congestion { .. } => Some(uniform(rng, self.rates.congestion_minutes)),
            TrafficEvent::SignalStop { .. } => Some(uniform(rng, self.rates.signal_stop_minutes)),
            TrafficEvent::SensorFailure { .. } => {
                if rng.gen::<f64>() < self.rates.permanent_sensor_failure_probability {
                    None
                } else {
                    let (low, high) = self.rates.sensor_failure_intervals;
                    let intervals = rng.gen_range(low.min(high)..=high.max(low));
                    Some(f64::from(intervals) * self.interval_minutes)
                }
            }
            TrafficEvent::TirePuncture { .. } | TrafficEvent::EngineFailure => None,
            TrafficEvent::Accident => Some(0.0),
        }
    }
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, (low, high): (f64, f64)) -> f64 {
    if high > low {
        rng.gen_range(low..=high)
    } else {
        low
    }
}
