//! Simulation engine
//!
//! Drives every vehicle through its trip, one interval at a time: consult the
//! traffic engine, emit the interval's readings, route them through the
//! anomaly injector and advance the trip. Vehicles run in parallel, each on
//! its own seeded random stream, and their rows are concatenated in vehicle
//! order.

use crate::anomaly::{AnomalyInjector, AnomalySelection};
use crate::route::{Geocoder, RouteDistanceProvider, RoutePlan};
use crate::simulation::{SimulationResult, SimulationStatistics, VehicleSummary};
use crate::telemetry::{sort_by_ingestion, SensorReading};
use crate::traffic::{TrafficEventEngine, TrafficModifiers, TrafficRates};
use crate::types::{generate_tenant, RunId, SensorKind, SimulationConfig};
use crate::vehicle::{
    round_to, sensor_id, TripParameters, TripProfile, WheelState, LATITUDE_SENSOR_ID,
    LONGITUDE_SENSOR_ID,
};
use crate::{perf_span, sim_event};
use chrono::{DateTime, Duration, DurationRound, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;
use tracing::instrument;

/// Odd constant spreading per-vehicle seeds across the seed space
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Upper bound on cycles reserved up front per vehicle
const MAX_PREALLOCATED_CYCLES: usize = 4096;

/// Seed of a vehicle's random stream
pub fn vehicle_seed(master_seed: u64, index: usize) -> u64 {
    master_seed.wrapping_add((index as u64).wrapping_add(1).wrapping_mul(SEED_STRIDE))
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct SimulationOutput {
    /// Identifier of the run
    pub run_id: RunId,
    /// Master seed
    pub seed: u64,
    /// Tenant written on every row
    pub tenant: String,
    /// Time of the first reading
    pub trip_start: DateTime<Utc>,
    /// Rows in vehicle-major emission order, or ingestion order when requested
    pub rows: Vec<SensorReading>,
    /// One summary per configured vehicle, in vehicle order
    pub vehicles: Vec<VehicleSummary>,
    /// Aggregated statistics
    pub statistics: SimulationStatistics,
}

impl SimulationOutput {
    /// Rows emitted for one vehicle
    pub fn rows_for<'a>(&'a self, vin: &'a str) -> impl Iterator<Item = &'a SensorReading> + 'a {
        self.rows.iter().filter(move |row| row.vin == vin)
    }
}

/// Rows and summary of one vehicle
#[derive(Debug)]
struct VehicleRun {
    rows: Vec<SensorReading>,
    summary: VehicleSummary,
}

/// Orchestrates the per-vehicle, per-interval generation loop
#[derive(Debug, Clone)]
pub struct SimulationEngine {
    config: SimulationConfig,
    plan: RoutePlan,
    traffic_rates: TrafficRates,
    reference_time: DateTime<Utc>,
}

impl SimulationEngine {
    /// Create an engine for a validated configuration and a resolved route
    #[instrument(skip(config, plan), fields(vehicles = config.vehicle_count, wheels = config.wheel_count))]
    pub fn new(config: SimulationConfig, plan: RoutePlan) -> SimulationResult<Self> {
        config.validate()?;
        Ok(Self { config, plan, traffic_rates: TrafficRates::default(), reference_time: Utc::now() })
    }

    /// Validate the configuration, resolve its route and create an engine
    pub fn from_locations(
        config: SimulationConfig,
        geocoder: &dyn Geocoder,
        provider: &dyn RouteDistanceProvider,
    ) -> SimulationResult<Self> {
        config.validate()?;
        let plan = RoutePlan::resolve(&config, geocoder, provider)?;
        Self::new(config, plan)
    }

    /// Pin the wall-clock time of the run
    pub fn with_reference_time(mut self, reference_time: DateTime<Utc>) -> Self {
        self.reference_time = reference_time;
        self
    }

    /// Replace the traffic event rates
    pub fn with_traffic_rates(mut self, rates: TrafficRates) -> Self {
        self.traffic_rates = rates;
        self
    }

    /// Run configuration
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Resolved route
    pub fn plan(&self) -> &RoutePlan {
        &self.plan
    }

    /// Generate the rows of every vehicle
    pub fn run(&self) -> SimulationResult<SimulationOutput> {
        let started = Instant::now();
        let run_id = RunId::new();

        let seed = self.config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let mut master = StdRng::seed_from_u64(seed);

        let tenant = match &self.config.tenant {
            Some(tenant) => tenant.clone(),
            None => generate_tenant(&mut master),
        };

        let injector = if self.config.enable_data_anomalies {
            let selection =
                AnomalySelection::resolve(self.config.anomaly_mode, self.config.anomaly_kind, &mut master)?;
            Some(AnomalyInjector::new(
                self.config.anomaly_rate,
                selection,
                Duration::minutes(i64::from(self.config.interval_minutes)),
                self.reference_time,
            ))
        } else {
            None
        };

        let trip_start = self.config.start_time.unwrap_or_else(|| {
            self.reference_time.duration_trunc(Duration::minutes(1)).unwrap_or(self.reference_time)
        });
        let params = TripParameters::new(&self.config, &self.plan, tenant.clone(), trip_start)?;
        let traffic = TrafficEventEngine::new(self.config.enable_traffic_events, self.traffic_rates.clone(), &params);

        sim_event!(
            info,
            "Simulation starting",
            run_id = run_id.to_string().as_str(),
            seed = seed,
            vehicles = self.config.vehicle_count,
            cycles = params.total_cycles,
            stationary = params.is_stationary(),
            tenant = tenant.as_str(),
        );
        if let Some(injector) = &injector {
            sim_event!(
                info,
                "Anomaly injection enabled",
                rate = injector.rate(),
                selection = format!("{:?}", injector.selection()).as_str(),
            );
        }

        let runs: Vec<VehicleRun> = (0..self.config.vehicle_count)
            .into_par_iter()
            .map(|index| self.simulate_vehicle(index, vehicle_seed(seed, index), &params, &traffic, injector.as_ref()))
            .collect();

        let mut rows = Vec::with_capacity(runs.iter().map(|run| run.rows.len()).sum());
        let mut vehicles = Vec::with_capacity(runs.len());
        for run in runs {
            rows.extend(run.rows);
            vehicles.push(run.summary);
        }

        if self.config.sort_by_ingestion {
            sort_by_ingestion(&mut rows);
        }

        let mut statistics = SimulationStatistics::collect(seed, &rows, &vehicles);
        statistics.set_simulation_duration(started.elapsed());

        sim_event!(
            info,
            "Simulation complete",
            rows = rows.len(),
            flagged = statistics.anomaly_rows,
            terminated = statistics.terminated_vehicles,
            traffic_events = statistics.total_traffic_events(),
            corruptions = statistics.total_corruptions(),
        );

        Ok(SimulationOutput { run_id, seed, tenant, trip_start, rows, vehicles, statistics })
    }

    /// Run one vehicle's trip on its own random stream
    fn simulate_vehicle(
        &self,
        index: usize,
        seed: u64,
        params: &TripParameters,
        traffic: &TrafficEventEngine,
        injector: Option<&AnomalyInjector>,
    ) -> VehicleRun {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut profile = TripProfile::new(params, &mut rng);
        let span = perf_span!("vehicle", index = index, vin = profile.vin().as_str());
        let _enter = span.enter();

        let lag = Duration::minutes(i64::from(self.config.ingestion_lag_minutes));
        let mut summary = VehicleSummary::new(profile.vin().as_str());
        let mut rows = Vec::with_capacity(row_capacity(params.total_cycles, params.wheels.len()));

        while profile.is_active() {
            let cycle = profile.cycle();
            let modifiers = traffic.step(&mut profile, &mut rng);
            if let Some(kind) = modifiers.started {
                summary.record_event(kind, cycle);
                sim_event!(
                    debug,
                    "Traffic event started",
                    kind = kind.as_str(),
                    cycle = cycle,
                    vin = profile.vin().as_str(),
                );
            }

            let batch = emit_interval(&profile, &self.plan, &modifiers, lag, &mut rng);
            let batch = match injector {
                Some(injector) => {
                    let outcome = injector.inject(batch, &mut rng);
                    summary.record_injection(outcome.candidates, &outcome.corrupted);
                    outcome.rows
                }
                None => batch,
            };
            rows.extend(batch);
            summary.record_cycle(profile.effective_speed(&modifiers));

            if modifiers.crash {
                profile.terminate();
                summary.terminated = true;
                sim_event!(info, "Vehicle stopped by accident", vin = profile.vin().as_str(), cycle = cycle);
                break;
            }
            profile.advance(&modifiers);
        }

        VehicleRun { rows, summary }
    }
}

/// Rows reserved for one vehicle's stream
fn row_capacity(total_cycles: u32, wheel_count: usize) -> usize {
    (total_cycles as usize).min(MAX_PREALLOCATED_CYCLES) * (wheel_count * 2 + 1)
}

/// Readings of one interval: pressure and temperature per wheel, then GPS on
/// GPS cycles
fn emit_interval<R: Rng + ?Sized>(
    profile: &TripProfile,
    plan: &RoutePlan,
    modifiers: &TrafficModifiers,
    lag: Duration,
    rng: &mut R,
) -> Vec<SensorReading> {
    let params = profile.params();
    let read_at = profile.read_at();
    let ingested_at = read_at + lag;
    let vin = profile.vin().as_str();
    let tenant = params.tenant.as_str();

    let mut rows = Vec::with_capacity(params.wheels.len() * 2 + 2);
    for wheel in profile.wheels() {
        let (pressure, pressure_flag) = pressure_value(profile, wheel, modifiers, rng);
        let mut row = SensorReading::new(
            tenant,
            sensor_id(wheel.position, SensorKind::Pressure),
            vin,
            read_at,
            pressure,
            ingested_at,
        );
        if pressure_flag || modifiers.flag_all {
            row.flag();
        }
        rows.push(row);

        let (temperature, temperature_flag) = temperature_value(profile, wheel, modifiers, rng);
        let mut row = SensorReading::new(
            tenant,
            sensor_id(wheel.position, SensorKind::Temperature),
            vin,
            read_at,
            temperature,
            ingested_at,
        );
        if temperature_flag || modifiers.flag_all {
            row.flag();
        }
        rows.push(row);
    }

    if profile.is_gps_cycle() {
        let position = profile.position(plan);
        for (id, value) in [(LATITUDE_SENSOR_ID, position.latitude), (LONGITUDE_SENSOR_ID, position.longitude)] {
            let mut row = SensorReading::new(tenant, id, vin, read_at, round_to(value, 6), ingested_at);
            if modifiers.flag_all {
                row.flag();
            }
            rows.push(row);
        }
    }

    rows
}

/// Pressure of a wheel this interval, and whether an event shaped it
fn pressure_value<R: Rng + ?Sized>(
    profile: &TripProfile,
    wheel: &WheelState,
    modifiers: &TrafficModifiers,
    rng: &mut R,
) -> (f64, bool) {
    if modifiers.crash {
        return (round_to(rng.gen_range(0.0..5.0), 1), true);
    }
    if modifiers.faulty_sensor == Some((wheel.position, SensorKind::Pressure)) {
        let (low, high) = profile.params().vehicle_class.pressure_band();
        let value = if rng.gen_bool(0.5) {
            rng.gen_range(0.0..(low - 5.0))
        } else {
            rng.gen_range((high + 5.0)..(high * 2.0))
        };
        return (round_to(value, 1), true);
    }
    if let Some((position, residual)) = modifiers.deflated_wheel {
        if position == wheel.position {
            let value = (residual + rng.gen_range(-0.2..=0.2)).max(0.0);
            return (round_to(value, 1), true);
        }
    }
    (profile.pressure_reading(wheel, rng), false)
}

/// Temperature of a wheel this interval, and whether an event shaped it
fn temperature_value<R: Rng + ?Sized>(
    profile: &TripProfile,
    wheel: &WheelState,
    modifiers: &TrafficModifiers,
    rng: &mut R,
) -> (f64, bool) {
    let ambient = profile.params().ambient_temperature_f;
    if modifiers.crash {
        return (round_to(ambient + rng.gen_range(80.0..150.0), 1), true);
    }
    if modifiers.faulty_sensor == Some((wheel.position, SensorKind::Temperature)) {
        let value = if rng.gen_bool(0.5) {
            rng.gen_range(-60.0..-20.0)
        } else {
            rng.gen_range(250.0..400.0)
        };
        return (round_to(value, 1), true);
    }
    (profile.temperature_reading(wheel, modifiers, rng), false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Coordinates;
    use chrono::TimeZone;

    fn engine(config: SimulationConfig, miles: f64) -> SimulationEngine {
        let a = Coordinates { latitude: 32.7157, longitude: -117.1611 };
        let b = Coordinates { latitude: 33.0, longitude: -117.3 };
        SimulationEngine::new(config, RoutePlan::from_parts(a, b, miles, 55.0))
            .unwrap()
            .with_reference_time(Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap())
    }

    #[test]
    fn test_vehicle_seeds_differ() {
        assert_ne!(vehicle_seed(1, 0), vehicle_seed(1, 1));
        assert_eq!(vehicle_seed(u64::MAX, 3), vehicle_seed(u64::MAX, 3));
    }

    #[test]
    fn test_row_capacity_is_bounded() {
        assert_eq!(row_capacity(4, 4), 36);
        assert_eq!(row_capacity(u32::MAX, 4), MAX_PREALLOCATED_CYCLES * 9);
    }

    #[test]
    fn test_new_rejects_invalid_configuration() {
        let config = SimulationConfig { wheel_count: 7, ..Default::default() };
        let a = Coordinates { latitude: 0.0, longitude: 0.0 };
        let result = SimulationEngine::new(config, RoutePlan::from_parts(a, a, 1.0, 55.0));
        assert!(matches!(result, Err(crate::simulation::SimulationError::ConfigurationError(_))));
    }

    #[test]
    fn test_trip_start_defaults_to_reference_minute() {
        let config = SimulationConfig { seed: Some(1), ..Default::default() };
        let reference = Utc.with_ymd_and_hms(2024, 2, 1, 10, 17, 42).unwrap();
        let output = engine(config, 10.0).with_reference_time(reference).run().unwrap();
        assert_eq!(output.trip_start, Utc.with_ymd_and_hms(2024, 2, 1, 10, 17, 0).unwrap());
        assert_eq!(output.rows[0].read_at, output.trip_start);
        assert_eq!(output.rows[0].ingested_at, output.trip_start + Duration::minutes(2));
    }

    #[test]
    fn test_generated_tenant_comes_from_seed() {
        let config = SimulationConfig { seed: Some(99), ..Default::default() };
        let a = engine(config.clone(), 10.0).run().unwrap();
        let b = engine(config, 10.0).run().unwrap();
        assert_eq!(a.tenant, b.tenant);
        assert!(a.tenant.starts_with("test"));
        assert!(a.rows.iter().all(|row| row.tenant == a.tenant));
    }

    #[test]
    fn test_faulty_sensor_values_are_out_of_band() {
        let config = SimulationConfig { seed: Some(5), ..Default::default() };
        let engine = engine(config, 65.0);
        let params = TripParameters::new(
            engine.config(),
            engine.plan(),
            "t".to_string(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let profile = TripProfile::new(&params, &mut rng);
        let wheel = profile.wheels()[0];
        let modifiers = TrafficModifiers {
            faulty_sensor: Some((wheel.position, SensorKind::Pressure)),
            ..TrafficModifiers::none()
        };
        for _ in 0..100 {
            let (value, flagged) = pressure_value(&profile, &wheel, &modifiers, &mut rng);
            assert!(flagged);
            assert!(!(31.0..=35.0).contains(&value));
        }
    }
}
