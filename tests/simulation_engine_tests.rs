//! Tests for the end-to-end generation loop
//!
//! These tests drive `SimulationEngine` through the public API with a fixed
//! route distance, pinned clocks and fixed seeds.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{BTreeSet, HashMap};
use tpms_telemetry_simulator::route::{FixedDistanceProvider, StaticGeocoder};
use tpms_telemetry_simulator::simulation::{SimulationEngine, SimulationOutput};
use tpms_telemetry_simulator::telemetry::{RowClass, SensorReading, Trigger};
use tpms_telemetry_simulator::traffic::{TrafficEventKind, TrafficRates};
use tpms_telemetry_simulator::types::{AnomalyKind, AnomalyMode, SimulationConfig, VehicleClass};

fn trip_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
}

fn base_config() -> SimulationConfig {
    SimulationConfig {
        average_speed_mph: 60.0,
        seed: Some(42),
        start_time: Some(trip_start()),
        tenant: Some("test1234567890".to_string()),
        ..Default::default()
    }
}

fn engine(config: SimulationConfig, miles: f64) -> SimulationEngine {
    SimulationEngine::from_locations(config, &StaticGeocoder::new(), &FixedDistanceProvider::new(miles))
        .unwrap()
        .with_reference_time(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
}

fn run(config: SimulationConfig, miles: f64) -> SimulationOutput {
    engine(config, miles).run().unwrap()
}

fn cycle_of(row: &SensorReading) -> i64 {
    (row.read_at - trip_start()).num_minutes() / 5
}

/// Twenty minutes at five-minute intervals: four cycles, GPS on the 2nd and 4th
#[test]
fn test_twenty_minute_trip_emits_36_rows() {
    let output = run(base_config(), 20.0);

    assert_eq!(output.rows.len(), 36);
    assert!(output.rows.iter().all(|row| row.trigger == Trigger::None));

    let wheel_rows = output.rows.iter().filter(|row| !row.is_gps()).count();
    assert_eq!(wheel_rows, 32);

    let gps_cycles: BTreeSet<i64> = output.rows.iter().filter(|row| row.is_gps()).map(cycle_of).collect();
    assert_eq!(gps_cycles, BTreeSet::from([1, 3]));

    let summary = &output.vehicles[0];
    assert_eq!(summary.cycles_emitted, 4);
    assert!(!summary.terminated);
}

#[test]
fn test_rows_follow_emission_order() {
    let output = run(base_config(), 20.0);
    let ids: Vec<&str> = output.rows.iter().take(10).map(|row| row.sensor_id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "sensor11_pressure",
            "sensor11_temperature",
            "sensor14_pressure",
            "sensor14_temperature",
            "sensor21_pressure",
            "sensor21_temperature",
            "sensor24_pressure",
            "sensor24_temperature",
            // second cycle starts over with the wheels
            "sensor11_pressure",
            "sensor11_temperature",
        ]
    );

    // GPS rows close out the cycle they belong to
    let first_lat = output.rows.iter().position(|row| row.sensor_id == "latitude").unwrap();
    assert_eq!(first_lat, 16);
    assert_eq!(output.rows[first_lat + 1].sensor_id, "longitude");
}

#[test]
fn test_timestamps_step_by_interval_with_fixed_lag() {
    let config = SimulationConfig { ingestion_lag_minutes: 3, ..base_config() };
    let output = run(config, 20.0);
    for row in &output.rows {
        assert_eq!(row.ingested_at - row.read_at, Duration::minutes(3));
        assert_eq!((row.read_at - trip_start()).num_minutes() % 5, 0);
    }
    let last = output.rows.last().unwrap();
    assert_eq!(last.read_at, trip_start() + Duration::minutes(15));
}

#[test]
fn test_same_seed_reproduces_rows() {
    let config = SimulationConfig {
        vehicle_count: 3,
        enable_traffic_events: true,
        enable_data_anomalies: true,
        anomaly_rate: 0.2,
        ..base_config()
    };
    let a = run(config.clone(), 120.0);
    let b = run(config, 120.0);
    assert_eq!(a.rows, b.rows);

    let vins_a: Vec<&str> = a.vehicles.iter().map(|v| v.vin.as_str()).collect();
    let vins_b: Vec<&str> = b.vehicles.iter().map(|v| v.vin.as_str()).collect();
    assert_eq!(vins_a, vins_b);
}

#[test]
fn test_different_seeds_diverge() {
    let a = run(base_config(), 60.0);
    let b = run(SimulationConfig { seed: Some(43), ..base_config() }, 60.0);
    assert_ne!(a.vehicles[0].vin, b.vehicles[0].vin);
}

#[test]
fn test_vehicles_are_concatenated_in_order() {
    let config = SimulationConfig { vehicle_count: 4, ..base_config() };
    let output = run(config, 30.0);
    assert_eq!(output.vehicles.len(), 4);

    let mut seen = Vec::new();
    for row in &output.rows {
        if seen.last() != Some(&row.vin) {
            seen.push(row.vin.clone());
        }
    }
    let expected: Vec<String> = output.vehicles.iter().map(|v| v.vin.clone()).collect();
    assert_eq!(seen, expected);

    for vehicle in &output.vehicles {
        assert_eq!(output.rows_for(&vehicle.vin).count(), output.rows.len() / 4);
    }
}

#[test]
fn test_sort_by_ingestion_orders_rows() {
    let config = SimulationConfig { vehicle_count: 3, sort_by_ingestion: true, ..base_config() };
    let output = run(config, 30.0);
    for pair in output.rows.windows(2) {
        let a = (&pair[0].ingested_at, &pair[0].vin, &pair[0].sensor_id);
        let b = (&pair[1].ingested_at, &pair[1].vin, &pair[1].sensor_id);
        assert!(a <= b);
    }
}

/// Untouched pressure rows stay in the class band, whatever the traffic
#[test]
fn test_unflagged_pressure_stays_in_band() {
    for (class, wheels) in [(VehicleClass::Regular, 4), (VehicleClass::HeavyDuty, 10)] {
        let config = SimulationConfig {
            vehicle_count: 5,
            wheel_count: wheels,
            vehicle_class: class,
            enable_traffic_events: true,
            ..base_config()
        };
        let output = run(config, 300.0);
        let (low, high) = class.pressure_band();
        for row in output.rows.iter().filter(|row| row.class() == RowClass::Pressure) {
            if row.trigger == Trigger::None {
                let value = row.reading.as_f64().unwrap();
                assert!((low..=high).contains(&value), "{} outside {}-{}", value, low, high);
            }
        }
    }
}

#[test]
fn test_disabled_traffic_never_flags_or_slows() {
    let config = SimulationConfig { vehicle_count: 6, ..base_config() };
    let output = engine(config, 300.0).with_traffic_rates(TrafficRates::default()).run().unwrap();
    assert!(output.rows.iter().all(|row| row.trigger == Trigger::None));
    for vehicle in &output.vehicles {
        assert!(vehicle.traffic_events.is_empty());
        assert_eq!(vehicle.min_effective_speed_mph, 60.0);
        assert_eq!(vehicle.max_effective_speed_mph, 60.0);
    }
    assert_eq!(output.statistics.total_traffic_events(), 0);
}

#[test]
fn test_stationary_temperature_stays_near_ambient() {
    let config = SimulationConfig {
        average_speed_mph: 0.0,
        ambient_temperature_f: 40.0,
        vehicle_count: 3,
        enable_traffic_events: true,
        ..base_config()
    };
    let output = run(config, 110.0);
    assert!(!output.rows.is_empty());

    for row in &output.rows {
        assert_eq!(row.trigger, Trigger::None);
        if row.class() == RowClass::Temperature {
            let value = row.reading.as_f64().unwrap();
            assert!((39.0..=41.0).contains(&value), "temperature {} drifted", value);
        }
    }

    // Parked vehicles report the starting point on every fix
    let latitudes: BTreeSet<String> = output
        .rows
        .iter()
        .filter(|row| row.sensor_id == "latitude")
        .map(|row| row.reading.to_string())
        .collect();
    assert_eq!(latitudes.len(), 1);
}

#[test]
fn test_stationary_pressure_noise_is_tight() {
    let config = SimulationConfig { average_speed_mph: 0.0, ..base_config() };
    let output = run(config, 110.0);

    let mut by_sensor: HashMap<&str, Vec<f64>> = HashMap::new();
    for row in output.rows.iter().filter(|row| row.class() == RowClass::Pressure) {
        by_sensor.entry(row.sensor_id.as_str()).or_default().push(row.reading.as_f64().unwrap());
    }
    for values in by_sensor.values() {
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        // Baseline ± 0.2, plus rounding to one decimal
        assert!(max - min <= 0.5 + 1e-9, "spread {} too wide", max - min);
    }
}

#[test]
fn test_moving_temperature_warms_up() {
    let output = run(base_config(), 300.0);
    let temps: Vec<f64> = output
        .rows
        .iter()
        .filter(|row| row.sensor_id == "sensor11_temperature")
        .map(|row| row.reading.as_f64().unwrap())
        .collect();
    let first = temps[0];
    let last = *temps.last().unwrap();
    assert!(last > first + 4.0, "{} -> {}", first, last);
    assert!(temps.iter().all(|t| *t <= 75.0 + 10.0 + 1.0 + 0.05));
}

#[test]
fn test_gps_fixes_move_along_the_route() {
    let config = SimulationConfig {
        start_location: "San Diego, CA".to_string(),
        end_location: "Los Angeles, CA".to_string(),
        ..base_config()
    };
    let output = run(config, 120.0);
    let latitudes: Vec<f64> = output
        .rows
        .iter()
        .filter(|row| row.sensor_id == "latitude")
        .map(|row| row.reading.as_f64().unwrap())
        .collect();
    assert!(latitudes.len() >= 2);
    assert!(latitudes.windows(2).all(|w| w[1] >= w[0]));
    assert!(latitudes[0] > 32.7 && *latitudes.last().unwrap() <= 34.06);
}

#[test]
fn test_certain_accident_ends_vehicle_after_one_burst() {
    let mut rates = TrafficRates::disabled();
    rates.accident_trip_probability = 1.0;
    let config = SimulationConfig { vehicle_count: 2, enable_traffic_events: true, ..base_config() };
    let output = engine(config, 300.0).with_traffic_rates(rates).run().unwrap();

    // One burst of eight wheel rows per vehicle, no GPS on the first cycle
    assert_eq!(output.rows.len(), 16);
    assert!(output.rows.iter().all(|row| row.trigger == Trigger::Anomaly));
    assert!(output.rows.iter().all(|row| row.read_at == trip_start()));
    assert!(output.vehicles.iter().all(|v| v.terminated && v.cycles_emitted == 1));
    assert_eq!(output.statistics.terminated_vehicles, 2);
    assert_eq!(output.statistics.traffic_events.get(&TrafficEventKind::Accident), Some(&2));

    for row in output.rows.iter().filter(|row| row.class() == RowClass::Pressure) {
        assert!(row.reading.as_f64().unwrap() <= 5.0);
    }
}

#[test]
fn test_accidents_truncate_streams() {
    let mut rates = TrafficRates::disabled();
    rates.accident_trip_probability = 0.6;
    let config = SimulationConfig { vehicle_count: 20, enable_traffic_events: true, ..base_config() };
    let output = engine(config, 300.0).with_traffic_rates(rates).run().unwrap();

    let full_cycles = output.vehicles.iter().map(|v| v.cycles_emitted).max().unwrap();
    let terminated: Vec<_> = output.vehicles.iter().filter(|v| v.terminated).collect();
    assert!(!terminated.is_empty());
    // Every vehicle still produced rows
    assert!(output.vehicles.iter().all(|v| v.cycles_emitted >= 1));

    for vehicle in terminated {
        let event = vehicle.traffic_events.last().unwrap();
        assert_eq!(event.kind, TrafficEventKind::Accident);
        assert_eq!(vehicle.cycles_emitted, event.cycle + 1);
        assert!(vehicle.cycles_emitted <= full_cycles);

        let rows: Vec<_> = output.rows_for(&vehicle.vin).collect();
        let last_cycle = rows.iter().map(|row| cycle_of(row)).max().unwrap();
        assert_eq!(last_cycle, i64::from(event.cycle));
        let burst_is_extreme = rows.iter().filter(|row| cycle_of(row) == last_cycle).any(|row| {
            row.trigger == Trigger::Anomaly
                && row.class() == RowClass::Temperature
                && row.reading.as_f64().unwrap() > 75.0 + 79.0
        });
        assert!(burst_is_extreme);
    }
}

#[test]
fn test_congestion_slows_and_flags() {
    let mut rates = TrafficRates::disabled();
    rates.congestion_per_hour = 1000.0;
    let config = SimulationConfig { enable_traffic_events: true, ..base_config() };
    let output = engine(config, 300.0).with_traffic_rates(rates).run().unwrap();

    let summary = &output.vehicles[0];
    assert!(summary.max_effective_speed_mph <= 60.0 * 0.3 + 1e-9);
    assert!(summary.traffic_events.iter().all(|e| e.kind == TrafficEventKind::Congestion));
    assert!(output.rows.iter().all(|row| row.trigger == Trigger::Anomaly));
}

#[test]
fn test_anomaly_rate_converges() {
    let config = SimulationConfig {
        vehicle_count: 80,
        wheel_count: 10,
        enable_data_anomalies: true,
        anomaly_rate: 0.10,
        anomaly_mode: AnomalyMode::Single,
        anomaly_kind: Some(AnomalyKind::NullValue),
        ..base_config()
    };
    let output = run(config, 30.0);
    let stats = &output.statistics;

    assert!(stats.candidate_rows >= 10_000, "only {} candidates", stats.candidate_rows);
    let rate = stats.observed_anomaly_rate();
    assert!((0.07..=0.13).contains(&rate), "observed rate {}", rate);

    // Null values keep every row and flag exactly the corrupted ones
    assert_eq!(stats.anomaly_rows, stats.total_corruptions());
    assert_eq!(stats.total_rows, stats.candidate_rows);
}

#[test]
fn test_single_mode_uses_one_kind() {
    let config = SimulationConfig {
        vehicle_count: 5,
        enable_data_anomalies: true,
        anomaly_rate: 0.3,
        anomaly_mode: AnomalyMode::Single,
        ..base_config()
    };
    let output = run(config, 120.0);
    let kinds: Vec<_> = output.statistics.corruptions.keys().collect();
    assert_eq!(kinds.len(), 1);
}

#[test]
fn test_mixed_mode_uses_many_kinds() {
    let config = SimulationConfig {
        vehicle_count: 10,
        enable_data_anomalies: true,
        anomaly_rate: 0.3,
        ..base_config()
    };
    let output = run(config, 120.0);
    assert!(output.statistics.corruptions.len() >= 8);
}

#[test]
fn test_corruptions_are_flagged() {
    let config = SimulationConfig {
        vehicle_count: 2,
        enable_data_anomalies: true,
        anomaly_rate: 1.0,
        anomaly_mode: AnomalyMode::Single,
        anomaly_kind: Some(AnomalyKind::OutOfRangeValue),
        ..base_config()
    };
    let output = run(config, 20.0);
    assert_eq!(output.rows.len(), 72);
    assert!(output.rows.iter().all(|row| row.trigger == Trigger::Anomaly));
}

#[test]
fn test_generated_tenant_applies_to_all_rows() {
    let config = SimulationConfig { tenant: None, vehicle_count: 2, ..base_config() };
    let output = run(config, 20.0);
    assert!(output.tenant.starts_with("test"));
    assert_eq!(output.tenant.len(), 14);
    assert!(output.rows.iter().all(|row| row.tenant == output.tenant));
}

#[test]
fn test_invalid_configuration_fails_before_generation() {
    let config = SimulationConfig { anomaly_rate: 1.5, ..base_config() };
    let result =
        SimulationEngine::from_locations(config, &StaticGeocoder::new(), &FixedDistanceProvider::new(10.0));
    assert!(result.unwrap_err().is_setup_failure());
}

#[test]
fn test_unknown_location_is_a_route_error() {
    let config = SimulationConfig { end_location: "Atlantis, XX".to_string(), ..base_config() };
    let result =
        SimulationEngine::from_locations(config, &StaticGeocoder::new(), &FixedDistanceProvider::new(10.0));
    assert_eq!(result.unwrap_err().category(), "Route Resolution");
}
