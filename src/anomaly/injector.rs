//! Row-level corruption

use super::AnomalySelection;
use crate::telemetry::{ReadingValue, RowClass, SensorReading};
use crate::types::{AnomalyKind, Vin, VIN_LENGTH};
use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

const GARBAGE_PAYLOADS: &[&str] = &["N/A", "ERR", "#VALUE!", "--", "NaN_psi", "0x1F?", "null\u{0}", "\u{fffd}\u{fffd}"];

/// Result of passing one interval through the injector
#[derive(Debug, Clone, Default)]
pub struct InjectionOutcome {
    /// Surviving rows in emission order
    pub rows: Vec<SensorReading>,
    /// Rows the injector rolled for
    pub candidates: usize,
    /// Corruptions applied, by kind
    pub corrupted: BTreeMap<AnomalyKind, usize>,
}

impl InjectionOutcome {
    /// Total corruptions applied
    pub fn corrupted_total(&self) -> usize {
        self.corrupted.values().sum()
    }
}

/// Corrupts a fraction of emitted rows
#[derive(Debug, Clone)]
pub struct AnomalyInjector {
    rate: f64,
    selection: AnomalySelection,
    interval: Duration,
    reference_time: DateTime<Utc>,
}

impl AnomalyInjector {
    /// Create an injector.
    ///
    /// `interval` is the reading interval and `reference_time` the wall-clock
    /// time of the run that future timestamps are pushed past.
    pub fn new(rate: f64, selection: AnomalySelection, interval: Duration, reference_time: DateTime<Utc>) -> Self {
        Self { rate: rate.clamp(0.0, 1.0), selection, interval, reference_time }
    }

    /// Per-row corruption probability
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Kind selection in effect
    pub fn selection(&self) -> AnomalySelection {
        self.selection
    }

    /// Pass the rows of one interval through the injector
    pub fn inject<R: Rng + ?Sized>(&self, rows: Vec<SensorReading>, rng: &mut R) -> InjectionOutcome {
        let mut outcome = InjectionOutcome { rows: Vec::with_capacity(rows.len() + 2), ..Default::default() };
        let mut random_drops = 0usize;
        let batch_size = rows.len();

        for mut row in rows {
            outcome.candidates += 1;
            if rng.gen::<f64>() >= self.rate {
                outcome.rows.push(row);
                continue;
            }

            let kind = self.selection.pick(rng);
            *outcome.corrupted.entry(kind).or_insert(0) += 1;

            match kind {
                AnomalyKind::MissingSensor => {}
                AnomalyKind::MissingAll => {
                    // The rest of the interval is lost with it
                    outcome.candidates = batch_size;
                    outcome.rows.clear();
                    return outcome;
                }
                AnomalyKind::MissingRandom => {
                    random_drops += 1;
                    outcome.rows.push(row);
                }
                AnomalyKind::DuplicateRecord => {
                    row.flag();
                    outcome.rows.push(row.clone());
                    outcome.rows.push(row);
                }
                _ => {
                    self.mutate(&mut row, kind, rng);
                    row.flag();
                    outcome.rows.push(row);
                }
            }
        }

        for _ in 0..random_drops {
            if outcome.rows.is_empty() {
                break;
            }
            let index = rng.gen_range(0..outcome.rows.len());
            outcome.rows.remove(index);
        }

        outcome
    }

    /// Apply a non-dropping corruption to a row
    pub fn mutate<R: Rng + ?Sized>(&self, row: &mut SensorReading, kind: AnomalyKind, rng: &mut R) {
        match kind {
            AnomalyKind::OutOfRangeValue => {
                row.reading = ReadingValue::Number(out_of_range_value(row.class(), rng));
            }
            AnomalyKind::NullValue => row.reading = ReadingValue::Null,
            AnomalyKind::TimestampReversal => {
                // Earlier than this sensor's previous reading. GPS reports
                // every other interval.
                let period = if row.is_gps() { self.interval * 2 } else { self.interval };
                let back = period + Duration::minutes(rng.gen_range(1..=60));
                row.read_at -= back;
            }
            AnomalyKind::FutureTimestamp => {
                let ahead = Duration::days(rng.gen_range(1..=30)) + Duration::minutes(rng.gen_range(0..1440));
                let lag = row.ingested_at - row.read_at;
                row.read_at = self.reference_time + ahead;
                row.ingested_at = row.read_at + lag;
            }
            AnomalyKind::IngestionInversion => {
                row.ingested_at = row.read_at - Duration::minutes(rng.gen_range(1..=120));
            }
            AnomalyKind::InvalidVin => row.vin = invalid_vin(&row.vin, rng),
            AnomalyKind::InvalidSensorId => row.sensor_id = invalid_sensor_id(rng),
            AnomalyKind::CorruptedPayload => {
                row.reading = ReadingValue::Garbage(garbage_payload(rng));
            }
            AnomalyKind::MissingSensor
            | AnomalyKind::MissingAll
            | AnomalyKind::MissingRandom
            | AnomalyKind::DuplicateRecord => {}
        }
    }
}

/// A value outside the physically valid band of the row's quantity
pub fn out_of_range_value<R: Rng + ?Sized>(class: RowClass, rng: &mut R) -> f64 {
    let high = rng.gen_bool(0.5);
    let value = match class {
        RowClass::Pressure if high => rng.gen_range(200.0..500.0),
        RowClass::Pressure => rng.gen_range(-50.0..-1.0),
        RowClass::Temperature if high => rng.gen_range(300.0..500.0),
        RowClass::Temperature => rng.gen_range(-100.0..-60.0),
        RowClass::Latitude => rng.gen_range(91.0..180.0),
        RowClass::Longitude => rng.gen_range(181.0..360.0),
        RowClass::Unknown => -999.0,
    };
    let signed = match class {
        RowClass::Latitude | RowClass::Longitude if !high => -value,
        _ => value,
    };
    crate::vehicle::round_to(signed, 1)
}

/// A VIN-like string that fails validation
pub fn invalid_vin<R: Rng + ?Sized>(original: &str, rng: &mut R) -> String {
    let candidate = match rng.gen_range(0..4) {
        0 => {
            let keep = rng.gen_range(5..VIN_LENGTH);
            original.chars().take(keep).collect()
        }
        1 => format!("{}{}", original, rng.gen_range(10..1000)),
        2 => {
            let mut chars: Vec<char> = original.chars().collect();
            if !chars.is_empty() {
                let at = rng.gen_range(0..chars.len());
                chars[at] = *['I', 'O', 'Q'].choose(rng).unwrap_or(&'I');
            }
            chars.into_iter().collect()
        }
        _ => format!("VIN-ERR-{:06}", rng.gen_range(0..1_000_000)),
    };

    if Vin::is_valid(&candidate) {
        format!("{}!", candidate)
    } else {
        candidate
    }
}

/// A sensor identifier outside the known identifier space
pub fn invalid_sensor_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let n = rng.gen_range(0..1000);
    match rng.gen_range(0..4) {
        0 => format!("tpms_unknown_{}", n),
        1 => format!("wheel{}_psi", n),
        2 => "gps_altitude".to_string(),
        _ => format!("tire_{}", n),
    }
}

/// Non-numeric text for a reading
pub fn garbage_payload<R: Rng + ?Sized>(rng: &mut R) -> String {
    if rng.gen_bool(0.25) {
        format!("ERR{:04X}", rng.gen_range(0..0xFFFF))
    } else {
        GARBAGE_PAYLOADS.choose(rng).unwrap_or(&"ERR").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::WheelLayout;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn interval_rows() -> Vec<SensorReading> {
        let layout = WheelLayout::new(4).unwrap();
        let t = start();
        layout
            .sensor_ids()
            .into_iter()
            .map(|id| SensorReading::new("test5555555555", id, "1HGBH41JXMN109186", t, 33.0, t + Duration::minutes(2)))
            .collect()
    }

    fn injector(rate: f64, selection: AnomalySelection) -> AnomalyInjector {
        AnomalyInjector::new(rate, selection, Duration::minutes(5), start() + Duration::hours(3))
    }

    #[test]
    fn test_zero_rate_is_identity() {
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = injector(0.0, AnomalySelection::Mixed).inject(interval_rows(), &mut rng);
        assert_eq!(outcome.rows, interval_rows());
        assert_eq!(outcome.candidates, 10);
        assert_eq!(outcome.corrupted_total(), 0);
    }

    #[test]
    fn test_observed_rate_converges() {
        let mut rng = StdRng::seed_from_u64(2024);
        let injector = injector(0.10, AnomalySelection::Single(AnomalyKind::NullValue));
        let mut candidates = 0;
        let mut corrupted = 0;
        for _ in 0..1000 {
            let outcome = injector.inject(interval_rows(), &mut rng);
            candidates += outcome.candidates;
            corrupted += outcome.rows.iter().filter(|r| r.reading.is_null()).count();
        }
        assert_eq!(candidates, 10_000);
        // Bernoulli(0.1) over 10,000 rows: sd is 30, allow five of them
        assert!((850..=1150).contains(&corrupted), "corrupted {}", corrupted);
    }

    #[test]
    fn test_every_kept_corruption_is_flagged() {
        let mut rng = StdRng::seed_from_u64(3);
        let injector = injector(1.0, AnomalySelection::Mixed);
        let base = interval_rows();
        for _ in 0..200 {
            let outcome = injector.inject(base.clone(), &mut rng);
            for row in outcome.rows.iter().filter(|row| !base.contains(row)) {
                assert!(row.trigger.is_anomaly());
            }
        }
    }

    #[test]
    fn test_full_rate_single_kinds() {
        let layout = WheelLayout::new(4).unwrap();
        let base = interval_rows();

        for kind in AnomalyKind::ALL {
            let mut rng = StdRng::seed_from_u64(kind as u64);
            let outcome = injector(1.0, AnomalySelection::Single(kind)).inject(base.clone(), &mut rng);
            let corrupted = outcome.corrupted.get(&kind).copied().unwrap_or(0);
            assert_eq!(outcome.candidates, base.len());
            if kind == AnomalyKind::MissingAll {
                assert_eq!(corrupted, 1);
            } else {
                assert_eq!(corrupted, base.len());
            }

            match kind {
                AnomalyKind::MissingSensor | AnomalyKind::MissingAll | AnomalyKind::MissingRandom => {
                    assert!(outcome.rows.is_empty(), "{} left rows", kind);
                }
                AnomalyKind::DuplicateRecord => {
                    assert_eq!(outcome.rows.len(), 20);
                    assert_eq!(outcome.rows[0], outcome.rows[1]);
                }
                _ => {
                    assert_eq!(outcome.rows.len(), 10);
                    assert!(outcome.rows.iter().all(|r| r.trigger.is_anomaly()));
                }
            }

            for (row, original) in outcome.rows.iter().zip(&base) {
                match kind {
                    AnomalyKind::OutOfRangeValue => {
                        let v = row.reading.as_f64().unwrap();
                        match original.class() {
                            RowClass::Pressure => assert!(!(0.0..=150.0).contains(&v)),
                            RowClass::Temperature => assert!(!(-50.0..=250.0).contains(&v)),
                            RowClass::Latitude => assert!(v.abs() > 90.0),
                            RowClass::Longitude => assert!(v.abs() > 180.0),
                            RowClass::Unknown => {}
                        }
                    }
                    AnomalyKind::NullValue => assert!(row.reading.is_null()),
                    AnomalyKind::TimestampReversal => {
                        assert!(row.read_at < original.read_at - Duration::minutes(5));
                    }
                    AnomalyKind::FutureTimestamp => {
                        assert!(row.read_at > start() + Duration::hours(3));
                        assert!(row.ingested_at > row.read_at);
                    }
                    AnomalyKind::IngestionInversion => assert!(row.ingested_at < row.read_at),
                    AnomalyKind::InvalidVin => assert!(!Vin::is_valid(&row.vin)),
                    AnomalyKind::InvalidSensorId => assert!(!layout.is_known_sensor_id(&row.sensor_id)),
                    AnomalyKind::CorruptedPayload => {
                        assert!(matches!(row.reading, ReadingValue::Garbage(_)));
                        assert!(row.reading.to_string().parse::<f64>().is_err());
                    }
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn test_reversed_gps_rows_skip_back_past_previous_fix() {
        let mut rng = StdRng::seed_from_u64(21);
        let injector = AnomalyInjector::new(
            1.0,
            AnomalySelection::Single(AnomalyKind::TimestampReversal),
            Duration::minutes(60),
            start(),
        );
        for _ in 0..200 {
            let outcome = injector.inject(interval_rows(), &mut rng);
            for row in &outcome.rows {
                let period = if row.is_gps() { Duration::minutes(120) } else { Duration::minutes(60) };
                assert!(row.read_at < start() - period, "{} at {}", row.sensor_id, row.read_at);
            }
        }
    }

    #[test]
    fn test_missing_all_counts_whole_interval() {
        let mut rng = StdRng::seed_from_u64(8);
        let injector = injector(0.3, AnomalySelection::Single(AnomalyKind::MissingAll));
        for _ in 0..100 {
            let outcome = injector.inject(interval_rows(), &mut rng);
            assert_eq!(outcome.candidates, 10);
            if outcome.corrupted_total() > 0 {
                assert!(outcome.rows.is_empty());
            }
        }
    }

    #[test]
    fn test_missing_random_drops_a_row_without_flagging() {
        let mut rng = StdRng::seed_from_u64(12);
        let injector = injector(0.1, AnomalySelection::Single(AnomalyKind::MissingRandom));
        for _ in 0..100 {
            let outcome = injector.inject(interval_rows(), &mut rng);
            assert_eq!(outcome.rows.len(), 10 - outcome.corrupted_total());
            assert!(outcome.rows.iter().all(|r| !r.trigger.is_anomaly()));
        }
    }

    #[test]
    fn test_invalid_vins() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..500 {
            let vin = Vin::generate(&mut rng);
            assert!(!Vin::is_valid(&invalid_vin(vin.as_str(), &mut rng)));
        }
    }
}
