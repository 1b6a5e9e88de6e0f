//! # Scenario Generator
//!
//! Produces synthetic logs for filter tests: periodic Time, IMU, barometer and
//! GPS records carrying constant sensor payloads.
//!
//! Each kind has its own timestamp stream starting at the same instant. The
//! streams are merged by timestamp and ids are handed out in emission order,
//! so the output has strictly increasing ids and no gaps.

use tracing::{debug, warn};

use crate::error::{EkfLogError, Result};
use crate::record::*;

/// Default first timestamp in microseconds
pub const DEFAULT_START_US: u64 = 130_000_000;

/// Default scenario length in microseconds
pub const DEFAULT_TIMESPAN_US: u64 = 15_000_000;

/// Convert a temperature in degrees Celsius to millikelvin
pub fn celsius_to_millikelvin(celsius: f64) -> u32 {
    ((celsius + 273.15) * 1000.0).round() as u32
}

/// Periods, start time and payloads of a constant-data scenario
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub start_us: u64,
    pub time_period_us: u64,
    pub imu_period_us: u64,
    pub baro_period_us: u64,
    pub gps_period_us: u64,
    pub imu: ImuData,
    pub gps: GpsData,
    pub baro: BaroData,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            start_us: DEFAULT_START_US,
            time_period_us: 2_000,
            imu_period_us: 2_000,
            baro_period_us: 40_000,
            gps_period_us: 200_000,
            // Level vehicle at rest
            imu: ImuData {
                accel: Vector3::new(0, 0, -9806),
                gyro: Vector3::default(),
                delta_angle: Vector3::default(),
                mag: Vector3::new(275, -19, -161),
            },
            gps: GpsData {
                position: GlobalPosition::default(),
                horizontal_accuracy: 1_000,
                velocity_accuracy: 1_000,
                fix: 1,
                satellite_count: 6,
                velocity: Ned::default(),
            },
            baro: BaroData {
                pressure: 101_325,
                temperature: celsius_to_millikelvin(24.0),
            },
        }
    }
}

impl Scenario {
    /// Period of a generated kind, `None` for kinds the scenario never emits
    pub fn period_us(&self, kind: RecordKind) -> Option<u64> {
        match kind {
            RecordKind::Time => Some(self.time_period_us),
            RecordKind::Imu => Some(self.imu_period_us),
            RecordKind::Baro => Some(self.baro_period_us),
            RecordKind::Gps => Some(self.gps_period_us),
            RecordKind::EkfState => None,
        }
    }

    /// Records with timestamps from `start_us` to `start_us + timespan_us`
    /// inclusive
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any period is zero.
    pub fn records(&self, timespan_us: u64) -> Result<ScenarioRecords> {
        for kind in STREAM_ORDER {
            if self.period_us(kind) == Some(0) {
                return Err(EkfLogError::Configuration(format!(
                    "{} period must be greater than 0",
                    kind
                )));
            }
        }

        let end_us = self.start_us.saturating_add(timespan_us);
        debug!(
            "Generating scenario from {} to {} us",
            self.start_us, end_us
        );

        Ok(ScenarioRecords {
            scenario: self.clone(),
            next_timestamp: [self.start_us; STREAM_ORDER.len()],
            next_id: Some(1),
            end_us,
        })
    }
}

/// Emission order for records sharing a timestamp
const STREAM_ORDER: [RecordKind; 4] = [
    RecordKind::Time,
    RecordKind::Imu,
    RecordKind::Baro,
    RecordKind::Gps,
];

/// Iterator over the records of a scenario
#[derive(Debug, Clone)]
pub struct ScenarioRecords {
    scenario: Scenario,
    next_timestamp: [u64; STREAM_ORDER.len()],
    /// `None` once id `u32::MAX` has been handed out
    next_id: Option<u32>,
    end_us: u64,
}

impl Iterator for ScenarioRecords {
    type Item = LogRecord;

    fn next(&mut self) -> Option<LogRecord> {
        let id = self.next_id?;

        // Earliest stream wins, ties go to the stream listed first
        let (stream, &timestamp) = self
            .next_timestamp
            .iter()
            .enumerate()
            .min_by_key(|&(stream, &timestamp)| (timestamp, stream))?;

        if timestamp > self.end_us {
            return None;
        }

        let kind = STREAM_ORDER[stream];
        let period = self.scenario.period_us(kind)?;
        self.next_timestamp[stream] = timestamp.saturating_add(period);

        self.next_id = id.checked_add(1);
        if self.next_id.is_none() {
            warn!("Scenario stopped at timestamp {}: record ids exhausted", timestamp);
        }

        let s = &self.scenario;
        Some(match kind {
            RecordKind::Time => LogRecord::time(id, timestamp),
            RecordKind::Imu => LogRecord::imu(id, timestamp, s.imu),
            RecordKind::Baro => LogRecord::baro(id, timestamp, s.baro),
            RecordKind::Gps => LogRecord::gps(id, timestamp, s.gps),
            RecordKind::EkfState => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrity::StreamIntegrity;

    #[test]
    fn test_celsius_to_millikelvin() {
        assert_eq!(celsius_to_millikelvin(24.0), 297_150);
        assert_eq!(celsius_to_millikelvin(0.0), 273_150);
    }

    #[test]
    fn test_ids_strictly_increase_without_gaps() {
        let records: Vec<_> = Scenario::default().records(1_000_000).unwrap().collect();
        let integrity = StreamIntegrity::new(&records);

        assert_eq!(records[0].id, 1);
        assert!(records.windows(2).all(|w| w[1].id == w[0].id + 1));
        assert_eq!(integrity.total_missing(), 0);
    }

    #[test]
    fn test_timestamps_never_decrease() {
        let records: Vec<_> = Scenario::default().records(1_000_000).unwrap().collect();
        assert!(records.windows(2).all(|w| w[1].timestamp >= w[0].timestamp));
    }

    #[test]
    fn test_per_kind_counts() {
        let records: Vec<_> = Scenario::default().records(400_000).unwrap().collect();
        let counts = StreamIntegrity::new(&records).kind_counts();

        // Both ends are inclusive
        assert_eq!(counts[&RecordKind::Time], 201);
        assert_eq!(counts[&RecordKind::Imu], 201);
        assert_eq!(counts[&RecordKind::Baro], 11);
        assert_eq!(counts[&RecordKind::Gps], 3);
        assert_eq!(counts[&RecordKind::EkfState], 0);
        assert_eq!(records.len(), 416);
    }

    #[test]
    fn test_periods() {
        let records: Vec<_> = Scenario::default().records(1_000_000).unwrap().collect();

        let baro: Vec<u64> = records
            .iter()
            .filter(|r| r.kind() == RecordKind::Baro)
            .map(|r| r.timestamp)
            .collect();
        assert_eq!(&baro[..3], &[130_000_000, 130_040_000, 130_080_000]);

        let gps: Vec<u64> = records
            .iter()
            .filter(|r| r.kind() == RecordKind::Gps)
            .map(|r| r.timestamp)
            .collect();
        assert_eq!(gps, vec![130_000_000, 130_200_000, 130_400_000, 130_600_000, 130_800_000, 131_000_000]);
    }

    #[test]
    fn test_ties_follow_stream_order() {
        let kinds: Vec<RecordKind> = Scenario::default()
            .records(0)
            .unwrap()
            .map(|r| r.kind())
            .collect();

        assert_eq!(
            kinds,
            vec![RecordKind::Time, RecordKind::Imu, RecordKind::Baro, RecordKind::Gps]
        );
    }

    #[test]
    fn test_constant_payloads() {
        let scenario = Scenario::default();
        for record in scenario.records(200_000).unwrap() {
            match record.payload {
                RecordPayload::Imu(imu) => {
                    assert_eq!(imu.accel, Vector3::new(0, 0, -9806));
                    assert_eq!(imu.mag, Vector3::new(275, -19, -161));
                }
                RecordPayload::Gps(gps) => {
                    assert_eq!(gps.fix, 1);
                    assert_eq!(gps.satellite_count, 6);
                    assert_eq!(gps.horizontal_accuracy, 1_000);
                }
                RecordPayload::Baro(baro) => {
                    assert_eq!(baro.pressure, 101_325);
                    assert_eq!(baro.temperature, 297_150);
                }
                RecordPayload::Time => {}
                RecordPayload::EkfState(_) => panic!("scenario never emits EKF state"),
            }
        }
    }

    #[test]
    fn test_last_id_is_emitted_before_stopping() {
        let mut records = Scenario::default().records(DEFAULT_TIMESPAN_US).unwrap();
        records.next_id = Some(u32::MAX - 1);

        let ids: Vec<u32> = records.by_ref().map(|r| r.id).collect();

        assert_eq!(ids, vec![u32::MAX - 1, u32::MAX]);
        assert!(records.next().is_none());
    }

    #[test]
    fn test_zero_period_rejected() {
        let scenario = Scenario {
            baro_period_us: 0,
            ..Scenario::default()
        };
        assert!(matches!(
            scenario.records(1_000),
            Err(EkfLogError::Configuration(_))
        ));
    }
}
