//! # Record Model
//!
//! Tagged union of the log record kinds written by the state estimator.
//!
//! Every record carries a producer-assigned sequence id and a timestamp in
//! microseconds. The payload depends on the record kind:
//! - `Time`: no payload
//! - `Imu`: accelerometer, gyroscope, delta angle, magnetometer
//! - `Gps`: position, accuracies, fix, satellites, NED velocity
//! - `Baro`: pressure and temperature
//! - `EkfState`: attitude, biases, NED velocity and position

pub mod types;

use serde::Serialize;
use std::fmt;

pub use types::{
    BaroData, EkfStateData, GlobalPosition, GpsData, ImuData, Ned, Quaternion, Vector3,
};

/// Discriminant of a log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RecordKind {
    Time,
    Imu,
    Gps,
    Baro,
    EkfState,
}

impl RecordKind {
    /// All record kinds, in declaration order
    pub const ALL: [RecordKind; 5] = [
        RecordKind::Time,
        RecordKind::Imu,
        RecordKind::Gps,
        RecordKind::Baro,
        RecordKind::EkfState,
    ];

    /// One-character tag used by the binary format
    pub const fn tag(self) -> u8 {
        match self {
            RecordKind::Time => b'T',
            RecordKind::Imu => b'I',
            RecordKind::Gps => b'P',
            RecordKind::Baro => b'B',
            RecordKind::EkfState => b'S',
        }
    }

    /// Look up a kind by its binary tag
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Label used by the text format
    pub const fn label(self) -> &'static str {
        match self {
            RecordKind::Time => "Time",
            RecordKind::Imu => "Imu",
            RecordKind::Gps => "Gps",
            RecordKind::Baro => "Baro",
            RecordKind::EkfState => "EkfState",
        }
    }

    /// Look up a kind by its text label
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.label() == label)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind-specific record contents
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data")]
pub enum RecordPayload {
    Time,
    Imu(ImuData),
    Gps(GpsData),
    Baro(BaroData),
    EkfState(EkfStateData),
}

impl RecordPayload {
    pub fn kind(&self) -> RecordKind {
        match self {
            RecordPayload::Time => RecordKind::Time,
            RecordPayload::Imu(_) => RecordKind::Imu,
            RecordPayload::Gps(_) => RecordKind::Gps,
            RecordPayload::Baro(_) => RecordKind::Baro,
            RecordPayload::EkfState(_) => RecordKind::EkfState,
        }
    }
}

/// A single log record
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LogRecord {
    /// Producer-assigned sequence id, strictly increasing within a stream
    pub id: u32,

    /// Microseconds since an arbitrary epoch
    pub timestamp: u64,

    #[serde(flatten)]
    pub payload: RecordPayload,
}

impl LogRecord {
    pub fn new(id: u32, timestamp: u64, payload: RecordPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }

    pub fn time(id: u32, timestamp: u64) -> Self {
        Self::new(id, timestamp, RecordPayload::Time)
    }

    pub fn imu(id: u32, timestamp: u64, data: ImuData) -> Self {
        Self::new(id, timestamp, RecordPayload::Imu(data))
    }

    pub fn gps(id: u32, timestamp: u64, data: GpsData) -> Self {
        Self::new(id, timestamp, RecordPayload::Gps(data))
    }

    pub fn baro(id: u32, timestamp: u64, data: BaroData) -> Self {
        Self::new(id, timestamp, RecordPayload::Baro(data))
    }

    pub fn ekf_state(id: u32, timestamp: u64, data: EkfStateData) -> Self {
        Self::new(id, timestamp, RecordPayload::EkfState(data))
    }

    pub fn kind(&self) -> RecordKind {
        self.payload.kind()
    }
}
