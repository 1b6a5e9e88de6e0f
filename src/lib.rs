//! # EKF Log Library
//!
//! Read, write and check the sensor logs recorded for the flight
//! controller's extended Kalman filter.
//!
//! Logs come in two on-disk formats: a compact fixed-width binary format
//! (`.bin`) and a delimited text format (`.csv`). Both carry the same
//! records: periodic time markers, IMU samples, GPS fixes, barometer
//! readings and filter state snapshots.
//!
//! ```no_run
//! use ekflog::StreamIntegrity;
//!
//! let records = ekflog::decode("flight.bin")?;
//! let integrity = StreamIntegrity::new(&records);
//! println!("{} records missing", integrity.total_missing());
//! # Ok::<(), ekflog::EkfLogError>(())
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod integrity;
pub mod record;
pub mod scenario;

pub use error::{EkfLogError, Result};
pub use format::{decode, encode, FormatRouter, LogFormat, RecordSink};
pub use integrity::{IntegrityReport, StreamIntegrity};
pub use record::{LogRecord, RecordKind, RecordPayload};
