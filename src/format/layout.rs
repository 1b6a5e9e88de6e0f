//! # Field Layout
//!
//! Declarative table describing how each symbolic field is laid out in the
//! binary format: byte width, signedness and primitive kind.
//!
//! A layout is pure data. The binary codec validates it once when it is
//! constructed and relies on it being complete afterwards.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{EkfLogError, Result};
use crate::record::RecordKind;

/// Symbolic field names used by the binary format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    // Record prefix
    Id,
    Kind,
    Timestamp,

    // IMU fields
    Acceleration,
    Gyro,
    DeltaAngle,
    Magnetometer,

    // GPS fields
    Latitude,
    Longitude,
    Altitude,
    HorizontalAccuracy,
    VelocityAccuracy,
    Fix,
    SatelliteCount,
    Velocity,

    // Barometer fields
    Pressure,
    Temperature,

    // EKF state fields
    Attitude,
    GyroBias,
    StateVelocity,
    AccelBias,
    StatePosition,
}

impl Field {
    /// Fields making up the prefix of every record, in wire order
    pub const PREFIX: [Field; 3] = [Field::Id, Field::Kind, Field::Timestamp];

    pub const fn name(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Kind => "kind",
            Field::Timestamp => "timestamp",
            Field::Acceleration => "acceleration",
            Field::Gyro => "gyro",
            Field::DeltaAngle => "delta_angle",
            Field::Magnetometer => "magnetometer",
            Field::Latitude => "latitude",
            Field::Longitude => "longitude",
            Field::Altitude => "altitude",
            Field::HorizontalAccuracy => "horizontal_accuracy",
            Field::VelocityAccuracy => "velocity_accuracy",
            Field::Fix => "fix",
            Field::SatelliteCount => "satellite_count",
            Field::Velocity => "velocity",
            Field::Pressure => "pressure",
            Field::Temperature => "temperature",
            Field::Attitude => "attitude",
            Field::GyroBias => "gyro_bias",
            Field::StateVelocity => "state_velocity",
            Field::AccelBias => "accel_bias",
            Field::StatePosition => "state_position",
        }
    }

    /// Primitive kind the record model needs for this field
    pub const fn expected_kind(self) -> FieldKind {
        match self {
            Field::Kind => FieldKind::FixedText,
            Field::Attitude
            | Field::GyroBias
            | Field::StateVelocity
            | Field::AccelBias
            | Field::StatePosition => FieldKind::Float,
            _ => FieldKind::Integer,
        }
    }

    /// Payload fields of a record kind, in wire order, one entry per value
    ///
    /// Vector fields appear once per component.
    pub fn payload(kind: RecordKind) -> &'static [Field] {
        use Field::*;

        match kind {
            RecordKind::Time => &[],
            RecordKind::Imu => &[
                Acceleration, Acceleration, Acceleration,
                Gyro, Gyro, Gyro,
                DeltaAngle, DeltaAngle, DeltaAngle,
                Magnetometer, Magnetometer, Magnetometer,
            ],
            RecordKind::Gps => &[
                Latitude, Longitude, Altitude,
                HorizontalAccuracy, VelocityAccuracy,
                Fix, SatelliteCount,
                Velocity, Velocity, Velocity,
            ],
            RecordKind::Baro => &[Pressure, Temperature],
            RecordKind::EkfState => &[
                Attitude, Attitude, Attitude, Attitude,
                GyroBias, GyroBias, GyroBias,
                StateVelocity, StateVelocity, StateVelocity,
                AccelBias, AccelBias, AccelBias,
                StatePosition, StatePosition, StatePosition,
            ],
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Primitive encoding of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Two's-complement or unsigned integer
    Integer,
    /// Fixed-width ASCII text
    FixedText,
    /// IEEE-754 floating point
    Float,
}

/// Physical encoding descriptor of one field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FieldSpec {
    /// Width in bytes
    pub width: usize,

    #[serde(default = "default_signed")]
    pub signed: bool,

    #[serde(default = "default_field_kind")]
    pub kind: FieldKind,
}

fn default_signed() -> bool { true }
fn default_field_kind() -> FieldKind { FieldKind::Integer }

impl FieldSpec {
    pub const fn signed(width: usize) -> Self {
        Self { width, signed: true, kind: FieldKind::Integer }
    }

    pub const fn unsigned(width: usize) -> Self {
        Self { width, signed: false, kind: FieldKind::Integer }
    }

    pub const fn text(width: usize) -> Self {
        Self { width, signed: false, kind: FieldKind::FixedText }
    }

    pub const fn float(width: usize) -> Self {
        Self { width, signed: true, kind: FieldKind::Float }
    }

    /// Inclusive value range representable by an integer field
    ///
    /// A zero-width field holds only 0; ranges wider than `i128` saturate.
    pub fn integer_range(&self) -> (i128, i128) {
        let bits = self.width.saturating_mul(8).min(128) as u32;
        match (self.signed, bits) {
            (_, 0) => (0, 0),
            (true, 128) => (i128::MIN, i128::MAX),
            (true, _) => (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1),
            (false, 127..=128) => (0, i128::MAX),
            (false, _) => (0, (1i128 << bits) - 1),
        }
    }
}

/// Table of field encodings for one file-format generation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldLayout {
    fields: BTreeMap<Field, FieldSpec>,
}

impl FieldLayout {
    /// Empty table, to be filled with [`FieldLayout::with`]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Layout of the current log format generation
    pub fn current() -> Self {
        Self::empty()
            .with(Field::Id, FieldSpec::unsigned(4))
            .with(Field::Kind, FieldSpec::text(1))
            .with(Field::Timestamp, FieldSpec::unsigned(8))
            .with(Field::Acceleration, FieldSpec::signed(4))
            .with(Field::Gyro, FieldSpec::signed(4))
            .with(Field::DeltaAngle, FieldSpec::unsigned(4))
            .with(Field::Magnetometer, FieldSpec::signed(2))
            .with(Field::Latitude, FieldSpec::signed(8))
            .with(Field::Longitude, FieldSpec::signed(8))
            .with(Field::Altitude, FieldSpec::signed(4))
            .with(Field::HorizontalAccuracy, FieldSpec::unsigned(4))
            .with(Field::VelocityAccuracy, FieldSpec::unsigned(4))
            .with(Field::Fix, FieldSpec::unsigned(1))
            .with(Field::SatelliteCount, FieldSpec::unsigned(1))
            .with(Field::Velocity, FieldSpec::signed(4))
            .with(Field::Pressure, FieldSpec::signed(4))
            .with(Field::Temperature, FieldSpec::unsigned(4))
            .with(Field::Attitude, FieldSpec::float(8))
            .with(Field::GyroBias, FieldSpec::float(8))
            .with(Field::StateVelocity, FieldSpec::float(8))
            .with(Field::AccelBias, FieldSpec::float(8))
            .with(Field::StatePosition, FieldSpec::float(8))
    }

    /// Set (or replace) the encoding of a field
    pub fn with(mut self, field: Field, spec: FieldSpec) -> Self {
        self.fields.insert(field, spec);
        self
    }

    /// Replace entries with the given overrides
    pub fn merged<'a>(mut self, overrides: impl IntoIterator<Item = (&'a Field, &'a FieldSpec)>) -> Self {
        for (field, spec) in overrides {
            self.fields.insert(*field, *spec);
        }
        self
    }

    pub fn get(&self, field: Field) -> Option<&FieldSpec> {
        self.fields.get(&field)
    }

    /// Encoding of a field known to be present
    ///
    /// # Panics
    ///
    /// Panics if the field is missing. Codecs only call this on layouts that
    /// passed [`FieldLayout::validate`].
    pub fn spec(&self, field: Field) -> &FieldSpec {
        match self.fields.get(&field) {
            Some(spec) => spec,
            None => panic!("field layout has no entry for `{}`", field),
        }
    }

    /// Check that every field the record model uses is present and well formed
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let required = Field::PREFIX
            .iter()
            .chain(RecordKind::ALL.iter().flat_map(|kind| Field::payload(*kind)));

        for &field in required {
            let spec = self.get(field).ok_or_else(|| {
                EkfLogError::Configuration(format!("field layout has no entry for `{}`", field))
            })?;

            if spec.kind != field.expected_kind() {
                return Err(EkfLogError::Configuration(format!(
                    "field `{}` must be encoded as {:?}, layout says {:?}",
                    field,
                    field.expected_kind(),
                    spec.kind
                )));
            }

            let width_ok = match spec.kind {
                FieldKind::Integer => (1..=8).contains(&spec.width),
                FieldKind::Float => spec.width == 4 || spec.width == 8,
                FieldKind::FixedText => spec.width == 1,
            };

            if !width_ok {
                return Err(EkfLogError::Configuration(format!(
                    "field `{}` has unsupported width {} for {:?}",
                    field, spec.width, spec.kind
                )));
            }
        }

        Ok(())
    }

    /// Size in bytes of the common record prefix
    pub fn prefix_size(&self) -> usize {
        Field::PREFIX.iter().map(|&field| self.spec(field).width).sum()
    }

    /// Size in bytes of a full record of the given kind
    pub fn record_size(&self, kind: RecordKind) -> usize {
        self.prefix_size()
            + Field::payload(kind)
                .iter()
                .map(|&field| self.spec(field).width)
                .sum::<usize>()
    }
}
