//! # Binary Record Decoder
//!
//! Reads records back from a byte source using the same [`FieldLayout`] and
//! byte order the encoder used.
//!
//! End of stream is only clean when it falls exactly on a record boundary.
//! A partially available field is a truncation error, and an unknown kind tag
//! aborts decoding since the size of the rest of the record cannot be known.

use bytes::Buf;
use std::io::{ErrorKind, Read};
use tracing::{debug, warn};

use super::ByteOrder;
use crate::error::{EkfLogError, Result};
use crate::format::layout::{Field, FieldLayout};
use crate::record::*;

/// Largest field width a validated layout can contain
const MAX_FIELD_WIDTH: usize = 8;

/// Lazy iterator over the records of a binary stream
///
/// Yields `Ok(record)` for every decoded record, then either stops at a clean
/// end of stream or yields a single `Err` and stops.
pub struct BinaryRecords<'a, R: Read> {
    layout: &'a FieldLayout,
    byte_order: ByteOrder,
    source: R,
    offset: u64,
    last_id: Option<u32>,
    decoded: usize,
    done: bool,
    scratch: [u8; MAX_FIELD_WIDTH],
}

impl<'a, R: Read> BinaryRecords<'a, R> {
    /// Create a decoder over a layout that already passed
    /// [`FieldLayout::validate`]
    ///
    /// Only [`BinaryCodec`](super::BinaryCodec) builds decoders, so field
    /// widths never exceed the scratch buffer.
    pub(crate) fn new(layout: &'a FieldLayout, byte_order: ByteOrder, source: R) -> Self {
        Self {
            layout,
            byte_order,
            source,
            offset: 0,
            last_id: None,
            decoded: 0,
            done: false,
            scratch: [0u8; MAX_FIELD_WIDTH],
        }
    }

    /// Id of the last successfully decoded record
    pub fn last_id(&self) -> Option<u32> {
        self.last_id
    }

    /// Number of bytes consumed so far
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read up to `width` bytes into the scratch buffer
    ///
    /// Returns how many bytes were available before end of stream.
    fn fill(&mut self, width: usize) -> Result<usize> {
        let mut filled = 0;

        while filled < width {
            match self.source.read(&mut self.scratch[filled..width]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        self.offset += filled as u64;
        Ok(filled)
    }

    /// Read a whole field, failing on a short read
    ///
    /// # Returns
    ///
    /// * `Result<usize>` - Field width; the bytes are in `scratch[..width]`
    fn read_field(&mut self, field: Field) -> Result<usize> {
        let width = self.layout.spec(field).width;
        let start = self.offset;
        let available = self.fill(width)?;

        if available < width {
            return Err(self.truncated(field, start, width, available));
        }

        Ok(width)
    }

    fn truncated(&self, field: Field, offset: u64, expected: usize, available: usize) -> EkfLogError {
        warn!(
            "Log stream truncated inside `{}` at byte {} (last valid id: {:?})",
            field, offset, self.last_id
        );

        EkfLogError::Truncation {
            field,
            offset,
            expected,
            available,
            last_id: self.last_id,
        }
    }

    /// Interpret the scratch buffer as an integer field
    fn scratch_integer(&self, field: Field) -> i128 {
        let spec = self.layout.spec(field);
        let mut bytes = &self.scratch[..spec.width];

        match (self.byte_order, spec.signed) {
            (ByteOrder::Little, true) => bytes.get_int_le(spec.width) as i128,
            (ByteOrder::Little, false) => bytes.get_uint_le(spec.width) as i128,
            (ByteOrder::Big, true) => bytes.get_int(spec.width) as i128,
            (ByteOrder::Big, false) => bytes.get_uint(spec.width) as i128,
        }
    }

    fn convert<T: TryFrom<i128>>(field: Field, value: i128) -> Result<T> {
        T::try_from(value).map_err(|_| EkfLogError::ValueOutOfRange {
            field,
            value,
            detail: format!("decoded value does not fit {}", std::any::type_name::<T>()),
        })
    }

    fn read_integer<T: TryFrom<i128>>(&mut self, field: Field) -> Result<T> {
        self.read_field(field)?;
        Self::convert(field, self.scratch_integer(field))
    }

    fn read_float(&mut self, field: Field) -> Result<f64> {
        let width = self.read_field(field)?;
        let mut bytes = &self.scratch[..width];

        Ok(match (self.byte_order, width) {
            (ByteOrder::Little, 4) => bytes.get_f32_le() as f64,
            (ByteOrder::Big, 4) => bytes.get_f32() as f64,
            (ByteOrder::Little, _) => bytes.get_f64_le(),
            (ByteOrder::Big, _) => bytes.get_f64(),
        })
    }

    fn read_vector3<T: TryFrom<i128>>(&mut self, field: Field) -> Result<Vector3<T>> {
        Ok(Vector3 {
            x: self.read_integer(field)?,
            y: self.read_integer(field)?,
            z: self.read_integer(field)?,
        })
    }

    fn read_ned<T: TryFrom<i128>>(&mut self, field: Field) -> Result<Ned<T>> {
        Ok(Ned {
            north: self.read_integer(field)?,
            east: self.read_integer(field)?,
            down: self.read_integer(field)?,
        })
    }

    fn read_float_vector3(&mut self, field: Field) -> Result<Vector3<f64>> {
        Ok(Vector3 {
            x: self.read_float(field)?,
            y: self.read_float(field)?,
            z: self.read_float(field)?,
        })
    }

    fn read_float_ned(&mut self, field: Field) -> Result<Ned<f64>> {
        Ok(Ned {
            north: self.read_float(field)?,
            east: self.read_float(field)?,
            down: self.read_float(field)?,
        })
    }

    fn read_kind(&mut self) -> Result<RecordKind> {
        let offset = self.offset;
        self.read_field(Field::Kind)?;
        let tag = self.scratch[0];

        RecordKind::from_tag(tag).ok_or_else(|| {
            let tag = if tag.is_ascii_graphic() {
                (tag as char).to_string()
            } else {
                format!("0x{:02X}", tag)
            };

            warn!(
                "Unknown entry in log file at byte {} (last valid id: {:?})",
                offset, self.last_id
            );

            EkfLogError::UnknownKind {
                tag,
                offset,
                last_id: self.last_id,
            }
        })
    }

    fn read_imu(&mut self) -> Result<ImuData> {
        Ok(ImuData {
            accel: self.read_vector3(Field::Acceleration)?,
            gyro: self.read_vector3(Field::Gyro)?,
            delta_angle: self.read_vector3(Field::DeltaAngle)?,
            mag: self.read_vector3(Field::Magnetometer)?,
        })
    }

    fn read_gps(&mut self) -> Result<GpsData> {
        Ok(GpsData {
            position: GlobalPosition {
                latitude: self.read_integer(Field::Latitude)?,
                longitude: self.read_integer(Field::Longitude)?,
                altitude: self.read_integer(Field::Altitude)?,
            },
            horizontal_accuracy: self.read_integer(Field::HorizontalAccuracy)?,
            velocity_accuracy: self.read_integer(Field::VelocityAccuracy)?,
            fix: self.read_integer(Field::Fix)?,
            satellite_count: self.read_integer(Field::SatelliteCount)?,
            velocity: self.read_ned(Field::Velocity)?,
        })
    }

    fn read_baro(&mut self) -> Result<BaroData> {
        Ok(BaroData {
            pressure: self.read_integer(Field::Pressure)?,
            temperature: self.read_integer(Field::Temperature)?,
        })
    }

    fn read_ekf_state(&mut self) -> Result<EkfStateData> {
        Ok(EkfStateData {
            attitude: Quaternion {
                w: self.read_float(Field::Attitude)?,
                x: self.read_float(Field::Attitude)?,
                y: self.read_float(Field::Attitude)?,
                z: self.read_float(Field::Attitude)?,
            },
            gyro_bias: self.read_float_vector3(Field::GyroBias)?,
            velocity: self.read_float_ned(Field::StateVelocity)?,
            accel_bias: self.read_float_vector3(Field::AccelBias)?,
            position: self.read_float_ned(Field::StatePosition)?,
        })
    }

    /// Decode the next record, or `None` at a clean end of stream
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The stream ends inside a field (`Truncation`)
    /// - The kind tag is not known (`UnknownKind`)
    /// - A decoded value does not fit the record model (`ValueOutOfRange`)
    /// - The source fails (`Io`)
    fn read_record(&mut self) -> Result<Option<LogRecord>> {
        let id_width = self.layout.spec(Field::Id).width;
        let start = self.offset;

        match self.fill(id_width)? {
            0 => return Ok(None),
            n if n < id_width => return Err(self.truncated(Field::Id, start, id_width, n)),
            _ => {}
        }

        let id: u32 = Self::convert(Field::Id, self.scratch_integer(Field::Id))?;
        let kind = self.read_kind()?;
        let timestamp: u64 = self.read_integer(Field::Timestamp)?;

        let payload = match kind {
            RecordKind::Time => RecordPayload::Time,
            RecordKind::Imu => RecordPayload::Imu(self.read_imu()?),
            RecordKind::Gps => RecordPayload::Gps(self.read_gps()?),
            RecordKind::Baro => RecordPayload::Baro(self.read_baro()?),
            RecordKind::EkfState => RecordPayload::EkfState(self.read_ekf_state()?),
        };

        Ok(Some(LogRecord::new(id, timestamp, payload)))
    }
}

impl<R: Read> Iterator for BinaryRecords<'_, R> {
    type Item = Result<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.read_record() {
            Ok(Some(record)) => {
                self.last_id = Some(record.id);
                self.decoded += 1;
                Some(Ok(record))
            }
            Ok(None) => {
                self.done = true;
                debug!("Binary decoder read {} records ({} bytes)", self.decoded, self.offset);
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
