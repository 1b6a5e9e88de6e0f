//! # Binary Record Encoder
//!
//! Serializes records field by field according to a [`FieldLayout`].
//!
//! Each record is assembled in a scratch buffer and handed to the sink only
//! once it is complete, so a value that fails its range check never leaves a
//! half-written record behind.

use bytes::{BufMut, BytesMut};
use std::io::Write;
use tracing::debug;

use super::ByteOrder;
use crate::error::{EkfLogError, Result};
use crate::format::layout::{Field, FieldLayout};
use crate::format::RecordSink;
use crate::record::*;

/// Streaming binary encoder writing into a byte sink
pub struct BinaryEncoder<'a, W: Write> {
    layout: &'a FieldLayout,
    byte_order: ByteOrder,
    sink: W,
    buf: BytesMut,
    written: usize,
}

impl<'a, W: Write> BinaryEncoder<'a, W> {
    /// Create an encoder over a layout that already passed
    /// [`FieldLayout::validate`]
    ///
    /// Only [`BinaryCodec`](super::BinaryCodec) builds encoders, so every
    /// layout reaching this point has been checked.
    pub(crate) fn new(layout: &'a FieldLayout, byte_order: ByteOrder, sink: W) -> Self {
        let capacity = RecordKind::ALL
            .iter()
            .map(|&kind| layout.record_size(kind))
            .max()
            .unwrap_or_default();

        Self {
            layout,
            byte_order,
            sink,
            buf: BytesMut::with_capacity(capacity),
            written: 0,
        }
    }

    /// Encode one record and write it to the sink
    ///
    /// # Arguments
    ///
    /// * `record` - Record to encode
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - A value does not fit its field (`ValueOutOfRange`); nothing is
    ///   written for that record
    /// - The sink fails (`Io`); records written earlier stay in the sink
    pub fn encode(&mut self, record: &LogRecord) -> Result<()> {
        self.buf.clear();
        self.write_record(record)
    }

    /// Flush the sink and return the number of records written
    ///
    /// # Returns
    ///
    /// * `Result<usize>` - Records accepted by [`BinaryEncoder::encode`]
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if flushing the sink fails
    pub fn finish(mut self) -> Result<usize> {
        self.sink.flush()?;
        debug!("Binary encoder wrote {} records", self.written);
        Ok(self.written)
    }

    fn put_prefix(&mut self, record: &LogRecord) -> Result<()> {
        self.put_integer(Field::Id, record.id.into())?;
        self.buf.put_u8(record.kind().tag());
        self.put_integer(Field::Timestamp, record.timestamp.into())
    }

    /// Append an integer field after checking it fits the field's width
    fn put_integer(&mut self, field: Field, value: i128) -> Result<()> {
        let spec = *self.layout.spec(field);
        let (min, max) = spec.integer_range();

        if value < min || value > max {
            return Err(EkfLogError::ValueOutOfRange {
                field,
                value,
                detail: format!(
                    "{} {}-byte integer",
                    if spec.signed { "signed" } else { "unsigned" },
                    spec.width
                ),
            });
        }

        match (self.byte_order, spec.signed) {
            (ByteOrder::Little, true) => self.buf.put_int_le(value as i64, spec.width),
            (ByteOrder::Little, false) => self.buf.put_uint_le(value as u64, spec.width),
            (ByteOrder::Big, true) => self.buf.put_int(value as i64, spec.width),
            (ByteOrder::Big, false) => self.buf.put_uint(value as u64, spec.width),
        }

        Ok(())
    }

    fn put_float(&mut self, field: Field, value: f64) {
        let spec = self.layout.spec(field);

        match (self.byte_order, spec.width) {
            (ByteOrder::Little, 4) => self.buf.put_f32_le(value as f32),
            (ByteOrder::Big, 4) => self.buf.put_f32(value as f32),
            (ByteOrder::Little, _) => self.buf.put_f64_le(value),
            (ByteOrder::Big, _) => self.buf.put_f64(value),
        }
    }

    fn put_vector3<T: Copy + Into<i128>>(&mut self, field: Field, v: &Vector3<T>) -> Result<()> {
        self.put_integer(field, v.x.into())?;
        self.put_integer(field, v.y.into())?;
        self.put_integer(field, v.z.into())
    }

    fn put_ned<T: Copy + Into<i128>>(&mut self, field: Field, v: &Ned<T>) -> Result<()> {
        self.put_integer(field, v.north.into())?;
        self.put_integer(field, v.east.into())?;
        self.put_integer(field, v.down.into())
    }

    fn put_float_vector3(&mut self, field: Field, v: &Vector3<f64>) {
        self.put_float(field, v.x);
        self.put_float(field, v.y);
        self.put_float(field, v.z);
    }

    fn put_float_ned(&mut self, field: Field, v: &Ned<f64>) {
        self.put_float(field, v.north);
        self.put_float(field, v.east);
        self.put_float(field, v.down);
    }

    /// Hand the completed record to the sink
    fn commit(&mut self) -> Result<()> {
        self.sink.write_all(&self.buf)?;
        self.written += 1;
        Ok(())
    }
}

impl<W: Write> RecordSink for BinaryEncoder<'_, W> {
    fn write_time(&mut self, record: &LogRecord) -> Result<()> {
        self.put_prefix(record)?;
        self.commit()
    }

    fn write_imu(&mut self, record: &LogRecord, imu: &ImuData) -> Result<()> {
        self.put_prefix(record)?;
        self.put_vector3(Field::Acceleration, &imu.accel)?;
        self.put_vector3(Field::Gyro, &imu.gyro)?;
        self.put_vector3(Field::DeltaAngle, &imu.delta_angle)?;
        self.put_vector3(Field::Magnetometer, &imu.mag)?;
        self.commit()
    }

    fn write_gps(&mut self, record: &LogRecord, gps: &GpsData) -> Result<()> {
        self.put_prefix(record)?;
        self.put_integer(Field::Latitude, gps.position.latitude.into())?;
        self.put_integer(Field::Longitude, gps.position.longitude.into())?;
        self.put_integer(Field::Altitude, gps.position.altitude.into())?;
        self.put_integer(Field::HorizontalAccuracy, gps.horizontal_accuracy.into())?;
        self.put_integer(Field::VelocityAccuracy, gps.velocity_accuracy.into())?;
        self.put_integer(Field::Fix, gps.fix.into())?;
        self.put_integer(Field::SatelliteCount, gps.satellite_count.into())?;
        self.put_ned(Field::Velocity, &gps.velocity)?;
        self.commit()
    }

    fn write_baro(&mut self, record: &LogRecord, baro: &BaroData) -> Result<()> {
        self.put_prefix(record)?;
        self.put_integer(Field::Pressure, baro.pressure.into())?;
        self.put_integer(Field::Temperature, baro.temperature.into())?;
        self.commit()
    }

    fn write_ekf_state(&mut self, record: &LogRecord, state: &EkfStateData) -> Result<()> {
        self.put_prefix(record)?;

        let q = &state.attitude;
        for component in [q.w, q.x, q.y, q.z] {
            self.put_float(Field::Attitude, component);
        }

        self.put_float_vector3(Field::GyroBias, &state.gyro_bias);
        self.put_float_ned(Field::StateVelocity, &state.velocity);
        self.put_float_vector3(Field::AccelBias, &state.accel_bias);
        self.put_float_ned(Field::StatePosition, &state.position);
        self.commit()
    }
}
