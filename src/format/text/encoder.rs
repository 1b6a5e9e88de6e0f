//! # Text Record Encoder
//!
//! Writes one delimited line per record: `id, label, timestamp, fields...`.
//! Integers are written in plain decimal, floats in the shortest form that
//! parses back to the same `f64`.

use std::fmt::Display;
use std::io::Write;

use crate::error::Result;
use crate::format::RecordSink;
use crate::record::*;

/// Streaming text encoder on top of a `csv::Writer`
pub struct TextEncoder<W: Write> {
    writer: csv::Writer<W>,
    row: Vec<String>,
    written: usize,
}

impl<W: Write> TextEncoder<W> {
    /// Create an encoder writing to `sink`
    ///
    /// # Arguments
    ///
    /// * `delimiter` - Field separator, a single ASCII byte
    /// * `sink` - Destination of the encoded lines
    ///
    /// Fields containing the delimiter or a quote are quoted; everything
    /// else is written bare.
    pub fn new(delimiter: u8, sink: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .quote_style(csv::QuoteStyle::Necessary)
            .from_writer(sink);

        Self {
            writer,
            row: Vec::with_capacity(19),
            written: 0,
        }
    }

    /// Encode one record as a line
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the sink fails. Lines are buffered, so a
    /// failing sink may only be noticed by a later call or by
    /// [`TextEncoder::finish`].
    pub fn encode(&mut self, record: &LogRecord) -> Result<()> {
        self.row.clear();
        self.write_record(record)
    }

    /// Flush buffered lines and return the number of records written
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the buffered lines cannot be written
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        Ok(self.written)
    }

    fn push_prefix(&mut self, record: &LogRecord) {
        self.row.push(record.id.to_string());
        self.row.push(record.kind().label().to_string());
        self.row.push(record.timestamp.to_string());
    }

    fn push<T: Display>(&mut self, value: T) {
        self.row.push(value.to_string());
    }

    fn push_vector3<T: Display>(&mut self, v: &Vector3<T>) {
        self.push(&v.x);
        self.push(&v.y);
        self.push(&v.z);
    }

    fn push_ned<T: Display>(&mut self, v: &Ned<T>) {
        self.push(&v.north);
        self.push(&v.east);
        self.push(&v.down);
    }

    fn commit(&mut self) -> Result<()> {
        self.writer.write_record(&self.row)?;
        self.written += 1;
        Ok(())
    }
}

impl<W: Write> RecordSink for TextEncoder<W> {
    fn write_time(&mut self, record: &LogRecord) -> Result<()> {
        self.push_prefix(record);
        self.commit()
    }

    fn write_imu(&mut self, record: &LogRecord, imu: &ImuData) -> Result<()> {
        self.push_prefix(record);
        self.push_vector3(&imu.accel);
        self.push_vector3(&imu.gyro);
        self.push_vector3(&imu.delta_angle);
        self.push_vector3(&imu.mag);
        self.commit()
    }

    fn write_gps(&mut self, record: &LogRecord, gps: &GpsData) -> Result<()> {
        self.push_prefix(record);
        self.push(gps.position.latitude);
        self.push(gps.position.longitude);
        self.push(gps.position.altitude);
        self.push(gps.horizontal_accuracy);
        self.push(gps.velocity_accuracy);
        self.push(gps.fix);
        self.push(gps.satellite_count);
        self.push_ned(&gps.velocity);
        self.commit()
    }

    fn write_baro(&mut self, record: &LogRecord, baro: &BaroData) -> Result<()> {
        self.push_prefix(record);
        self.push(baro.pressure);
        self.push(baro.temperature);
        self.commit()
    }

    fn write_ekf_state(&mut self, record: &LogRecord, state: &EkfStateData) -> Result<()> {
        self.push_prefix(record);

        let q = &state.attitude;
        for component in [q.w, q.x, q.y, q.z] {
            self.push(component);
        }

        self.push_vector3(&state.gyro_bias);
        self.push_ned(&state.velocity);
        self.push_vector3(&state.accel_bias);
        self.push_ned(&state.position);
        self.commit()
    }
}
