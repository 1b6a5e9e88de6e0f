//! # Binary Log Format
//!
//! Records are written back to back with no framing: a fixed prefix (id,
//! one-character kind tag, timestamp) followed by the kind's payload fields.
//! Record boundaries follow from the kind tag and the field layout alone, so
//! the decoder must be configured exactly like the encoder was.

pub mod decoder;
pub mod encoder;

use serde::Deserialize;
use std::borrow::Borrow;
use std::io::{Read, Write};

use crate::error::Result;
use crate::format::layout::FieldLayout;
use crate::record::LogRecord;

use decoder::BinaryRecords;
use encoder::BinaryEncoder;

/// Byte order of multi-byte fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

/// Binary codec bound to one field layout and byte order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryCodec {
    layout: FieldLayout,
    byte_order: ByteOrder,
}

impl Default for BinaryCodec {
    fn default() -> Self {
        Self {
            layout: FieldLayout::current(),
            byte_order: ByteOrder::Little,
        }
    }
}

impl BinaryCodec {
    /// Create a codec for the given layout
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the layout is missing an entry the
    /// record model needs, or describes a field with an unusable encoding.
    pub fn new(layout: FieldLayout, byte_order: ByteOrder) -> Result<Self> {
        layout.validate()?;
        Ok(Self { layout, byte_order })
    }

    /// Current layout with the given byte order
    pub fn with_byte_order(byte_order: ByteOrder) -> Self {
        Self {
            byte_order,
            ..Self::default()
        }
    }

    pub fn layout(&self) -> &FieldLayout {
        &self.layout
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Encode records into a byte sink
    ///
    /// Records are written one at a time as they are pulled from `records`.
    /// Returns the number of records written.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the sink fails, or a range error if a value
    /// does not fit its field. Output written before the failure is kept.
    pub fn encode<I, W>(&self, records: I, sink: W) -> Result<usize>
    where
        I: IntoIterator,
        I::Item: Borrow<LogRecord>,
        W: Write,
    {
        let mut encoder = BinaryEncoder::new(&self.layout, self.byte_order, sink);
        for record in records {
            encoder.encode(record.borrow())?;
        }
        encoder.finish()
    }

    /// Encode records into a freshly allocated buffer
    pub fn encode_to_vec<I>(&self, records: I) -> Result<Vec<u8>>
    where
        I: IntoIterator,
        I::Item: Borrow<LogRecord>,
    {
        let mut out = Vec::new();
        self.encode(records, &mut out)?;
        Ok(out)
    }

    /// Lazily decode records from a byte source
    ///
    /// The iterator yields at most one error and then stops.
    pub fn records<R: Read>(&self, source: R) -> BinaryRecords<'_, R> {
        BinaryRecords::new(&self.layout, self.byte_order, source)
    }

    /// Decode a whole byte stream
    ///
    /// # Errors
    ///
    /// Fails on the first truncated field or unknown kind tag; records decoded
    /// before the failure are discarded.
    pub fn decode<R: Read>(&self, source: R) -> Result<Vec<LogRecord>> {
        self.records(source).collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::record::*;

    pub fn imu() -> ImuData {
        ImuData {
            accel: Vector3::new(0, 0, -9806),
            gyro: Vector3::new(12, -7, 3),
            delta_angle: Vector3::new(24, 0, 4_000_000_000),
            mag: Vector3::new(275, -19, -161),
        }
    }

    pub fn gps() -> GpsData {
        GpsData {
            position: GlobalPosition {
                latitude: 52_229_676_000,
                longitude: -21_012_229_000,
                altitude: 110_000,
            },
            horizontal_accuracy: 1_000,
            velocity_accuracy: 250,
            fix: 3,
            satellite_count: 11,
            velocity: Ned::new(1_500, -200, 35),
        }
    }

    pub fn baro() -> BaroData {
        BaroData {
            pressure: 101_325,
            temperature: 297_150,
        }
    }

    pub fn ekf_state() -> EkfStateData {
        EkfStateData {
            attitude: Quaternion::new(0.9238795325112867, 0.0, 0.0, 0.3826834323650898),
            gyro_bias: Vector3::new(1.5e-4, -2.25e-5, 0.0),
            velocity: Ned::new(0.1, -0.2, 1.0 / 3.0),
            accel_bias: Vector3::new(-0.012, 0.004, 0.0311),
            position: Ned::new(12.5, -3.75, -0.5),
        }
    }

    /// One record of every kind with consecutive ids
    pub fn all_kinds() -> Vec<LogRecord> {
        vec![
            LogRecord::time(1, 130_000_000),
            LogRecord::imu(2, 130_000_100, imu()),
            LogRecord::gps(3, 130_000_200, gps()),
            LogRecord::baro(4, 130_000_300, baro()),
            LogRecord::ekf_state(5, 130_000_400, ekf_state()),
        ]
    }
}
