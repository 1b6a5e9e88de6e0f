//! # Text Log Format
//!
//! One record per line, fields separated by a delimiter (comma by default):
//! `id, label, timestamp, payload fields...`. Labels are the kind names
//! (`Time`, `Imu`, `Gps`, `Baro`, `EkfState`).

pub mod decoder;
pub mod encoder;

use std::borrow::Borrow;
use std::io::{Read, Write};

use crate::error::Result;
use crate::record::LogRecord;

pub use decoder::{SkipReason, SkippedLine, TextDecodeOutput};
use encoder::TextEncoder;

/// Text codec with a configurable field delimiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextCodec {
    delimiter: u8,
}

impl Default for TextCodec {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl TextCodec {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Write one line per record and return the number of records written
    pub fn encode<I, W>(&self, records: I, sink: W) -> Result<usize>
    where
        I: IntoIterator,
        I::Item: Borrow<LogRecord>,
        W: Write,
    {
        let mut encoder = TextEncoder::new(self.delimiter, sink);
        for record in records {
            encoder.encode(record.borrow())?;
        }
        encoder.finish()
    }

    pub fn encode_to_string<I>(&self, records: I) -> Result<String>
    where
        I: IntoIterator,
        I::Item: Borrow<LogRecord>,
    {
        let mut out = Vec::new();
        self.encode(records, &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Decode every record, dropping the list of skipped lines
    pub fn decode<R: Read>(&self, source: R) -> Result<Vec<LogRecord>> {
        Ok(self.decode_with_report(source)?.records)
    }

    /// Decode every record and report the lines that were skipped
    ///
    /// # Errors
    ///
    /// Returns a malformed line error for a line whose label is known but
    /// whose fields cannot be parsed, or an I/O error from the source.
    pub fn decode_with_report<R: Read>(&self, source: R) -> Result<TextDecodeOutput> {
        decoder::decode_text(self.delimiter, source)
    }
}
