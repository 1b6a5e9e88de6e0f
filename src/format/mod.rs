//! # Log Formats
//!
//! Binary and delimited-text codecs for EKF log records, plus the router that
//! picks one of them from a file extension.

pub mod binary;
pub mod layout;
pub mod text;

use std::borrow::Borrow;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{EkfLogError, Result};
use crate::record::*;

use binary::BinaryCodec;
use text::TextCodec;

/// Consumer of records, one method per record kind
///
/// Implementors get `write_record` for free; it dispatches on the payload so
/// a new record kind is a compile error until every sink handles it.
pub trait RecordSink {
    fn write_time(&mut self, record: &LogRecord) -> Result<()>;

    fn write_imu(&mut self, record: &LogRecord, imu: &ImuData) -> Result<()>;

    fn write_gps(&mut self, record: &LogRecord, gps: &GpsData) -> Result<()>;

    fn write_baro(&mut self, record: &LogRecord, baro: &BaroData) -> Result<()>;

    fn write_ekf_state(&mut self, record: &LogRecord, state: &EkfStateData) -> Result<()>;

    fn write_record(&mut self, record: &LogRecord) -> Result<()> {
        match &record.payload {
            RecordPayload::Time => self.write_time(record),
            RecordPayload::Imu(imu) => self.write_imu(record, imu),
            RecordPayload::Gps(gps) => self.write_gps(record, gps),
            RecordPayload::Baro(baro) => self.write_baro(record, baro),
            RecordPayload::EkfState(state) => self.write_ekf_state(record, state),
        }
    }
}

/// On-disk log format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Binary,
    Text,
}

impl LogFormat {
    /// Pick the format from a file extension (`.bin` or `.csv`)
    ///
    /// # Errors
    ///
    /// Returns a configuration error for any other or missing extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("bin") => Ok(LogFormat::Binary),
            Some("csv") => Ok(LogFormat::Text),
            Some(other) => Err(EkfLogError::Configuration(format!(
                "Unsupported log file extension \".{}\" for {} (expected .bin or .csv)",
                other,
                path.display()
            ))),
            None => Err(EkfLogError::Configuration(format!(
                "Log file {} has no extension (expected .bin or .csv)",
                path.display()
            ))),
        }
    }
}

/// Routes file-level decode and encode to the codec matching the extension
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatRouter {
    binary: BinaryCodec,
    text: TextCodec,
}

impl FormatRouter {
    pub fn new(binary: BinaryCodec, text: TextCodec) -> Self {
        Self { binary, text }
    }

    /// Build a router from the codec settings of a loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.binary_codec()?, config.text_codec()?))
    }

    pub fn binary(&self) -> &BinaryCodec {
        &self.binary
    }

    pub fn text(&self) -> &TextCodec {
        &self.text
    }

    /// Decode every record of a log file
    pub fn decode<P: AsRef<Path>>(&self, path: P) -> Result<Vec<LogRecord>> {
        let path = path.as_ref();
        let format = LogFormat::from_path(path)?;
        let reader = BufReader::new(File::open(path)?);

        debug!("Decoding {} as {:?}", path.display(), format);

        let records = match format {
            LogFormat::Binary => self.binary.decode(reader)?,
            LogFormat::Text => {
                let output = self.text.decode_with_report(reader)?;
                if !output.skipped.is_empty() {
                    info!(
                        "Skipped {} line(s) in {}: {} unrecognized, {} too short",
                        output.skipped.len(),
                        path.display(),
                        output.unknown_label_count(),
                        output.too_few_fields_count()
                    );
                }
                output.records
            }
        };

        info!("Read {} records from {}", records.len(), path.display());
        Ok(records)
    }

    /// Write records to a log file, replacing its contents
    ///
    /// Returns the number of records written. On failure the file keeps
    /// whatever was written before the error.
    pub fn encode<P, I>(&self, path: P, records: I) -> Result<usize>
    where
        P: AsRef<Path>,
        I: IntoIterator,
        I::Item: Borrow<LogRecord>,
    {
        let path = path.as_ref();
        let format = LogFormat::from_path(path)?;
        let mut writer = BufWriter::new(File::create(path)?);

        debug!("Encoding {} as {:?}", path.display(), format);

        let written = match format {
            LogFormat::Binary => self.binary.encode(records, &mut writer)?,
            LogFormat::Text => self.text.encode(records, &mut writer)?,
        };
        writer.flush()?;

        info!("Wrote {} records to {}", written, path.display());
        Ok(written)
    }

    /// Decode one log file and write its records to another
    pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(&self, input: P, output: Q) -> Result<usize> {
        let output = output.as_ref();
        // Check the output extension before doing any work
        LogFormat::from_path(output)?;

        let records = self.decode(input)?;
        self.encode(output, &records)
    }
}

/// Decode a log file with the default codecs
pub fn decode<P: AsRef<Path>>(path: P) -> Result<Vec<LogRecord>> {
    FormatRouter::default().decode(path)
}

/// Encode records into a log file with the default codecs
pub fn encode<P, I>(path: P, records: I) -> Result<usize>
where
    P: AsRef<Path>,
    I: IntoIterator,
    I::Item: Borrow<LogRecord>,
{
    FormatRouter::default().encode(path, records)
}
