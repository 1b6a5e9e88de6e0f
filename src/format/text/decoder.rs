//! # Text Record Decoder
//!
//! Parses delimited lines back into records.
//!
//! The text format is more forgiving than the binary one since text logs are
//! often edited by hand: lines with fewer than two fields and lines with an
//! unknown kind label are reported and skipped. A line with a known label but
//! unparsable contents is still an error.

use std::fmt;
use std::io::Read;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::{EkfLogError, Result};
use crate::record::*;

/// Why a line was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer than two fields on the line
    TooFewFields(usize),
    /// Kind label not recognized
    UnknownLabel(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooFewFields(n) => write!(f, "only {} field(s)", n),
            SkipReason::UnknownLabel(label) => write!(f, "unknown entry {:?}", label),
        }
    }
}

/// A line the decoder skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number
    pub line: u64,
    pub reason: SkipReason,
}

/// Records decoded from a text stream plus the lines that were skipped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextDecodeOutput {
    pub records: Vec<LogRecord>,
    pub skipped: Vec<SkippedLine>,
}

impl TextDecodeOutput {
    /// Skipped lines whose kind label was not recognized
    pub fn unknown_label_count(&self) -> usize {
        self.skipped
            .iter()
            .filter(|s| matches!(s.reason, SkipReason::UnknownLabel(_)))
            .count()
    }

    /// Skipped lines with fewer than two fields
    pub fn too_few_fields_count(&self) -> usize {
        self.skipped
            .iter()
            .filter(|s| matches!(s.reason, SkipReason::TooFewFields(_)))
            .count()
    }
}

/// Number of columns a row of the given kind needs
pub const fn column_count(kind: RecordKind) -> usize {
    3 + match kind {
        RecordKind::Time => 0,
        RecordKind::Imu => 12,
        RecordKind::Gps => 10,
        RecordKind::Baro => 2,
        RecordKind::EkfState => 16,
    }
}

/// Decode every line of a text stream
///
/// # Arguments
///
/// * `delimiter` - Field separator, a single ASCII byte
/// * `source` - Text to decode
///
/// # Returns
///
/// * `Result<TextDecodeOutput>` - Decoded records in stream order, plus the
///   lines that were skipped
///
/// # Errors
///
/// Returns error if:
/// - A line with a known label has too few columns or an unparsable value
///   (`MalformedLine`, carrying the 1-based line number)
/// - The source fails (`Io`)
/// - The input is not valid UTF-8 (`Csv`)
///
/// # Examples
///
/// ```
/// use ekflog::format::text::decoder::decode_text;
///
/// let output = decode_text(b',', "1,Time,100\n2,Wind,101,3\n".as_bytes())?;
/// assert_eq!(output.records.len(), 1);
/// assert_eq!(output.unknown_label_count(), 1);
/// # Ok::<(), ekflog::EkfLogError>(())
/// ```
pub fn decode_text<R: Read>(delimiter: u8, source: R) -> Result<TextDecodeOutput> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(source);

    let mut output = TextDecodeOutput::default();
    let mut row = csv::StringRecord::new();

    while reader.read_record(&mut row)? {
        let line = row.position().map(|p| p.line()).unwrap_or_default();

        if row.len() < 2 {
            debug!("Skipping line {}: only {} field(s)", line, row.len());
            output.skipped.push(SkippedLine {
                line,
                reason: SkipReason::TooFewFields(row.len()),
            });
            continue;
        }

        let Some(kind) = RecordKind::from_label(&row[1]) else {
            warn!("Unknown entry in log file at line {}: {:?}", line, &row[1]);
            output.skipped.push(SkippedLine {
                line,
                reason: SkipReason::UnknownLabel(row[1].to_string()),
            });
            continue;
        };

        output.records.push(RowParser::new(&row, line).parse(kind)?);
    }

    debug!(
        "Text decoder read {} records, skipped {} lines",
        output.records.len(),
        output.skipped.len()
    );

    Ok(output)
}

/// Cursor over the columns of one row
struct RowParser<'r> {
    row: &'r csv::StringRecord,
    line: u64,
    column: usize,
}

impl<'r> RowParser<'r> {
    fn new(row: &'r csv::StringRecord, line: u64) -> Self {
        Self { row, line, column: 0 }
    }

    fn malformed(&self, reason: String) -> EkfLogError {
        EkfLogError::MalformedLine {
            line: self.line,
            reason,
        }
    }

    /// Parse the next column as `T`
    fn value<T>(&mut self, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let column = self.column;
        self.column += 1;

        let text = self
            .row
            .get(column)
            .ok_or_else(|| self.malformed(format!("missing column {} ({})", column + 1, name)))?;

        text.parse().map_err(|e| {
            self.malformed(format!("column {} ({}) = {:?}: {}", column + 1, name, text, e))
        })
    }

    fn vector3<T>(&mut self, name: &str) -> Result<Vector3<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        Ok(Vector3 {
            x: self.value(&format!("{}.x", name))?,
            y: self.value(&format!("{}.y", name))?,
            z: self.value(&format!("{}.z", name))?,
        })
    }

    fn ned<T>(&mut self, name: &str) -> Result<Ned<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        Ok(Ned {
            north: self.value(&format!("{}.north", name))?,
            east: self.value(&format!("{}.east", name))?,
            down: self.value(&format!("{}.down", name))?,
        })
    }

    fn parse(mut self, kind: RecordKind) -> Result<LogRecord> {
        let expected = column_count(kind);
        if self.row.len() < expected {
            return Err(self.malformed(format!(
                "{} entry needs {} columns, found {}",
                kind,
                expected,
                self.row.len()
            )));
        }

        let id = self.value("id")?;
        self.column += 1; // label
        let timestamp = self.value("timestamp")?;

        let payload = match kind {
            RecordKind::Time => RecordPayload::Time,
            RecordKind::Imu => RecordPayload::Imu(ImuData {
                accel: self.vector3("accel")?,
                gyro: self.vector3("gyro")?,
                delta_angle: self.vector3("delta_angle")?,
                mag: self.vector3("mag")?,
            }),
            RecordKind::Gps => RecordPayload::Gps(GpsData {
                position: GlobalPosition {
                    latitude: self.value("latitude")?,
                    longitude: self.value("longitude")?,
                    altitude: self.value("altitude")?,
                },
                horizontal_accuracy: self.value("horizontal_accuracy")?,
                velocity_accuracy: self.value("velocity_accuracy")?,
                fix: self.value("fix")?,
                satellite_count: self.value("satellite_count")?,
                velocity: self.ned("velocity")?,
            }),
            RecordKind::Baro => RecordPayload::Baro(BaroData {
                pressure: self.value("pressure")?,
                temperature: self.value("temperature")?,
            }),
            RecordKind::EkfState => RecordPayload::EkfState(EkfStateData {
                attitude: Quaternion {
                    w: self.value("attitude.w")?,
                    x: self.value("attitude.x")?,
                    y: self.value("attitude.y")?,
                    z: self.value("attitude.z")?,
                },
                gyro_bias: self.vector3("gyro_bias")?,
                velocity: self.ned("velocity")?,
                accel_bias: self.vector3("accel_bias")?,
                position: self.ned("position")?,
            }),
        };

        if self.row.len() > expected {
            debug!(
                "Line {}: ignoring {} extra column(s)",
                self.line,
                self.row.len() - expected
            );
        }

        Ok(LogRecord::new(id, timestamp, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(text: &str) -> Result<TextDecodeOutput> {
        decode_text(b',', text.as_bytes())
    }

    #[test]
    fn test_decode_every_kind() {
        let text = "\
1,Time,100
2,Imu,101,0,0,-9806,0,0,0,0,0,0,275,-19,-161
3,Gps,102,1,2,3,4,5,6,7,8,9,10
4,Baro,103,101325,297150
5,EkfState,104,1,0,0,0,0.1,0.2,0.3,1,2,3,-0.5,0.25,0,10,20,-30
";
        let output = decode(text).unwrap();

        assert!(output.skipped.is_empty());
        assert_eq!(output.records.len(), 5);
        assert_eq!(output.records[0], LogRecord::time(1, 100));
        assert_eq!(
            output.records[1],
            LogRecord::imu(
                2,
                101,
                ImuData {
                    accel: Vector3::new(0, 0, -9806),
                    gyro: Vector3::default(),
                    delta_angle: Vector3::default(),
                    mag: Vector3::new(275, -19, -161),
                }
            )
        );
        match output.records[2].payload {
            RecordPayload::Gps(gps) => {
                assert_eq!(gps.position.latitude, 1);
                assert_eq!(gps.position.altitude, 3);
                assert_eq!(gps.fix, 6);
                assert_eq!(gps.satellite_count, 7);
                assert_eq!(gps.velocity, Ned::new(8, 9, 10));
            }
            other => panic!("unexpected payload {:?}", other),
        }
        match output.records[4].payload {
            RecordPayload::EkfState(state) => {
                assert_eq!(state.attitude, Quaternion::IDENTITY);
                assert_eq!(state.position, Ned::new(10.0, 20.0, -30.0));
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_unknown_label_is_skipped() {
        let text = "1,Time,100\n2,Status,101,7\n3,Time,102\n";
        let output = decode(text).unwrap();

        assert_eq!(output.records, vec![LogRecord::time(1, 100), LogRecord::time(3, 102)]);
        assert_eq!(
            output.skipped,
            vec![SkippedLine {
                line: 2,
                reason: SkipReason::UnknownLabel("Status".to_string()),
            }]
        );
    }

    #[test]
    fn test_short_lines_are_skipped() {
        let text = "1,Time,100\n\nWARNING\n2,Time,101\n";
        let output = decode(text).unwrap();

        assert_eq!(output.records.len(), 2);
        assert!(output
            .skipped
            .iter()
            .all(|s| matches!(s.reason, SkipReason::TooFewFields(n) if n < 2)));
    }

    #[test]
    fn test_skip_counts_by_reason() {
        let text = "1,Time,100\nnoise\n2,Status,101\n\n3,Wind,102,4\n4,Time,103\n";
        let output = decode(text).unwrap();

        assert_eq!(output.records.len(), 2);
        assert_eq!(output.skipped.len(), 3);
        assert_eq!(output.unknown_label_count(), 2);
        assert_eq!(output.too_few_fields_count(), 1);
    }

    #[test]
    fn test_whitespace_around_fields() {
        let output = decode("7, Baro , 9, -5, 10\n").unwrap();
        assert_eq!(
            output.records,
            vec![LogRecord::baro(7, 9, BaroData { pressure: -5, temperature: 10 })]
        );
    }

    #[test]
    fn test_missing_columns_is_malformed() {
        match decode("1,Time,100\n2,Baro,101,5\n") {
            Err(EkfLogError::MalformedLine { line, reason }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("needs 5 columns"));
            }
            other => panic!("expected malformed line, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_number_is_malformed() {
        match decode("1,Baro,100,abc,5\n") {
            Err(EkfLogError::MalformedLine { line: 1, reason }) => assert!(reason.contains("pressure")),
            other => panic!("expected malformed line, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_unsigned_is_malformed() {
        assert!(matches!(
            decode("1,Baro,100,5,-1\n"),
            Err(EkfLogError::MalformedLine { .. })
        ));
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let output = decode("1,Time,100,extra,columns\n").unwrap();
        assert_eq!(output.records, vec![LogRecord::time(1, 100)]);
    }

    #[test]
    fn test_quoted_fields() {
        let output = decode("\"1\",\"Time\",\"100\"\n").unwrap();
        assert_eq!(output.records, vec![LogRecord::time(1, 100)]);
    }

    #[test]
    fn test_column_counts() {
        assert_eq!(column_count(RecordKind::Time), 3);
        assert_eq!(column_count(RecordKind::Imu), 15);
        assert_eq!(column_count(RecordKind::Gps), 13);
        assert_eq!(column_count(RecordKind::Baro), 5);
        assert_eq!(column_count(RecordKind::EkfState), 19);
    }
}
