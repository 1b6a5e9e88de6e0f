//! # Error Types
//!
//! Custom error types for the EKF log codec using `thiserror`.

use thiserror::Error;

use crate::format::layout::Field;

/// Main error type for EKF log handling
#[derive(Debug, Error)]
pub enum EkfLogError {
    /// A fixed-width field was only partially present at the end of the stream
    #[error(
        "Truncated log: field `{field}` at byte {offset} needs {expected} bytes, only {available} available (last valid id: {})",
        display_last_id(.last_id)
    )]
    Truncation {
        field: Field,
        offset: u64,
        expected: usize,
        available: usize,
        last_id: Option<u32>,
    },

    /// Unrecognized binary kind tag
    #[error(
        "Unknown entry in log file: kind tag {tag:?} at byte {offset} (last valid id: {})",
        display_last_id(.last_id)
    )]
    UnknownKind {
        tag: String,
        offset: u64,
        last_id: Option<u32>,
    },

    /// Index lookup miss
    #[error("Record with id {0} not found")]
    NotFound(u32),

    /// Value does not fit the field's encoding or the record model
    #[error("Value {value} does not fit field `{field}` ({detail})")]
    ValueOutOfRange {
        field: Field,
        value: i128,
        detail: String,
    },

    /// Text row with a known kind label but unusable contents
    #[error("Malformed line {line}: {reason}")]
    MalformedLine { line: u64, reason: String },

    /// Configuration errors (unsupported extension, bad layout, invalid values)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Configuration file parse errors
    #[error("Configuration parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Delimited-text errors other than I/O
    #[error("CSV error: {0}")]
    Csv(csv::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for EkfLogError {
    fn from(err: csv::Error) -> Self {
        if !err.is_io_error() {
            return EkfLogError::Csv(err);
        }

        match err.into_kind() {
            csv::ErrorKind::Io(io) => EkfLogError::Io(io),
            // is_io_error() guarantees the Io kind
            other => EkfLogError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("{:?}", other),
            )),
        }
    }
}

fn display_last_id(last_id: &Option<u32>) -> String {
    match last_id {
        Some(id) => id.to_string(),
        None => "none".to_string(),
    }
}

/// Result type alias for EKF log handling
pub type Result<T> = std::result::Result<T, EkfLogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncation_message_names_last_id() {
        let err = EkfLogError::Truncation {
            field: Field::Timestamp,
            offset: 18,
            expected: 8,
            available: 3,
            last_id: Some(41),
        };
        let msg = err.to_string();
        assert!(msg.contains("timestamp"));
        assert!(msg.contains("last valid id: 41"));
    }

    #[test]
    fn test_unknown_kind_without_previous_record() {
        let err = EkfLogError::UnknownKind {
            tag: "X".to_string(),
            offset: 4,
            last_id: None,
        };
        assert!(err.to_string().contains("last valid id: none"));
    }

    #[test]
    fn test_csv_io_error_maps_to_io() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: EkfLogError = csv::Error::from(io).into();
        assert!(matches!(err, EkfLogError::Io(_)));
    }

    #[test]
    fn test_csv_io_error_keeps_os_error() {
        let io = std::io::Error::from_raw_os_error(32);
        let err: EkfLogError = csv::Error::from(io).into();

        match err {
            EkfLogError::Io(io) => assert_eq!(io.raw_os_error(), Some(32)),
            other => panic!("expected I/O error, got {:?}", other),
        }
    }
}
