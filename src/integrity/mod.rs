//! # Stream Integrity
//!
//! Gap accounting and id lookup over a decoded record sequence.
//!
//! Ids are expected to be strictly increasing. A gap between two neighbouring
//! ids means records were dropped by the logger; a negative gap means the ids
//! went backwards and is reported as-is.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{EkfLogError, Result};
use crate::record::{LogRecord, RecordKind};

/// Read-only view over a record sequence
#[derive(Debug, Clone)]
pub struct StreamIntegrity<'a> {
    records: &'a [LogRecord],
    total_missing: u64,
}

/// Serializable summary of a record sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub records: usize,
    pub first_id: Option<u32>,
    pub last_id: Option<u32>,
    pub total_missing: u64,
    pub kinds: BTreeMap<RecordKind, usize>,
}

fn gap(records: &[LogRecord], position: usize) -> i64 {
    let id = i64::from(records[position].id);
    match position {
        0 => id - 1,
        _ => id - i64::from(records[position - 1].id) - 1,
    }
}

impl<'a> StreamIntegrity<'a> {
    pub fn new(records: &'a [LogRecord]) -> Self {
        let total_missing = (0..records.len())
            .map(|position| gap(records, position))
            .filter(|&missing| missing > 0)
            .map(|missing| missing as u64)
            .sum();

        Self {
            records,
            total_missing,
        }
    }

    /// Number of ids missing right before `position`
    ///
    /// For the first record this is `id - 1`, since ids start at 1. Returns
    /// `None` if `position` is past the end.
    pub fn missing_count_at(&self, position: usize) -> Option<i64> {
        (position < self.records.len()).then(|| gap(self.records, position))
    }

    /// `missing_count_at` for every position
    pub fn missing_counts(&self) -> Vec<i64> {
        (0..self.records.len())
            .map(|position| gap(self.records, position))
            .collect()
    }

    /// Sum of all positive gaps
    pub fn total_missing(&self) -> u64 {
        self.total_missing
    }

    /// Position of a record with the same id
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record carries that id.
    pub fn index_of(&self, record: &LogRecord) -> Result<usize> {
        self.index_of_id(record.id)
    }

    /// Position of the record with the given id
    pub fn index_of_id(&self, id: u32) -> Result<usize> {
        self.records
            .binary_search_by_key(&id, |record| record.id)
            .map_err(|_| EkfLogError::NotFound(id))
    }

    /// Number of records of each kind
    pub fn kind_counts(&self) -> BTreeMap<RecordKind, usize> {
        let mut counts: BTreeMap<RecordKind, usize> =
            RecordKind::ALL.iter().map(|&kind| (kind, 0)).collect();
        for record in self.records {
            *counts.entry(record.kind()).or_default() += 1;
        }
        counts
    }

    pub fn report(&self) -> IntegrityReport {
        IntegrityReport {
            records: self.records.len(),
            first_id: self.records.first().map(|r| r.id),
            last_id: self.records.last().map(|r| r.id),
            total_missing: self.total_missing,
            kinds: self.kind_counts(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times(ids: &[u32]) -> Vec<LogRecord> {
        ids.iter()
            .map(|&id| LogRecord::time(id, u64::from(id) * 1000))
            .collect()
    }

    #[test]
    fn test_gaps_between_records() {
        let records = times(&[1, 2, 5, 6, 9]);
        let integrity = StreamIntegrity::new(&records);

        assert_eq!(integrity.missing_counts(), vec![0, 0, 2, 0, 2]);
        assert_eq!(integrity.total_missing(), 4);
    }

    #[test]
    fn test_gap_before_first_record() {
        let records = times(&[5, 6, 7]);
        let integrity = StreamIntegrity::new(&records);

        assert_eq!(integrity.missing_count_at(0), Some(4));
        assert_eq!(integrity.missing_count_at(1), Some(0));
        assert_eq!(integrity.total_missing(), 4);
    }

    #[test]
    fn test_position_past_end() {
        let records = times(&[1, 2]);
        assert_eq!(StreamIntegrity::new(&records).missing_count_at(2), None);
    }

    #[test]
    fn test_backwards_ids_are_negative_and_not_counted() {
        let records = times(&[1, 4, 3]);
        let integrity = StreamIntegrity::new(&records);

        assert_eq!(integrity.missing_count_at(2), Some(-2));
        assert_eq!(integrity.total_missing(), 2);
    }

    #[test]
    fn test_empty_stream() {
        let integrity = StreamIntegrity::new(&[]);

        assert_eq!(integrity.total_missing(), 0);
        assert!(integrity.missing_counts().is_empty());
        assert!(matches!(integrity.index_of_id(1), Err(EkfLogError::NotFound(1))));
    }

    #[test]
    fn test_index_of_present_records() {
        let records = times(&[1, 2, 5, 6, 9]);
        let integrity = StreamIntegrity::new(&records);

        for (position, record) in records.iter().enumerate() {
            assert_eq!(integrity.index_of(record).unwrap(), position);
        }
    }

    #[test]
    fn test_index_of_matches_on_id_only() {
        let records = times(&[1, 2, 5]);
        let integrity = StreamIntegrity::new(&records);

        let other = LogRecord::baro(5, 0, Default::default());
        assert_eq!(integrity.index_of(&other).unwrap(), 2);
    }

    #[test]
    fn test_index_of_absent_ids() {
        let records = times(&[3, 4, 7]);
        let integrity = StreamIntegrity::new(&records);

        for id in [1, 5, 8, u32::MAX] {
            assert!(matches!(
                integrity.index_of(&LogRecord::time(id, 0)),
                Err(EkfLogError::NotFound(missing)) if missing == id
            ));
        }
    }

    #[test]
    fn test_report() {
        let records = vec![
            LogRecord::time(2, 0),
            LogRecord::imu(3, 0, Default::default()),
            LogRecord::time(6, 0),
        ];
        let report = StreamIntegrity::new(&records).report();

        assert_eq!(report.records, 3);
        assert_eq!(report.first_id, Some(2));
        assert_eq!(report.last_id, Some(6));
        assert_eq!(report.total_missing, 3);
        assert_eq!(report.kinds[&RecordKind::Time], 2);
        assert_eq!(report.kinds[&RecordKind::Imu], 1);
        assert_eq!(report.kinds[&RecordKind::EkfState], 0);
    }

    #[test]
    fn test_report_serializes_kind_names() {
        let records = times(&[1]);
        let json = serde_json::to_value(StreamIntegrity::new(&records).report()).unwrap();

        assert_eq!(json["kinds"]["Time"], 1);
        assert_eq!(json["total_missing"], 0);
    }
}
