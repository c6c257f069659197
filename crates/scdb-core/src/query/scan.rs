//! Linear equality scan.
//!
//! A scan walks a table's records in insertion order and keeps every record
//! whose fields equal all criteria. Results collapse by match count into
//! [`ScanResult`].

use scdb_proto::Value;

use crate::storage::Record;

/// Outcome of a scan, shaped by how many records matched.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanResult<'a> {
    /// No record matched.
    None,
    /// Exactly one record matched.
    One(&'a Record),
    /// Two or more records matched, in insertion order.
    Many(Vec<&'a Record>),
}

impl<'a> ScanResult<'a> {
    /// Collapse a list of matches.
    pub fn from_matches(mut matches: Vec<&'a Record>) -> Self {
        match matches.len() {
            0 => ScanResult::None,
            1 => ScanResult::One(matches.remove(0)),
            _ => ScanResult::Many(matches),
        }
    }

    /// Check if nothing matched.
    pub fn is_none(&self) -> bool {
        matches!(self, ScanResult::None)
    }

    /// Number of matched records.
    pub fn len(&self) -> usize {
        match self {
            ScanResult::None => 0,
            ScanResult::One(_) => 1,
            ScanResult::Many(records) => records.len(),
        }
    }

    /// Check if nothing matched.
    pub fn is_empty(&self) -> bool {
        self.is_none()
    }

    /// The single match, if exactly one record matched.
    pub fn one(&self) -> Option<&'a Record> {
        match self {
            ScanResult::One(record) => Some(record),
            _ => None,
        }
    }

    /// The earliest match.
    pub fn first(&self) -> Option<&'a Record> {
        match self {
            ScanResult::None => None,
            ScanResult::One(record) => Some(record),
            ScanResult::Many(records) => records.first().copied(),
        }
    }

    /// Flatten into a list regardless of shape.
    pub fn into_vec(self) -> Vec<&'a Record> {
        match self {
            ScanResult::None => Vec::new(),
            ScanResult::One(record) => vec![record],
            ScanResult::Many(records) => records,
        }
    }
}

/// Canonicalized equality criteria, addressed by field position.
#[derive(Debug, Clone, Default)]
pub struct ScanFilter {
    criteria: Vec<(usize, Value)>,
}

impl ScanFilter {
    /// Create an empty filter, which matches every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality criterion on the field at `idx`.
    pub fn with_criterion(mut self, idx: usize, value: Value) -> Self {
        self.criteria.push((idx, value));
        self
    }

    /// Check if a record satisfies every criterion.
    pub fn matches(&self, record: &Record) -> bool {
        self.criteria
            .iter()
            .all(|(idx, expected)| record.value_at(*idx) == Some(expected))
    }

    /// Scan records in order.
    pub fn scan<'a>(&self, records: &'a [Record]) -> ScanResult<'a> {
        ScanResult::from_matches(records.iter().filter(|r| self.matches(r)).collect())
    }

    /// First matching record in order.
    pub fn first<'a>(&self, records: &'a [Record]) -> Option<&'a Record> {
        records.iter().find(|r| self.matches(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, name: &str) -> Record {
        Record::new(
            "User",
            vec![
                ("id".to_string(), Value::Integer(id)),
                ("name".to_string(), Value::from(name)),
            ],
        )
    }

    #[test]
    fn test_collapsing() {
        let records = vec![user(1, "Alice"), user(2, "Bob"), user(3, "Bob")];

        let none = ScanFilter::new()
            .with_criterion(1, Value::from("Carol"))
            .scan(&records);
        assert!(none.is_none());

        let one = ScanFilter::new()
            .with_criterion(0, Value::Integer(1))
            .scan(&records);
        assert_eq!(one.one(), Some(&records[0]));

        let many = ScanFilter::new()
            .with_criterion(1, Value::from("Bob"))
            .scan(&records);
        match many {
            ScanResult::Many(found) => {
                assert_eq!(found, vec![&records[1], &records[2]]);
            }
            other => panic!("expected many, got {other:?}"),
        }
    }

    #[test]
    fn test_all_criteria_must_match() {
        let records = vec![user(2, "Bob"), user(3, "Bob")];
        let result = ScanFilter::new()
            .with_criterion(1, Value::from("Bob"))
            .with_criterion(0, Value::Integer(3))
            .scan(&records);
        assert_eq!(result.len(), 1);
        assert_eq!(result.first(), Some(&records[1]));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let records = vec![user(1, "A"), user(2, "B")];
        assert_eq!(ScanFilter::new().scan(&records).into_vec().len(), 2);
        assert_eq!(ScanFilter::new().first(&records), Some(&records[0]));
    }
}
