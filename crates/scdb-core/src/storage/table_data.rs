//! Per-table record sequence.

use std::collections::HashMap;

use super::record::{Record, RecordKey};

/// The ordered records of one table.
///
/// Keyed tables keep a map from primary key to the position of the first
/// record carrying it, so point lookups by key do not scan. Tables without a
/// primary key are addressed positionally.
#[derive(Debug, Clone, Default)]
pub struct TableData {
    records: Vec<Record>,
    first_by_key: HashMap<RecordKey, usize>,
}

impl TableData {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record under `key`. Returns its position.
    pub(crate) fn push(&mut self, key: RecordKey, record: Record) -> usize {
        let pos = self.records.len();
        self.first_by_key.entry(key).or_insert(pos);
        self.records.push(record);
        pos
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub(crate) fn get_mut(&mut self, pos: usize) -> Option<&mut Record> {
        self.records.get_mut(pos)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of the first record with the given key.
    ///
    /// `keyed` selects primary-key lookup; otherwise the key is a position.
    pub fn position_of(&self, key: &RecordKey, keyed: bool) -> Option<usize> {
        if keyed {
            return self.first_by_key.get(key).copied();
        }
        match key {
            RecordKey::Int(i) => usize::try_from(*i).ok().filter(|&p| p < self.records.len()),
            RecordKey::Str(_) => None,
        }
    }

    /// First record with the given key.
    pub fn find(&self, key: &RecordKey, keyed: bool) -> Option<&Record> {
        self.position_of(key, keyed).map(|p| &self.records[p])
    }
}
