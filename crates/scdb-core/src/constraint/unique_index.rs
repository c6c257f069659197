//! Index for enforcing unique fields.
//!
//! Maps each unique field value to the position of the record holding it,
//! enabling duplicate detection without scanning.

use std::collections::HashMap;

use scdb_proto::{Value, WireWriter};

use crate::error::Error;

/// In-memory index of unique field values.
///
/// Key format: `table\0field\0<tagged value bytes>` -> record position.
/// Values that never compare equal (null, or anything holding NaN) are not
/// indexed, and `-0.0` is keyed as `0.0`.
#[derive(Debug, Clone, Default)]
pub struct UniqueIndex {
    entries: HashMap<Vec<u8>, usize>,
}

impl UniqueIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    fn build_key(table: &str, field: &str, value: &Value) -> Result<Option<Vec<u8>>, Error> {
        let Some(value) = canonical(value) else {
            return Ok(None);
        };
        let mut writer = WireWriter::new();
        writer.put_value(&value)?;
        let encoded = writer.into_inner();

        let mut key = Vec::with_capacity(table.len() + field.len() + encoded.len() + 2);
        key.extend_from_slice(table.as_bytes());
        key.push(0);
        key.extend_from_slice(field.as_bytes());
        key.push(0);
        key.extend_from_slice(&encoded);
        Ok(Some(key))
    }

    /// Check that `value` is free for the record at `position`.
    pub fn check(
        &self,
        table: &str,
        field: &str,
        value: &Value,
        position: usize,
    ) -> Result<(), Error> {
        let Some(key) = Self::build_key(table, field, value)? else {
            return Ok(());
        };
        match self.entries.get(&key) {
            Some(&existing) if existing != position => Err(Error::UniqueViolation {
                table: table.to_string(),
                field: field.to_string(),
                value: value.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Record `value` as held by the record at `position`.
    pub fn insert(
        &mut self,
        table: &str,
        field: &str,
        value: &Value,
        position: usize,
    ) -> Result<(), Error> {
        self.check(table, field, value, position)?;
        if let Some(key) = Self::build_key(table, field, value)? {
            self.entries.insert(key, position);
        }
        Ok(())
    }

    /// Release `value`.
    pub fn remove(&mut self, table: &str, field: &str, value: &Value) {
        if let Ok(Some(key)) = Self::build_key(table, field, value) {
            self.entries.remove(&key);
        }
    }

    /// Number of indexed values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The value as it should be keyed, or `None` if it equals nothing.
fn canonical(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Float(f) if f.is_nan() => None,
        Value::Float(f) if *f == 0.0 => Some(Value::Float(0.0)),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => Some(Value::Null),
                other => canonical(other),
            })
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        other => Some(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_detected() {
        let mut index = UniqueIndex::new();
        index
            .insert("User", "email", &Value::from("a@x.io"), 0)
            .unwrap();

        let result = index.insert("User", "email", &Value::from("a@x.io"), 1);
        assert!(matches!(result, Err(Error::UniqueViolation { .. })));

        // Same record re-asserting its own value is fine.
        index
            .insert("User", "email", &Value::from("a@x.io"), 0)
            .unwrap();
    }

    #[test]
    fn test_scoped_by_table_and_field() {
        let mut index = UniqueIndex::new();
        index.insert("User", "email", &Value::from("x"), 0).unwrap();
        index.insert("User", "name", &Value::from("x"), 0).unwrap();
        index.insert("Team", "email", &Value::from("x"), 0).unwrap();
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_nulls_not_indexed() {
        let mut index = UniqueIndex::new();
        index.insert("User", "email", &Value::Null, 0).unwrap();
        index.insert("User", "email", &Value::Null, 1).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_remove_frees_value() {
        let mut index = UniqueIndex::new();
        index.insert("User", "id", &Value::Integer(1), 0).unwrap();
        index.remove("User", "id", &Value::Integer(1));
        index.insert("User", "id", &Value::Integer(1), 3).unwrap();
    }

    #[test]
    fn test_float_keys_follow_value_equality() {
        let mut index = UniqueIndex::new();
        index.insert("Point", "x", &Value::Float(0.0), 0).unwrap();
        assert!(matches!(
            index.insert("Point", "x", &Value::Float(-0.0), 1),
            Err(Error::UniqueViolation { .. })
        ));

        index.insert("Point", "x", &Value::Float(f64::NAN), 2).unwrap();
        index.insert("Point", "x", &Value::Float(f64::NAN), 3).unwrap();
        index
            .insert("Point", "y", &Value::Array(vec![Value::Float(f64::NAN)]), 4)
            .unwrap();
        index
            .insert("Point", "y", &Value::Array(vec![Value::Float(f64::NAN)]), 5)
            .unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_keys_distinguish_kinds() {
        let mut index = UniqueIndex::new();
        index.insert("T", "v", &Value::Integer(1), 0).unwrap();
        index.insert("T", "v", &Value::from("1"), 1).unwrap();
        index.insert("T", "v", &Value::Boolean(true), 2).unwrap();
        assert_eq!(index.len(), 3);
    }
}
