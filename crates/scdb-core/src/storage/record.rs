//! Record and record key types.

use std::fmt;

use scdb_proto::Value;
use serde::Serialize;

/// Identity of a record within its table.
///
/// The primary key value when the table declares one, otherwise the record's
/// position in the table's sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum RecordKey {
    Int(i64),
    Str(String),
}

impl RecordKey {
    /// Interpret a value as a key. Only integers and strings are keys.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(i) => Some(RecordKey::Int(*i)),
            Value::String(s) => Some(RecordKey::Str(s.clone())),
            _ => None,
        }
    }

    /// Positional key.
    pub fn position(pos: usize) -> Self {
        RecordKey::Int(pos as i64)
    }

    /// The key as a field value.
    pub fn to_value(&self) -> Value {
        match self {
            RecordKey::Int(i) => Value::Integer(*i),
            RecordKey::Str(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Int(i) => write!(f, "{i}"),
            RecordKey::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for RecordKey {
    fn from(v: i64) -> Self {
        RecordKey::Int(v)
    }
}

impl From<i32> for RecordKey {
    fn from(v: i32) -> Self {
        RecordKey::Int(v as i64)
    }
}

impl From<&str> for RecordKey {
    fn from(v: &str) -> Self {
        RecordKey::Str(v.to_string())
    }
}

impl From<String> for RecordKey {
    fn from(v: String) -> Self {
        RecordKey::Str(v)
    }
}

/// A validated instance of a table.
///
/// Holds exactly one value per declared field, in declaration order. Records
/// are only built through the database's validation path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    table: String,
    fields: Vec<(String, Value)>,
}

impl Record {
    pub(crate) fn new(table: impl Into<String>, fields: Vec<(String, Value)>) -> Self {
        Self {
            table: table.into(),
            fields,
        }
    }

    /// Name of the table this record belongs to.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Field name/value pairs in declaration order.
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Get a field value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Get a field value by declaration position.
    pub fn value_at(&self, idx: usize) -> Option<&Value> {
        self.fields.get(idx).map(|(_, v)| v)
    }

    pub(crate) fn set_at(&mut self, idx: usize, value: Value) {
        if let Some(slot) = self.fields.get_mut(idx) {
            slot.1 = value;
        }
    }

    /// Consume the record, returning its field pairs.
    pub fn into_fields(self) -> Vec<(String, Value)> {
        self.fields
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.table)?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name} = {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_value() {
        assert_eq!(
            RecordKey::from_value(&Value::Integer(3)),
            Some(RecordKey::Int(3))
        );
        assert_eq!(
            RecordKey::from_value(&Value::String("a".into())),
            Some(RecordKey::Str("a".into()))
        );
        assert_eq!(RecordKey::from_value(&Value::Float(1.0)), None);
        assert_eq!(RecordKey::Int(3).to_value(), Value::Integer(3));
    }

    #[test]
    fn test_record_access_and_display() {
        let mut record = Record::new(
            "User",
            vec![
                ("id".to_string(), Value::Integer(1)),
                ("name".to_string(), Value::String("Alice".into())),
            ],
        );
        assert_eq!(record.get("id"), Some(&Value::Integer(1)));
        assert_eq!(record.get("age"), None);
        assert_eq!(record.to_string(), "User: id = 1, name = \"Alice\"");

        record.set_at(1, Value::String("James".into()));
        assert_eq!(record.value_at(1), Some(&Value::String("James".into())));
    }
}
