//! Enum definitions.

use scdb_proto::{json_scalar, Value};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::{DecodeError, SchemaError};

/// A named, ordered mapping of labels to scalar values.
///
/// Membership of an enum field is exactly the set of member values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDef {
    /// Enum name (unique within the database).
    pub name: String,
    members: Vec<(String, Value)>,
}

impl EnumDef {
    /// Create an enum from `(label, value)` pairs.
    ///
    /// Values must be integers or strings and labels must be distinct.
    pub fn new<L, V>(
        name: impl Into<String>,
        members: impl IntoIterator<Item = (L, V)>,
    ) -> Result<Self, SchemaError>
    where
        L: Into<String>,
        V: Into<Value>,
    {
        let name = name.into();
        let mut def = Self {
            name,
            members: Vec::new(),
        };
        for (label, value) in members {
            def.push_member(label.into(), value.into())?;
        }
        Ok(def)
    }

    fn push_member(&mut self, label: String, value: Value) -> Result<(), SchemaError> {
        if !matches!(value, Value::Integer(_) | Value::String(_)) {
            return Err(SchemaError::InvalidEnumMember {
                enum_name: self.name.clone(),
                label,
                kind: value.kind_name(),
            });
        }
        if self.members.iter().any(|(l, _)| *l == label) {
            return Err(SchemaError::DuplicateEnumLabel {
                enum_name: self.name.clone(),
                label,
            });
        }
        self.members.push((label, value));
        Ok(())
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[(String, Value)] {
        &self.members
    }

    /// Check if `value` is one of the member values.
    pub fn contains(&self, value: &Value) -> bool {
        self.members.iter().any(|(_, v)| v == value)
    }

    /// Value for a label.
    pub fn value_of(&self, label: &str) -> Option<&Value> {
        self.members
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v)
    }

    /// First label whose value equals `value`.
    pub fn label_of(&self, value: &Value) -> Option<&str> {
        self.members
            .iter()
            .find(|(_, v)| v == value)
            .map(|(l, _)| l.as_str())
    }

    /// The member mapping as an ordered JSON object.
    pub fn to_json(&self) -> Map<String, JsonValue> {
        self.members
            .iter()
            .map(|(label, value)| {
                let json = match value {
                    Value::Integer(i) => JsonValue::from(*i),
                    Value::String(s) => JsonValue::from(s.as_str()),
                    _ => JsonValue::Null,
                };
                (label.clone(), json)
            })
            .collect()
    }

    /// Rebuild an enum from its JSON member mapping.
    pub fn from_json(
        name: impl Into<String>,
        mapping: Map<String, JsonValue>,
    ) -> Result<Self, DecodeError> {
        let mut def = Self {
            name: name.into(),
            members: Vec::with_capacity(mapping.len()),
        };
        for (label, json) in mapping {
            let value = json_scalar(&json).ok_or_else(|| DecodeError::InvalidEnumBlob {
                enum_name: def.name.clone(),
                reason: "member values must be integers or strings",
            })?;
            def.push_member(label, value)
                .map_err(|_| DecodeError::InvalidEnumBlob {
                    enum_name: def.name.clone(),
                    reason: "duplicate member label",
                })?;
        }
        Ok(def)
    }
}
