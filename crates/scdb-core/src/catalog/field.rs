//! Field definitions for tables.

use scdb_proto::Value;
use serde::Serialize;

use super::types::FieldKind;

/// A field definition within a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Field kind.
    pub kind: FieldKind,
    /// Whether this field is the table's primary key.
    pub primary_key: bool,
    /// Whether null is accepted.
    pub nullable: bool,
    /// Whether non-null values must be distinct across the table.
    pub unique: bool,
    /// Value used when a record omits this field.
    pub default: Option<Value>,
}

impl FieldDef {
    /// Create a new non-nullable field.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            primary_key: false,
            nullable: false,
            unique: false,
            default: None,
        }
    }

    /// Create a nullable field.
    pub fn optional(name: impl Into<String>, kind: FieldKind) -> Self {
        Self::new(name, kind).nullable()
    }

    /// Mark as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Accept null values.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Require distinct non-null values.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Check if this field has a default value.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_def_builder() {
        let field = FieldDef::new("id", FieldKind::integer())
            .primary_key()
            .unique();

        assert_eq!(field.name, "id");
        assert!(field.primary_key);
        assert!(field.unique);
        assert!(!field.nullable);
        assert!(!field.has_default());
    }

    #[test]
    fn test_optional_field_with_default() {
        let field = FieldDef::optional("active", FieldKind::Boolean)
            .with_default(true);

        assert!(field.nullable);
        assert_eq!(field.default, Some(Value::Boolean(true)));
    }
}
