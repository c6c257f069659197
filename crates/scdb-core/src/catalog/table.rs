//! Table definitions.

use serde::Serialize;

use super::field::FieldDef;
use super::types::FieldKind;
use crate::error::SchemaError;

/// A table definition: a name plus ordered fields.
///
/// Field order is significant: it is the codec layout order and the order
/// records expose their values in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDef {
    /// Table name (unique within the database).
    pub name: String,
    fields: Vec<FieldDef>,
}

impl TableDef {
    /// Create a table definition, checking field-level schema rules.
    pub fn new(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = FieldDef>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        let fields: Vec<FieldDef> = fields.into_iter().collect();

        let mut primary_key: Option<&FieldDef> = None;
        let mut join_targets: Vec<&str> = Vec::new();

        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(SchemaError::DuplicateField {
                    table: name,
                    field: field.name.clone(),
                });
            }

            if field.primary_key {
                if primary_key.is_some() {
                    return Err(SchemaError::MultiplePrimaryKeys(name));
                }
                // Keys are never null.
                if field.nullable
                    || !matches!(
                        field.kind,
                        FieldKind::Integer { .. } | FieldKind::String { .. }
                    )
                {
                    return Err(SchemaError::InvalidPrimaryKey {
                        table: name,
                        field: field.name.clone(),
                    });
                }
                primary_key = Some(field);
            }

            if let FieldKind::ManyToMany { target_table } = &field.kind {
                if join_targets.contains(&target_table.as_str()) {
                    return Err(SchemaError::AmbiguousJoin {
                        table: name,
                        target: target_table.clone(),
                    });
                }
                join_targets.push(target_table);
            }
        }

        Ok(Self { name, fields })
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Get a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Position of a field in declaration order.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// The primary key field and its position, if declared.
    pub fn primary_key(&self) -> Option<(usize, &FieldDef)> {
        self.fields.iter().enumerate().find(|(_, f)| f.primary_key)
    }

    /// Fields holding many-to-many references.
    pub fn many_to_many_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.kind.is_many_to_many())
    }

    /// Fields whose kind names a target table.
    pub fn relation_fields(&self) -> impl Iterator<Item = (&FieldDef, &str)> {
        self.fields
            .iter()
            .filter_map(|f| f.kind.target_table().map(|t| (f, t)))
    }
}
