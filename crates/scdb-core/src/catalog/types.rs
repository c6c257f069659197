//! Core type definitions for the catalog.

use serde::Serialize;

/// Item kinds permitted inside array fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScalarKind {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    Time,
    DateTime,
}

/// Cardinality of a relation field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Cardinality {
    /// One-to-one relation.
    OneToOne,
    /// One-to-many relation.
    OneToMany,
    /// Many-to-many relation.
    ManyToMany,
}

/// The closed set of field kinds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FieldKind {
    /// UTF-8 text, optionally bounded in characters.
    String { max_length: Option<usize> },
    /// 64-bit integer with optional inclusive bounds.
    Integer { min: Option<i64>, max: Option<i64> },
    /// 64-bit float with optional inclusive bounds.
    Float { min: Option<f64>, max: Option<f64> },
    Boolean,
    Date,
    Time,
    DateTime,
    /// Homogeneous list of scalars, optionally bounded in length.
    Array {
        item_kind: ScalarKind,
        max_length: Option<usize>,
    },
    /// Reference to one record of another table.
    Relation {
        target_table: String,
        cardinality: Cardinality,
    },
    /// Reference to one record of another table by primary key.
    ForeignKey { target_table: String },
    /// References to many records of another table, tracked in the relation graph.
    ManyToMany { target_table: String },
    /// One member of a registered enum.
    Enum { enum_name: String },
}

impl ScalarKind {
    /// Wire name of this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            ScalarKind::String => "String",
            ScalarKind::Integer => "Integer",
            ScalarKind::Float => "Float",
            ScalarKind::Boolean => "Boolean",
            ScalarKind::Date => "Date",
            ScalarKind::Time => "Time",
            ScalarKind::DateTime => "DateTime",
        }
    }

    /// Look up a kind by wire name.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "String" => Some(ScalarKind::String),
            "Integer" => Some(ScalarKind::Integer),
            "Float" => Some(ScalarKind::Float),
            "Boolean" => Some(ScalarKind::Boolean),
            "Date" => Some(ScalarKind::Date),
            "Time" => Some(ScalarKind::Time),
            "DateTime" => Some(ScalarKind::DateTime),
            _ => None,
        }
    }

    /// The unbounded field kind an array item is validated as.
    pub fn field_kind(&self) -> FieldKind {
        match self {
            ScalarKind::String => FieldKind::String { max_length: None },
            ScalarKind::Integer => FieldKind::Integer {
                min: None,
                max: None,
            },
            ScalarKind::Float => FieldKind::Float {
                min: None,
                max: None,
            },
            ScalarKind::Boolean => FieldKind::Boolean,
            ScalarKind::Date => FieldKind::Date,
            ScalarKind::Time => FieldKind::Time,
            ScalarKind::DateTime => FieldKind::DateTime,
        }
    }
}

impl Cardinality {
    /// Wire name of this cardinality.
    pub fn tag(&self) -> &'static str {
        match self {
            Cardinality::OneToOne => "OneToOne",
            Cardinality::OneToMany => "OneToMany",
            Cardinality::ManyToMany => "ManyToMany",
        }
    }

    /// Look up a cardinality by wire name.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "OneToOne" => Some(Cardinality::OneToOne),
            "OneToMany" => Some(Cardinality::OneToMany),
            "ManyToMany" => Some(Cardinality::ManyToMany),
            _ => None,
        }
    }
}

impl FieldKind {
    /// Unbounded string field kind.
    pub fn string() -> Self {
        FieldKind::String { max_length: None }
    }

    /// String field kind bounded to `max_length` characters.
    pub fn string_max(max_length: usize) -> Self {
        FieldKind::String {
            max_length: Some(max_length),
        }
    }

    /// Unbounded integer field kind.
    pub fn integer() -> Self {
        FieldKind::Integer {
            min: None,
            max: None,
        }
    }

    /// Integer field kind bounded to `[min, max]`.
    pub fn integer_range(min: i64, max: i64) -> Self {
        FieldKind::Integer {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Unbounded float field kind.
    pub fn float() -> Self {
        FieldKind::Float {
            min: None,
            max: None,
        }
    }

    /// Float field kind bounded to `[min, max]`.
    pub fn float_range(min: f64, max: f64) -> Self {
        FieldKind::Float {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Array field kind.
    pub fn array(item_kind: ScalarKind, max_length: Option<usize>) -> Self {
        FieldKind::Array {
            item_kind,
            max_length,
        }
    }

    /// Relation field kind.
    pub fn relation(target_table: impl Into<String>, cardinality: Cardinality) -> Self {
        FieldKind::Relation {
            target_table: target_table.into(),
            cardinality,
        }
    }

    /// Foreign key field kind.
    pub fn foreign_key(target_table: impl Into<String>) -> Self {
        FieldKind::ForeignKey {
            target_table: target_table.into(),
        }
    }

    /// Many-to-many field kind.
    pub fn many_to_many(target_table: impl Into<String>) -> Self {
        FieldKind::ManyToMany {
            target_table: target_table.into(),
        }
    }

    /// Enum field kind.
    pub fn enumeration(enum_name: impl Into<String>) -> Self {
        FieldKind::Enum {
            enum_name: enum_name.into(),
        }
    }

    /// Wire tag naming this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            FieldKind::String { .. } => "String",
            FieldKind::Integer { .. } => "Integer",
            FieldKind::Float { .. } => "Float",
            FieldKind::Boolean => "Boolean",
            FieldKind::Date => "Date",
            FieldKind::Time => "Time",
            FieldKind::DateTime => "DateTime",
            FieldKind::Array { .. } => "Array",
            FieldKind::Relation { .. } => "Relation",
            FieldKind::ForeignKey { .. } => "ForeignKey",
            FieldKind::ManyToMany { .. } => "ManyToMany",
            FieldKind::Enum { .. } => "Enum",
        }
    }

    /// Target table of a relation-like kind.
    pub fn target_table(&self) -> Option<&str> {
        match self {
            FieldKind::Relation { target_table, .. }
            | FieldKind::ForeignKey { target_table }
            | FieldKind::ManyToMany { target_table } => Some(target_table),
            _ => None,
        }
    }

    /// Check if values of this kind reference a single record that must be
    /// resolvable when decoding.
    pub fn is_single_reference(&self) -> bool {
        matches!(
            self,
            FieldKind::Relation { .. } | FieldKind::ForeignKey { .. }
        )
    }

    /// Check if this kind is a many-to-many reference.
    pub fn is_many_to_many(&self) -> bool {
        matches!(self, FieldKind::ManyToMany { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_roundtrip() {
        for kind in [
            ScalarKind::String,
            ScalarKind::Integer,
            ScalarKind::Float,
            ScalarKind::Boolean,
            ScalarKind::Date,
            ScalarKind::Time,
            ScalarKind::DateTime,
        ] {
            assert_eq!(ScalarKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(ScalarKind::from_tag("Uuid"), None);
        assert_eq!(
            Cardinality::from_tag(Cardinality::OneToMany.tag()),
            Some(Cardinality::OneToMany)
        );
    }

    #[test]
    fn test_target_table() {
        assert_eq!(FieldKind::foreign_key("User").target_table(), Some("User"));
        assert_eq!(
            FieldKind::relation("User", Cardinality::OneToOne).target_table(),
            Some("User")
        );
        assert_eq!(FieldKind::many_to_many("Tag").target_table(), Some("Tag"));
        assert_eq!(FieldKind::integer().target_table(), None);
    }

    #[test]
    fn test_reference_kinds() {
        assert!(FieldKind::foreign_key("User").is_single_reference());
        assert!(!FieldKind::many_to_many("User").is_single_reference());
        assert!(FieldKind::many_to_many("User").is_many_to_many());
    }
}
