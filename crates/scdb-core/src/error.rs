//! Core error types.

use thiserror::Error;

use scdb_proto::Value;

/// Core database errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A value rejected while being assigned to a field.
    #[error("invalid value for {table}.{field}: {source}")]
    Validation {
        table: String,
        field: String,
        #[source]
        source: ValidationError,
    },

    /// A value already present in a `unique` field.
    #[error("duplicate value {value} for unique field {table}.{field}")]
    UniqueViolation {
        table: String,
        field: String,
        value: Value,
    },

    /// No record with the given key.
    #[error("no record with key {key} in table {table}")]
    RecordNotFound { table: String, key: String },

    /// Schema registration or lookup error.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Binary stream decoding error.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Payload transform (encryption) failure.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// I/O error at the persistence boundary.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<scdb_proto::Error> for Error {
    fn from(err: scdb_proto::Error) -> Self {
        Error::Decode(DecodeError::Wire(err))
    }
}

/// A value that does not satisfy its field kind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Null given to a non-nullable field.
    #[error("field cannot be null")]
    Null,

    /// Value of the wrong kind.
    #[error("expected {expected}, got {got}")]
    TypeMismatch {
        expected: &'static str,
        got: &'static str,
    },

    /// Text that does not parse as the expected ISO-8601 form.
    #[error("cannot parse {input:?} as {expected}")]
    Format {
        expected: &'static str,
        input: String,
    },

    /// Number outside the declared bounds.
    #[error("value {actual} outside range [{}, {}]", fmt_bound(.min), fmt_bound(.max))]
    Range {
        min: Option<String>,
        max: Option<String>,
        actual: String,
    },

    /// String or array longer than the declared maximum.
    #[error("length {actual} exceeds maximum {max}")]
    Length { max: usize, actual: usize },

    /// An array element that fails its item kind.
    #[error("array element {index}: {cause}")]
    ArrayElement {
        index: usize,
        cause: Box<ValidationError>,
    },

    /// A value outside an enum's member set.
    #[error("{value} is not a member of enum {enum_name}")]
    EnumMembership { enum_name: String, value: String },
}

fn fmt_bound(bound: &Option<String>) -> &str {
    bound.as_deref().unwrap_or("-")
}

/// Schema registration and lookup errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("unknown enum: {0}")]
    UnknownEnum(String),

    #[error("unknown field {field} on table {table}")]
    UnknownField { table: String, field: String },

    #[error("table {0} is already registered")]
    DuplicateTableRegistration(String),

    #[error("enum {0} is already registered")]
    DuplicateEnumRegistration(String),

    #[error("field {field} declared twice on table {table}")]
    DuplicateField { table: String, field: String },

    #[error("label {label} declared twice on enum {enum_name}")]
    DuplicateEnumLabel { enum_name: String, label: String },

    /// Enum member values must be integers or strings.
    #[error("enum {enum_name} member {label} has unsupported value kind {kind}")]
    InvalidEnumMember {
        enum_name: String,
        label: String,
        kind: &'static str,
    },

    #[error("table {0} declares more than one primary key")]
    MultiplePrimaryKeys(String),

    /// Primary keys must be non-nullable integer or string fields.
    #[error("primary key {table}.{field} must be a non-nullable integer or string field")]
    InvalidPrimaryKey { table: String, field: String },

    /// Two many-to-many fields on one table share a join key.
    #[error("table {table} declares more than one many-to-many field to {target}")]
    AmbiguousJoin { table: String, target: String },

    /// A relation target that was never registered.
    #[error("{table}.{field} targets unregistered table {target}")]
    UnresolvedTarget {
        table: String,
        field: String,
        target: String,
    },

    #[error("no many-to-many relation from {owner} to {target}")]
    UnknownRelation { owner: String, target: String },

    /// A referencing table ordered before the table it references.
    #[error("{table}.{field} references {target}, which is stored after {table}")]
    ForwardReference {
        table: String,
        field: String,
        target: String,
    },

    #[error("primary key {table}.{field} cannot be updated")]
    ImmutablePrimaryKey { table: String, field: String },

    #[error("relation cycle through table {0}")]
    RelationCycle(String),
}

/// Binary stream decoding errors. All are fatal to the decode call.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Framing or value-level error.
    #[error("wire error: {0}")]
    Wire(#[from] scdb_proto::Error),

    /// Records reference a table whose data has not been decoded yet.
    #[error("{table}.{field} references {target} before its data section")]
    UnresolvedRelationTarget {
        table: String,
        field: String,
        target: String,
    },

    /// A foreign key whose target record does not exist.
    #[error("{table}.{field} references missing {target} record {key}")]
    MissingForeignKeyTarget {
        table: String,
        field: String,
        target: String,
        key: Value,
    },

    #[error("unknown field kind tag: {0}")]
    UnknownFieldKind(String),

    #[error("unknown relation cardinality tag: {0}")]
    UnknownCardinality(String),

    #[error("unknown array item kind: {0}")]
    UnknownScalarKind(String),

    #[error("invalid value mapping for enum {enum_name}: {reason}")]
    InvalidEnumBlob {
        enum_name: String,
        reason: &'static str,
    },

    /// An enum reference that names a different enum than the field.
    #[error("{table}.{field} expects enum {expected}, stream references {found}")]
    InvalidEnumReference {
        table: String,
        field: String,
        expected: String,
        found: String,
    },

    /// Tag 0x06 is reserved and not interpreted.
    #[error("legacy object reference in {table}.{field} is not supported")]
    LegacyObjectReference { table: String, field: String },

    #[error("field {field} appears twice in a {table} record")]
    DuplicateRecordField { table: String, field: String },

    /// A stored record that leaves out a declared field.
    #[error("{table} record is missing field {field}")]
    MissingRecordField { table: String, field: String },

    /// A relation value that is not a valid record key.
    #[error("{table}.{field} holds {value}, which is not a record key")]
    InvalidKey {
        table: String,
        field: String,
        value: Value,
    },

    #[error("{0} trailing bytes after data section")]
    TrailingBytes(usize),
}

/// Failure reported by a payload transform.
#[derive(Debug, Error)]
#[error("payload transform failed: {message}")]
pub struct TransformError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransformError {
    /// Create a transform error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create a transform error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
