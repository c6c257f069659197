//! Byte stream to database.
//!
//! Decoding runs in two phases over a single forward pass. The enum and table
//! sections are read completely and bound before any record is touched; the
//! data section is then streamed table by table, and each record goes through
//! the normal insert path so validation, unique checks and the relation graph
//! are rebuilt exactly as they were built originally.

use std::collections::HashSet;

use chrono::NaiveTime;
use scdb_proto::{Tagged, Value, WireReader};
use tracing::{debug, info, instrument, warn};

use super::config::CodecConfig;
use super::{ATTR_DEFAULT, ATTR_NULLABLE, ATTR_PRIMARY_KEY, ATTR_UNIQUE};
use crate::catalog::{Cardinality, EnumDef, FieldDef, FieldKind, ScalarKind, TableDef};
use crate::database::Database;
use crate::error::{DecodeError, Error, SchemaError};
use crate::storage::RecordKey;

/// Decode a byte stream into a new database.
#[instrument(skip_all, fields(len = bytes.len()))]
pub fn decode(bytes: &[u8], config: &CodecConfig) -> Result<Database, Error> {
    let mut reader = WireReader::with_limits(bytes, config.limits);
    let mut db = Database::new();

    // Phase 1: schema.
    let enum_count = reader.get_count("enum count")?;
    for _ in 0..enum_count {
        let name = reader.get_string("enum name")?;
        let mapping = reader.get_json_object("enum values")?;
        db.register_enum_def(EnumDef::from_json(name, mapping)?)?;
    }

    let table_count = reader.get_count("table count")?;
    for _ in 0..table_count {
        let name = reader.get_string("table name")?;
        let field_count = reader.get_count("field count")?;
        let fields = (0..field_count)
            .map(|_| read_field(&mut reader))
            .collect::<Result<Vec<_>, _>>()?;
        db.register_table(name, fields)?;
    }
    db.catalog().bind()?;

    // Phase 2: data.
    let mut decoded: HashSet<String> = HashSet::new();
    let mut records = 0;
    let data_count = reader.get_count("data table count")?;
    for _ in 0..data_count {
        let name = reader.get_string("data table name")?;
        let table = db
            .table(&name)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownTable(name.clone()))?;

        let record_count = reader.get_count("record count")?;
        for _ in 0..record_count {
            let values = read_record(&mut reader, &db, &table, &decoded)?;
            db.insert(&name, values)?;
        }
        debug!(table = %name, records = record_count, "Decoded table data");

        records += record_count;
        decoded.insert(name);
    }

    if !reader.is_empty() {
        return Err(DecodeError::TrailingBytes(reader.remaining()).into());
    }

    info!(
        enums = db.catalog().enums().len(),
        tables = db.catalog().tables().len(),
        records,
        "Decoded database"
    );
    Ok(db)
}

fn read_field(reader: &mut WireReader<'_>) -> Result<FieldDef, Error> {
    let name = reader.get_string("field name")?;
    let tag = reader.get_string("field kind")?;
    let kind = read_field_kind(reader, tag)?;

    let attrs = reader.get_u8("field attributes")?;
    let mut field = FieldDef::new(name, kind);
    field.primary_key = attrs & ATTR_PRIMARY_KEY != 0;
    field.nullable = attrs & ATTR_NULLABLE != 0;
    field.unique = attrs & ATTR_UNIQUE != 0;
    if attrs & ATTR_DEFAULT != 0 {
        field.default = Some(reader.get_value("field default")?);
    }
    Ok(field)
}

/// Map a kind tag to its constructor, reading the kind's metadata.
fn read_field_kind(reader: &mut WireReader<'_>, tag: String) -> Result<FieldKind, Error> {
    let kind = match tag.as_str() {
        "String" => FieldKind::String {
            max_length: read_max_length(reader, "string max length")?,
        },
        "Integer" => FieldKind::Integer {
            min: read_optional(reader, |r| r.get_i64("integer bound"))?,
            max: read_optional(reader, |r| r.get_i64("integer bound"))?,
        },
        "Float" => FieldKind::Float {
            min: read_optional(reader, |r| r.get_f64("float bound"))?,
            max: read_optional(reader, |r| r.get_f64("float bound"))?,
        },
        "Boolean" => FieldKind::Boolean,
        "Date" => FieldKind::Date,
        "Time" => FieldKind::Time,
        "DateTime" => FieldKind::DateTime,
        "Array" => {
            let item = reader.get_string("array item kind")?;
            let item_kind =
                ScalarKind::from_tag(&item).ok_or(DecodeError::UnknownScalarKind(item))?;
            FieldKind::Array {
                item_kind,
                max_length: read_max_length(reader, "array max length")?,
            }
        }
        "Relation" => {
            let target_table = reader.get_string("relation target")?;
            let card = reader.get_string("relation cardinality")?;
            let cardinality =
                Cardinality::from_tag(&card).ok_or(DecodeError::UnknownCardinality(card))?;
            FieldKind::Relation {
                target_table,
                cardinality,
            }
        }
        "ForeignKey" => FieldKind::ForeignKey {
            target_table: reader.get_string("foreign key target")?,
        },
        "ManyToMany" => FieldKind::ManyToMany {
            target_table: reader.get_string("many-to-many target")?,
        },
        "Enum" => FieldKind::Enum {
            enum_name: reader.get_string("enum name")?,
        },
        _ => return Err(DecodeError::UnknownFieldKind(tag).into()),
    };
    Ok(kind)
}

fn read_max_length(
    reader: &mut WireReader<'_>,
    context: &'static str,
) -> Result<Option<usize>, Error> {
    let max = reader.get_u32(context)?;
    Ok((max != 0).then_some(max as usize))
}

fn read_optional<T>(
    reader: &mut WireReader<'_>,
    read: impl FnOnce(&mut WireReader<'_>) -> scdb_proto::error::Result<T>,
) -> Result<Option<T>, Error> {
    if reader.get_u8("bound present")? == 0 {
        return Ok(None);
    }
    Ok(Some(read(reader)?))
}

fn read_record(
    reader: &mut WireReader<'_>,
    db: &Database,
    table: &TableDef,
    decoded: &HashSet<String>,
) -> Result<Vec<(String, Value)>, Error> {
    let field_count = reader.get_count("record field count")?;
    let mut values: Vec<(String, Value)> =
        Vec::with_capacity(field_count.min(table.fields().len()));

    for _ in 0..field_count {
        let name = reader.get_string("record field name")?;
        let field = table
            .field(&name)
            .ok_or_else(|| SchemaError::UnknownField {
                table: table.name.clone(),
                field: name.clone(),
            })?;
        if values.iter().any(|(n, _)| *n == name) {
            return Err(DecodeError::DuplicateRecordField {
                table: table.name.clone(),
                field: name,
            }
            .into());
        }

        let value = match reader.get_tagged()? {
            Tagged::Value(value) => value,
            Tagged::EnumRef(member) => match &field.kind {
                FieldKind::Enum { enum_name } if *enum_name == member.enum_name => member.value,
                FieldKind::Enum { enum_name } => {
                    return Err(DecodeError::InvalidEnumReference {
                        table: table.name.clone(),
                        field: name,
                        expected: enum_name.clone(),
                        found: member.enum_name,
                    }
                    .into())
                }
                other => {
                    return Err(DecodeError::InvalidEnumReference {
                        table: table.name.clone(),
                        field: name,
                        expected: other.tag().to_string(),
                        found: member.enum_name,
                    }
                    .into())
                }
            },
            Tagged::ObjectRef { .. } => {
                return Err(DecodeError::LegacyObjectReference {
                    table: table.name.clone(),
                    field: name,
                }
                .into())
            }
        };

        let value = promote_dates(&table.name, field, value);
        check_reference(db, table, field, &value, decoded)?;
        values.push((name, value));
    }

    // Names are known and distinct, so a short record is missing something.
    if let Some(missing) = table
        .fields()
        .iter()
        .find(|f| !values.iter().any(|(n, _)| *n == f.name))
    {
        return Err(DecodeError::MissingRecordField {
            table: table.name.clone(),
            field: missing.name.clone(),
        }
        .into());
    }
    Ok(values)
}

/// Promote bare dates stored where datetimes are expected to midnight.
fn promote_dates(table: &str, field: &FieldDef, value: Value) -> Value {
    let promote = |v: Value| match v {
        Value::Date(date) => {
            warn!(table, field = %field.name, %date, "Promoting date to datetime");
            Value::DateTime(date.and_time(NaiveTime::MIN))
        }
        other => other,
    };

    match (&field.kind, value) {
        (FieldKind::DateTime, value) => promote(value),
        (
            FieldKind::Array {
                item_kind: ScalarKind::DateTime,
                ..
            },
            Value::Array(items),
        ) => Value::Array(items.into_iter().map(promote).collect()),
        (_, value) => value,
    }
}

/// Resolve a foreign key or relation value against decoded records.
fn check_reference(
    db: &Database,
    table: &TableDef,
    field: &FieldDef,
    value: &Value,
    decoded: &HashSet<String>,
) -> Result<(), Error> {
    if !field.kind.is_single_reference() || value.is_null() {
        return Ok(());
    }
    let Some(target) = field.kind.target_table() else {
        return Ok(());
    };

    // Self references resolve against this table's earlier records.
    if target != table.name && !decoded.contains(target) {
        return Err(DecodeError::UnresolvedRelationTarget {
            table: table.name.clone(),
            field: field.name.clone(),
            target: target.to_string(),
        }
        .into());
    }

    let key = RecordKey::from_value(value).ok_or_else(|| DecodeError::InvalidKey {
        table: table.name.clone(),
        field: field.name.clone(),
        value: value.clone(),
    })?;
    if db.find(target, key)?.is_none() {
        return Err(DecodeError::MissingForeignKeyTarget {
            table: table.name.clone(),
            field: field.name.clone(),
            target: target.to_string(),
            key: value.clone(),
        }
        .into());
    }
    Ok(())
}
