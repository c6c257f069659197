//! Database to byte stream.

use scdb_proto::{Value, WireWriter};
use tracing::{info, instrument};

use super::config::CodecConfig;
use super::{ATTR_DEFAULT, ATTR_NULLABLE, ATTR_PRIMARY_KEY, ATTR_UNIQUE};
use crate::catalog::{EnumDef, FieldDef, FieldKind, TableDef};
use crate::database::Database;
use crate::error::{Error, SchemaError, ValidationError};

/// Encode a database as enum, table and data sections.
///
/// Tables are written in registration order in both the table and data
/// sections.
#[instrument(skip_all)]
pub fn encode(db: &Database, config: &CodecConfig) -> Result<Vec<u8>, Error> {
    let catalog = db.catalog();
    if config.verify_table_order {
        catalog.check_order()?;
    }

    let mut writer = WireWriter::with_capacity(4096);

    writer.put_len("enum count", catalog.enums().len())?;
    for def in catalog.enums() {
        write_enum(&mut writer, def)?;
    }

    writer.put_len("table count", catalog.tables().len())?;
    for table in catalog.tables() {
        write_table(&mut writer, table)?;
    }

    let mut records = 0;
    writer.put_len("data table count", catalog.tables().len())?;
    for table in catalog.tables() {
        records += write_table_data(&mut writer, db, table)?;
    }

    let bytes = writer.into_inner();
    info!(
        enums = catalog.enums().len(),
        tables = catalog.tables().len(),
        records,
        bytes = bytes.len(),
        "Encoded database"
    );
    Ok(bytes)
}

fn write_enum(writer: &mut WireWriter, def: &EnumDef) -> Result<(), Error> {
    writer.put_string(&def.name)?;
    writer.put_json_object(&def.to_json())?;
    Ok(())
}

fn write_table(writer: &mut WireWriter, table: &TableDef) -> Result<(), Error> {
    writer.put_string(&table.name)?;
    writer.put_len("field count", table.fields().len())?;
    for field in table.fields() {
        write_field(writer, field)?;
    }
    Ok(())
}

fn write_field(writer: &mut WireWriter, field: &FieldDef) -> Result<(), Error> {
    writer.put_string(&field.name)?;
    writer.put_string(field.kind.tag())?;

    match &field.kind {
        FieldKind::String { max_length } => {
            writer.put_len("string max length", max_length.unwrap_or(0))?;
        }
        FieldKind::Integer { min, max } => {
            for bound in [min, max] {
                writer.put_u8(u8::from(bound.is_some()));
                if let Some(b) = bound {
                    writer.put_i64(*b);
                }
            }
        }
        FieldKind::Float { min, max } => {
            for bound in [min, max] {
                writer.put_u8(u8::from(bound.is_some()));
                if let Some(b) = bound {
                    writer.put_f64(*b);
                }
            }
        }
        FieldKind::Boolean | FieldKind::Date | FieldKind::Time | FieldKind::DateTime => {}
        FieldKind::Array {
            item_kind,
            max_length,
        } => {
            writer.put_string(item_kind.tag())?;
            writer.put_len("array max length", max_length.unwrap_or(0))?;
        }
        FieldKind::Relation {
            target_table,
            cardinality,
        } => {
            writer.put_string(target_table)?;
            writer.put_string(cardinality.tag())?;
        }
        FieldKind::ForeignKey { target_table } | FieldKind::ManyToMany { target_table } => {
            writer.put_string(target_table)?;
        }
        FieldKind::Enum { enum_name } => {
            writer.put_string(enum_name)?;
        }
    }

    let mut attrs = 0u8;
    if field.primary_key {
        attrs |= ATTR_PRIMARY_KEY;
    }
    if field.nullable {
        attrs |= ATTR_NULLABLE;
    }
    if field.unique {
        attrs |= ATTR_UNIQUE;
    }
    if field.default.is_some() {
        attrs |= ATTR_DEFAULT;
    }
    writer.put_u8(attrs);

    if let Some(default) = &field.default {
        writer.put_value(default)?;
    }
    Ok(())
}

fn write_table_data(
    writer: &mut WireWriter,
    db: &Database,
    table: &TableDef,
) -> Result<usize, Error> {
    let records = db.all(&table.name)?;

    writer.put_string(&table.name)?;
    writer.put_len("record count", records.len())?;
    for record in records {
        writer.put_len("record field count", record.fields().len())?;
        for (field, (name, value)) in table.fields().iter().zip(record.fields()) {
            writer.put_string(name)?;
            match &field.kind {
                FieldKind::Enum { enum_name } if !value.is_null() => {
                    write_enum_value(writer, db, table, field, enum_name, value)?;
                }
                _ => writer.put_value(value)?,
            }
        }
    }
    Ok(records.len())
}

fn write_enum_value(
    writer: &mut WireWriter,
    db: &Database,
    table: &TableDef,
    field: &FieldDef,
    enum_name: &str,
    value: &Value,
) -> Result<(), Error> {
    let def = db
        .enum_def(enum_name)
        .ok_or_else(|| SchemaError::UnknownEnum(enum_name.to_string()))?;
    let label = def.label_of(value).ok_or_else(|| Error::Validation {
        table: table.name.clone(),
        field: field.name.clone(),
        source: ValidationError::EnumMembership {
            enum_name: enum_name.to_string(),
            value: value.to_string(),
        },
    })?;
    writer.put_enum_ref(enum_name, label, value)?;
    Ok(())
}
