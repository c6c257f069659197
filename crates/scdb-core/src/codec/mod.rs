//! Binary container codec.
//!
//! The stream has three sections, all big-endian and length-prefixed:
//!
//! 1. Enums: count, then name and a JSON `{label: value}` blob per enum.
//! 2. Tables: count, then per table its name and fields. Each field carries
//!    its name, kind tag, kind metadata, an attribute byte and an optional
//!    default value.
//! 3. Data: table count, then per table its name and records, each record
//!    a counted list of field name and tagged value pairs.
//!
//! Tables holding foreign key or relation targets must precede the tables
//! that reference them, since the decoder resolves keys against records it
//! has already read.

mod config;
mod decoder;
mod encoder;

pub use config::CodecConfig;
pub use decoder::decode;
pub use encoder::encode;

use crate::database::Database;
use crate::error::Error;

pub(crate) const ATTR_PRIMARY_KEY: u8 = 0x01;
pub(crate) const ATTR_NULLABLE: u8 = 0x02;
pub(crate) const ATTR_UNIQUE: u8 = 0x04;
pub(crate) const ATTR_DEFAULT: u8 = 0x08;

impl Database {
    /// Encode with the default configuration.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        encode(self, &CodecConfig::default())
    }

    /// Decode with the default configuration.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        decode(bytes, &CodecConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldDef, FieldKind};
    use crate::error::{DecodeError, SchemaError};
    use scdb_proto::{Value, WireWriter};

    fn users() -> Database {
        let mut db = Database::new();
        db.register_table(
            "User",
            [
                FieldDef::new("id", FieldKind::integer()).primary_key(),
                FieldDef::new("name", FieldKind::string()),
            ],
        )
        .unwrap();
        db.insert("User", [("id", Value::from(1)), ("name", Value::from("A"))])
            .unwrap();
        db
    }

    #[test]
    fn test_empty_database_layout() {
        let bytes = Database::new().to_bytes().unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let db = Database::from_bytes(&bytes).unwrap();
        assert!(db.catalog().tables().is_empty());
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = users().to_bytes().unwrap();
        bytes.push(0xFF);
        assert!(matches!(
            Database::from_bytes(&bytes),
            Err(Error::Decode(DecodeError::TrailingBytes(1)))
        ));
    }

    #[test]
    fn test_truncated_stream_rejected() {
        let bytes = users().to_bytes().unwrap();
        for cut in [1, 5, bytes.len() / 2, bytes.len() - 1] {
            let err = Database::from_bytes(&bytes[..cut]).unwrap_err();
            assert!(
                matches!(err, Error::Decode(DecodeError::Wire(_))),
                "cut at {cut}: {err:?}"
            );
        }
    }

    #[test]
    fn test_unknown_field_kind_rejected() {
        let mut w = WireWriter::new();
        w.put_u32(0);
        w.put_u32(1);
        w.put_string("T").unwrap();
        w.put_u32(1);
        w.put_string("f").unwrap();
        w.put_string("Decimal").unwrap();

        assert!(matches!(
            Database::from_bytes(&w.into_inner()),
            Err(Error::Decode(DecodeError::UnknownFieldKind(ref k))) if k == "Decimal"
        ));
    }

    #[test]
    fn test_legacy_object_reference_rejected() {
        let mut w = WireWriter::new();
        w.put_u32(0);
        w.put_u32(1);
        w.put_string("T").unwrap();
        w.put_u32(1);
        w.put_string("f").unwrap();
        w.put_string("Integer").unwrap();
        w.put_u8(0);
        w.put_u8(0);
        w.put_u8(0);
        // data section
        w.put_u32(1);
        w.put_string("T").unwrap();
        w.put_u32(1);
        w.put_u32(1);
        w.put_string("f").unwrap();
        w.put_u8(0x06);
        w.put_string("Other").unwrap();
        w.put_i64(3);

        assert!(matches!(
            Database::from_bytes(&w.into_inner()),
            Err(Error::Decode(DecodeError::LegacyObjectReference { .. }))
        ));
    }

    #[test]
    fn test_unknown_data_table_rejected() {
        let mut w = WireWriter::new();
        w.put_u32(0);
        w.put_u32(0);
        w.put_u32(1);
        w.put_string("Ghost").unwrap();
        w.put_u32(0);

        assert!(matches!(
            Database::from_bytes(&w.into_inner()),
            Err(Error::Schema(SchemaError::UnknownTable(_)))
        ));
    }

    #[test]
    fn test_string_limit_applies() {
        let bytes = users().to_bytes().unwrap();
        let config = CodecConfig::new().with_max_string_len(0);
        assert!(matches!(
            decode(&bytes, &config),
            Err(Error::Decode(DecodeError::Wire(
                scdb_proto::Error::LimitExceeded { .. }
            )))
        ));
    }

    /// Schema `T{id Integer pk, flag Boolean default true}` followed by a
    /// data section header for one `T` record with `field_count` fields.
    fn flagged_table(field_count: u32) -> WireWriter {
        let mut w = WireWriter::new();
        w.put_u32(0);
        w.put_u32(1);
        w.put_string("T").unwrap();
        w.put_u32(2);
        w.put_string("id").unwrap();
        w.put_string("Integer").unwrap();
        w.put_u8(0);
        w.put_u8(0);
        w.put_u8(ATTR_PRIMARY_KEY);
        w.put_string("flag").unwrap();
        w.put_string("Boolean").unwrap();
        w.put_u8(ATTR_DEFAULT);
        w.put_value(&Value::Boolean(true)).unwrap();
        // data section
        w.put_u32(1);
        w.put_string("T").unwrap();
        w.put_u32(1);
        w.put_u32(field_count);
        w
    }

    #[test]
    fn test_record_missing_field_rejected() {
        let mut w = flagged_table(1);
        w.put_string("id").unwrap();
        w.put_value(&Value::Integer(7)).unwrap();

        match Database::from_bytes(&w.into_inner()) {
            Err(Error::Decode(DecodeError::MissingRecordField { table, field })) => {
                assert_eq!(table, "T");
                assert_eq!(field, "flag");
            }
            other => panic!("expected a missing field error, got {other:?}"),
        }
    }

    #[test]
    fn test_complete_record_accepted() {
        let mut w = flagged_table(2);
        w.put_string("flag").unwrap();
        w.put_value(&Value::Boolean(false)).unwrap();
        w.put_string("id").unwrap();
        w.put_value(&Value::Integer(7)).unwrap();

        let db = Database::from_bytes(&w.into_inner()).unwrap();
        let record = db.find("T", 7).unwrap().unwrap();
        assert_eq!(record.get("flag"), Some(&Value::Boolean(false)));
    }

    #[test]
    fn test_oversized_field_count_fails_cleanly() {
        let mut w = flagged_table(16_000_000);
        w.put_string("id").unwrap();
        w.put_value(&Value::Integer(7)).unwrap();

        assert!(matches!(
            Database::from_bytes(&w.into_inner()),
            Err(Error::Decode(DecodeError::Wire(_)))
        ));
    }
}
