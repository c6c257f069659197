//! SCDB Core - Schema catalog, record store and binary codec.
//!
//! This crate provides the embedded database: tables and enums are
//! registered into a [`Database`], records are validated on insert, and the
//! whole store round-trips through a single big-endian byte stream.

pub mod catalog;
pub mod codec;
pub mod constraint;
pub mod database;
pub mod error;
mod persist;
pub mod query;
pub mod relation;
pub mod storage;
pub mod transform;

pub use catalog::{Cardinality, Catalog, EnumDef, FieldDef, FieldKind, ScalarKind, TableDef};
pub use codec::{decode, encode, CodecConfig};
pub use constraint::{FieldValidator, UniqueIndex};
pub use database::Database;
pub use error::{DecodeError, Error, SchemaError, TransformError, ValidationError};
pub use query::{ScanFilter, ScanResult};
pub use relation::{join_key, RelationGraph};
pub use storage::{Record, RecordKey, TableData};
pub use transform::{PayloadTransform, Plaintext};

pub use scdb_proto::{ReadLimits, Value};
