//! Schema catalog for SCDB.
//!
//! The catalog holds field kinds, enum definitions and table definitions.

mod catalog;
mod enums;
mod field;
mod table;
mod types;

pub use catalog::Catalog;
pub use enums::EnumDef;
pub use field::FieldDef;
pub use table::TableDef;
pub use types::{Cardinality, FieldKind, ScalarKind};
