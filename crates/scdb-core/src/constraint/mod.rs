//! Constraint enforcement for SCDB.
//!
//! - [`FieldValidator`] checks values against field kinds
//! - [`UniqueIndex`] enforces `unique` fields across a table

mod unique_index;
mod validator;

pub use unique_index::UniqueIndex;
pub use validator::{check_field, check_kind, FieldValidator};
