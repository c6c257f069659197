//! SCDB value model and wire primitives.
//!
//! This crate defines the runtime [`Value`] type held by records and the
//! big-endian tag-length-value primitives ([`WireWriter`], [`WireReader`])
//! that the core codec builds its stream sections from.
//!
//! # Modules
//!
//! - [`value`] - Runtime value types
//! - [`wire`] - Value tags, reader/writer and read limits
//! - [`error`] - Wire error types

pub mod error;
pub mod value;
pub mod wire;

pub use error::Error;
pub use value::Value;
pub use wire::{json_scalar, EnumRef, ReadLimits, Tagged, ValueTag, WireReader, WireWriter};
