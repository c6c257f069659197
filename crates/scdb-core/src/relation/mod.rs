//! Relation graph for many-to-many fields.

mod graph;

pub use graph::{join_key, JoinMap, RelationGraph};
