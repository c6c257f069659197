//! SCDB Benchmark Suite
//!
//! Criterion benchmarks for SCDB components.
//!
//! # Benchmark Categories
//!
//! - **Store**: Validated inserts, equality scans, many-to-many lookups
//! - **Codec**: Encoding and decoding whole databases of users and posts

pub mod fixtures;

pub use fixtures::{generate_posts, generate_users, populated_db, PostData, Scale, UserData};
