//! Wire-level error types.

use thiserror::Error;

/// Errors raised while reading or writing the tag-length-value stream.
#[derive(Debug, Error)]
pub enum Error {
    /// A value tag byte outside the closed tag set.
    #[error("unrecognized value tag: 0x{0:02x}")]
    UnrecognizedTag(u8),

    /// A recognized tag in a position where it is not allowed.
    #[error("unexpected value tag 0x{tag:02x} in {context}")]
    UnexpectedTag { tag: u8, context: &'static str },

    /// The stream ended before a complete item could be read.
    #[error("truncated stream reading {context}: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        context: &'static str,
        needed: usize,
        remaining: usize,
    },

    /// A length-prefixed string was not valid UTF-8.
    #[error("invalid UTF-8 in {context}")]
    InvalidUtf8 { context: &'static str },

    /// Date/time components that do not form a valid calendar value.
    #[error("invalid {kind} components: {components:?}")]
    InvalidTemporal {
        kind: &'static str,
        components: Vec<i64>,
    },

    /// A value too large to be framed with a 32-bit length prefix.
    #[error("{context} too large to encode: {len}")]
    Oversized { context: &'static str, len: usize },

    /// A length prefix larger than the configured reader limit.
    #[error("{context} length {actual} exceeds limit {limit}")]
    LimitExceeded {
        context: &'static str,
        limit: usize,
        actual: usize,
    },

    /// Array nesting deeper than the configured reader limit.
    #[error("array nesting exceeds depth limit {0}")]
    DepthExceeded(usize),

    /// An enum reference whose mapping is not a single label/scalar pair.
    #[error("invalid enum reference to {enum_name}: {reason}")]
    InvalidEnumRef {
        enum_name: String,
        reason: &'static str,
    },

    /// Malformed JSON payload inside an enum blob or enum reference.
    #[error("invalid json in {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Result alias for wire operations.
pub type Result<T> = std::result::Result<T, Error>;
