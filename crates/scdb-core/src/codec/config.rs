//! Codec configuration.

use scdb_proto::ReadLimits;

/// Configuration for encoding and decoding the binary container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Bounds applied while decoding, guarding allocations on untrusted input.
    pub limits: ReadLimits,

    /// Reject encoding when a foreign key or relation target table would be
    /// written after a table referencing it.
    pub verify_table_order: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            limits: ReadLimits::default(),
            verify_table_order: true,
        }
    }
}

impl CodecConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set all read limits.
    pub fn with_limits(mut self, limits: ReadLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the maximum decoded string length in bytes.
    pub fn with_max_string_len(mut self, len: usize) -> Self {
        self.limits.max_string_len = len;
        self
    }

    /// Set the maximum decoded collection length.
    pub fn with_max_collection_len(mut self, len: usize) -> Self {
        self.limits.max_collection_len = len;
        self
    }

    /// Set the maximum array nesting depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.limits.max_depth = depth;
        self
    }

    /// Enable or disable the table order check on encode.
    pub fn with_order_check(mut self, enabled: bool) -> Self {
        self.verify_table_order = enabled;
        self
    }

    /// Disable the table order check on encode.
    pub fn without_order_check(self) -> Self {
        self.with_order_check(false)
    }
}
