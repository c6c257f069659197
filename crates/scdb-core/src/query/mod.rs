//! Query support for SCDB.
//!
//! Only linear equality scans are supported.

mod scan;

pub use scan::{ScanFilter, ScanResult};
