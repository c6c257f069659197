//! Record storage for SCDB.
//!
//! Records live in memory as one ordered sequence per table.

mod record;
mod table_data;

pub use record::{Record, RecordKey};
pub use table_data::TableData;
