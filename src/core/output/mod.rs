//! Record output
//!
//! Audit records are appended to CSV files in one of two column layouts.

pub mod csv;

pub use csv::{append_records, CsvLayout, CsvSink};
