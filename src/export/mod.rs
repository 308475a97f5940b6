//! Report export.
//!
//! Turns the finished results of a batch into a spreadsheet-friendly artifact.

mod csv;

pub use self::csv::{CsvReportExporter, CSV_CONTENT_TYPE};
