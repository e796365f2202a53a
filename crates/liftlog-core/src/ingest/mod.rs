//! Row ingestion for delimited workout exports.
//!
//! The ingestor turns a CSV-like export into a single pass of [`RawRecord`]s.
//! It tolerates the usual export noise: header capitalization and spacing,
//! padded cells, blank lines, ragged rows and `;`/tab delimited files that
//! use a decimal comma. Column names are resolved through the configured
//! mapping once, before the first row is handed out.

mod columns;
mod reader;

pub use columns::{header_key, ResolvedColumns};
pub use reader::RowIngestor;

use indexmap::IndexMap;

/// One data row as read from the export: header cell -> cell text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    line: u64,
    fields: IndexMap<String, String>,
}

impl RawRecord {
    pub fn new(line: u64, fields: IndexMap<String, String>) -> Self {
        Self { line, fields }
    }

    /// 1-based line in the source file.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Cell under `column`, if the row has that column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn fields(&self) -> &IndexMap<String, String> {
        &self.fields
    }
}
