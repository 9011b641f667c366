//! Tab-separated table access shared by every loader.

use std::fs::File;
use std::path::Path;

use crate::error::{PathwiseError, Result};

/// Open `path` as a tab-separated table.
///
/// Quoting is disabled (dataset dumps contain bare `"` in names) and rows may
/// have any number of fields; each loader checks its own field counts.
pub fn open(path: &Path, has_headers: bool) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|e| PathwiseError::io(path, e))?;
    Ok(reader_builder(has_headers).from_reader(file))
}

pub fn reader_builder(has_headers: bool) -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(b'\t')
        .has_headers(has_headers)
        .flexible(true)
        .quoting(false)
        .comment(None);
    builder
}

/// Line number of a record, 1-based; 0 when the reader did not track it.
pub fn line_of(record: &csv::StringRecord) -> usize {
    record.position().map(|p| p.line() as usize).unwrap_or(0)
}

/// Line number carried by a row-level parse error.
pub fn error_line(err: &csv::Error) -> usize {
    err.position().map(|p| p.line() as usize).unwrap_or(0)
}

/// Column index of `name` in `headers`, or a `MissingColumn` error naming `path`.
pub fn column(headers: &csv::StringRecord, name: &str, path: &Path) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| PathwiseError::MissingColumn {
            file: path.to_path_buf(),
            column: name.to_string(),
        })
}
