//! CSV persistence for recorded sessions.

use std::path::Path;

use tracing::debug;

use crate::error::{MonitorError, Result};
use crate::sample::SampleSeries;

/// A rectangular string table: one header row plus data rows of the same
/// width. This is the on-disk shape of a recording, kept stringly so that
/// files written by other tools survive a read/write cycle untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RecordTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.headers.len());
        self.rows.push(row);
    }

    /// All values of the named column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<String>> {
        let idx = self.headers.iter().position(|h| h == name)?;
        Some(self.rows.iter().map(|r| r[idx].clone()).collect())
    }

    /// The named column parsed as floats. Fails on the first value that is
    /// not a number, naming the offending cell.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        let values = self
            .column(name)
            .ok_or_else(|| MonitorError::MissingColumn(name.to_string()))?;
        values
            .iter()
            .map(|v| {
                v.trim().parse::<f64>().map_err(|_| MonitorError::NonNumeric {
                    column: name.to_string(),
                    value: v.clone(),
                })
            })
            .collect()
    }
}

/// Refuses to clobber an existing file unless `force` is set. Callers decide
/// whether a refusal is fatal; the file itself is never touched here.
pub fn check_overwrite(path: impl AsRef<Path>, force: bool) -> Result<()> {
    let path = path.as_ref();
    if !force && path.exists() {
        return Err(MonitorError::OutputExists(path.to_path_buf()));
    }
    Ok(())
}

/// Write a table as CSV: header row first, then data rows in order.
///
/// An empty table is rejected before the file is created, so a failed export
/// never leaves a header-only stub behind.
pub fn write_table(table: &RecordTable, path: impl AsRef<Path>) -> Result<()> {
    if table.is_empty() {
        return Err(MonitorError::EmptySeries);
    }

    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(table.headers())?;
    for row in table.rows() {
        writer.write_record(row)?;
    }
    writer.flush()?;

    debug!(
        "wrote {} rows x {} columns to {}",
        table.len(),
        table.headers().len(),
        path.display()
    );
    Ok(())
}

/// Read a CSV file back into a table. The first record is taken as the
/// header row; every data row must have the same width (the reader rejects
/// ragged input).
pub fn read_table(path: impl AsRef<Path>) -> Result<RecordTable> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.iter().map(str::to_string).collect();

    let mut table = RecordTable::new(headers);
    for record in reader.records() {
        let record = record?;
        table.rows.push(record.iter().map(str::to_string).collect());
    }

    debug!("read {} rows from {}", table.len(), path.display());
    Ok(table)
}

/// Convenience wrapper: flatten a recorded session and write it out.
pub fn write_series(series: &SampleSeries, path: impl AsRef<Path>) -> Result<()> {
    write_table(&series.to_table(), path)
}
