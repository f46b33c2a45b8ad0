//! Tabular datasets and their gzip-CSV wire form.
//!
//! A [`Table`] is an ordered set of named columns plus rows of string cells.
//! Everything is text on purpose: objects written by this crate are read back
//! exactly as stored, with no type inference, so numeric-looking fields like
//! `"007"` survive a round-trip unchanged.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;

/// Failure while building or (de)serialising a [`Table`].
#[derive(Debug, Error)]
pub enum TableError {
    #[error("row has {found} cells, expected {expected}")]
    RowLength { expected: usize, found: usize },
    #[error("index column {index} out of range for {columns} columns")]
    IndexOutOfRange { index: usize, columns: usize },
    #[error("header row {row} not present in data")]
    MissingHeader { row: usize },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("gzip error: {0}")]
    Gzip(#[from] std::io::Error),
}

/// An ordered collection of named columns and string-valued rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    index_column: usize,
}

impl Table {
    /// Create an empty table with the given column names. The index column
    /// defaults to the first column.
    pub fn new<S: Into<String>>(columns: Vec<S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            index_column: 0,
        }
    }

    /// Designate which column acts as the row index for [`Table::row_by_index`].
    pub fn with_index_column(mut self, index_column: usize) -> Result<Self, TableError> {
        if index_column >= self.columns.len() {
            return Err(TableError::IndexOutOfRange {
                index: index_column,
                columns: self.columns.len(),
            });
        }
        self.index_column = index_column;
        Ok(self)
    }

    /// Append a row. The cell count must match the column count.
    pub fn push_row<S: Into<String>>(&mut self, row: Vec<S>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowLength {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row.into_iter().map(Into::into).collect());
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn index_column(&self) -> usize {
        self.index_column
    }

    /// First row whose index-column cell equals `value`, in insertion order.
    pub fn row_by_index(&self, value: &str) -> Option<&[String]> {
        self.rows
            .iter()
            .find(|row| row.get(self.index_column).is_some_and(|cell| cell == value))
            .map(Vec::as_slice)
    }

    /// Serialise to gzip-compressed CSV: one header record, then the rows in
    /// insertion order, every cell rendered as text.
    pub fn to_gzip_csv(&self) -> Result<Vec<u8>, TableError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        let csv_bytes = writer
            .into_inner()
            .map_err(|e| TableError::Gzip(std::io::Error::other(e.to_string())))?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&csv_bytes)?;
        Ok(encoder.finish()?)
    }

    /// Parse gzip-compressed CSV back into a table.
    ///
    /// `header_row` selects which record carries the column names; records
    /// before it are discarded. `index_column` designates the index column on
    /// the returned table without removing it from the data, so decoding what
    /// [`Table::to_gzip_csv`] produced (with the defaults `0, 0`) yields an
    /// equal table.
    pub fn from_gzip_csv(
        bytes: &[u8],
        index_column: usize,
        header_row: usize,
    ) -> Result<Self, TableError> {
        let mut decoder = GzDecoder::new(bytes);
        let mut csv_bytes = Vec::new();
        decoder.read_to_end(&mut csv_bytes)?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(csv_bytes.as_slice());

        let mut records = reader.records();
        let header = records
            .nth(header_row)
            .transpose()?
            .ok_or(TableError::MissingHeader { row: header_row })?;

        let mut table =
            Table::new(header.iter().map(str::to_owned).collect()).with_index_column(index_column)?;
        for record in records {
            let record = record?;
            table.push_row(record.iter().map(str::to_owned).collect())?;
        }
        Ok(table)
    }
}
