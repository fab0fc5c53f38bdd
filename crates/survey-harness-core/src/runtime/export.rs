// crates/survey-harness-core/src/runtime/export.rs
// ============================================================================
// Module: Participant Export Table
// Description: Tabular snapshot of participant records and its CSV codec.
// Purpose: Turn stored participants into rows x columns and write them out.
// Dependencies: crate::core, csv, thiserror
// ============================================================================

//! ## Overview
//! An [`ExportTable`] is derived from participant records on demand and has
//! no lifecycle of its own. Columns are the participant metadata columns
//! followed by the sorted union of every response field seen; a record that
//! lacks a field contributes [`FieldValue::Null`], written as an empty cell.
//!
//! CSV output has a single header row of column names and one row per
//! participant. No row-index column is emitted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fs;
use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::core::FieldName;
use crate::core::FieldValue;
use crate::core::ParticipantRecord;
use crate::core::schema::RESERVED_FIELD_NAMES;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Metadata columns emitted before response fields, in order.
pub const METADATA_COLUMNS: [&str; 5] = RESERVED_FIELD_NAMES;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Export errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    /// Filesystem error while reading or writing an export.
    #[error("export io error: {0}")]
    Io(String),
    /// CSV encoding or decoding error.
    #[error("export csv error: {0}")]
    Csv(String),
    /// Table shape is invalid.
    #[error("export invalid table: {0}")]
    Invalid(String),
    /// Participants could not be read from the store.
    #[error("export store error: {0}")]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Table
// ============================================================================

/// In-memory rows x columns snapshot of participant data.
///
/// # Invariants
/// - Every row has exactly one value per column.
/// - Column names are unique.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExportTable {
    /// Column names in output order.
    columns: Vec<String>,
    /// Row values aligned with `columns`.
    rows: Vec<Vec<FieldValue>>,
}

impl ExportTable {
    /// Creates a table from explicit columns and rows.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Invalid`] when column names repeat or a row
    /// width differs from the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<FieldValue>>) -> Result<Self, ExportError> {
        let mut seen = BTreeSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(ExportError::Invalid(format!("duplicate column: {column}")));
            }
        }
        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(ExportError::Invalid(format!(
                    "row {index} has {} values, expected {}",
                    row.len(),
                    columns.len()
                )));
            }
        }
        Ok(Self {
            columns,
            rows,
        })
    }

    /// Builds a table from participant records, one row per record in
    /// identifier order.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Invalid`] when a response field collides with a
    /// metadata column name.
    pub fn from_records(records: &[ParticipantRecord]) -> Result<Self, ExportError> {
        let mut ordered: Vec<&ParticipantRecord> = records.iter().collect();
        ordered.sort_by_key(|record| record.id);

        let fields: BTreeSet<&FieldName> =
            ordered.iter().flat_map(|record| record.responses.keys()).collect();
        if let Some(field) = fields.iter().find(|field| METADATA_COLUMNS.contains(&field.as_str()))
        {
            return Err(ExportError::Invalid(format!(
                "response field collides with metadata column: {field}"
            )));
        }
        let mut columns: Vec<String> = METADATA_COLUMNS.iter().map(ToString::to_string).collect();
        columns.extend(fields.iter().map(ToString::to_string));

        let rows = ordered
            .iter()
            .map(|record| {
                let mut row = Vec::with_capacity(columns.len());
                row.push(i64::try_from(record.id.get()).map_or_else(
                    |_| FieldValue::Text(record.id.to_string()),
                    FieldValue::Integer,
                ));
                row.push(FieldValue::Text(record.run_id.to_string()));
                row.push(FieldValue::Text(record.status.as_str().to_string()));
                row.push(FieldValue::Integer(record.started_at_ms));
                row.push(record.ended_at_ms.map_or(FieldValue::Null, FieldValue::Integer));
                for field in &fields {
                    row.push(record.responses.get(*field).cloned().unwrap_or_default());
                }
                row
            })
            .collect();
        Ok(Self {
            columns,
            rows,
        })
    }

    /// Returns the column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<FieldValue>] {
        &self.rows
    }

    /// Returns the number of rows.
    #[must_use]
    pub const fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of columns.
    #[must_use]
    pub const fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns true when the table has no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns every value of a column, or `None` if the column is absent.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<&FieldValue>> {
        let index = self.columns.iter().position(|column| column == name)?;
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// Writes the table as CSV to an arbitrary writer.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Csv`] when encoding or flushing fails.
    pub fn write_csv_to<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.columns).map_err(|err| ExportError::Csv(err.to_string()))?;
        for row in &self.rows {
            csv_writer
                .write_record(row.iter().map(ToString::to_string))
                .map_err(|err| ExportError::Csv(err.to_string()))?;
        }
        csv_writer.flush().map_err(|err| ExportError::Io(err.to_string()))
    }

    /// Writes the table as CSV to `path`, creating the parent directory
    /// first when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] when the directory or file cannot be
    /// created, or [`ExportError::Csv`] when encoding fails.
    pub fn write_csv(&self, path: &Path) -> Result<(), ExportError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|err| {
                ExportError::Io(format!("create {}: {err}", parent.display()))
            })?;
        }
        let file = File::create(path)
            .map_err(|err| ExportError::Io(format!("create {}: {err}", path.display())))?;
        self.write_csv_to(file)
    }

    /// Reads a CSV export, inferring cell types with [`FieldValue::from_cell`].
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] when the input is not a rectangular CSV table
    /// with a header row.
    pub fn read_csv_from<R: Read>(reader: R) -> Result<Self, ExportError> {
        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let columns: Vec<String> = csv_reader
            .headers()
            .map_err(|err| ExportError::Csv(err.to_string()))?
            .iter()
            .map(ToString::to_string)
            .collect();
        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record.map_err(|err| ExportError::Csv(err.to_string()))?;
            rows.push(record.iter().map(FieldValue::from_cell).collect());
        }
        Self::new(columns, rows)
    }

    /// Reads a CSV export from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] when the file cannot be opened or parsed.
    pub fn read_csv(path: &Path) -> Result<Self, ExportError> {
        let file = File::open(path)
            .map_err(|err| ExportError::Io(format!("open {}: {err}", path.display())))?;
        Self::read_csv_from(file)
    }
}
