use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or labelling a table.
#[derive(Error, Debug)]
pub enum LabelError {
    /// The path does not end in a recognised extension.
    #[error(
        "unsupported data source {0:?}: expected a .csv, .xls, .xlsx, .ods, .json or .parquet file, or a table"
    )]
    UnsupportedSource(PathBuf),

    #[error("column not found: {0:?}")]
    ColumnNotFound(String),

    /// Keyword search on a column holding no text values.
    #[error("column {column:?} has no text values to search")]
    UnsupportedColumnType { column: String },

    /// An indicator column would replace an existing column under
    /// [`CollisionPolicy::Reject`](crate::CollisionPolicy::Reject).
    #[error("column {0:?} already exists")]
    ColumnExists(String),

    #[error("duplicate column name {0:?}")]
    DuplicateColumn(String),

    #[error("column {column:?} has {found} rows, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        found: usize,
    },

    /// A CSV record with more fields than the header row.
    #[error("line {line}: {found} fields, header has {expected}")]
    LongRecord {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("sheet {0:?} not found in workbook")]
    MissingSheet(String),

    #[error("invalid JSON table: {0}")]
    InvalidJson(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

pub type Result<T, E = LabelError> = std::result::Result<T, E>;
