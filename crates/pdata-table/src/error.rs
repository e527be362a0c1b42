use std::path::PathBuf;

use thiserror::Error;

use crate::types::ColumnType;

pub type Result<T, E = TableError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("row {row} does not exist (table has {row_count} rows)")]
    RowOutOfBounds { row: usize, row_count: usize },
    #[error("column {column} does not exist (table has {column_count} columns)")]
    ColumnOutOfBounds { column: usize, column_count: usize },
    #[error("this table has no column named '{0}'")]
    UnknownColumn(String),
    #[error("this table has no header, so no column titles are set")]
    NoColumnTitles,
    #[error("column {column} is not a {expected} column")]
    TypeMismatch { column: usize, expected: ColumnType },
    #[error("category index {index} has no label in column {column}")]
    UnknownCategory { column: usize, index: i32 },
    #[error("'{0}' is not a valid column type")]
    InvalidColumnType(String),
    #[error("'{0}' is not a valid option for loading or saving a table")]
    InvalidOption(String),
    #[error("invalid regular expression: {0}")]
    Pattern(#[from] regex::Error),
    #[error("unterminated quoted field starting on line {line}")]
    UnterminatedQuote { line: u64 },
    #[error("invalid UTF-8 on line {line}")]
    InvalidUtf8 { line: u64 },
    #[error("failed to read record {record}: {source}")]
    Read {
        record: u64,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("not a table snapshot (expected magic {expected:#010x}, found {found:#010x})")]
    BadMagic { expected: u32, found: u32 },
    #[error("truncated table snapshot while reading {context}")]
    Truncated { context: &'static str },
    #[error("corrupt table snapshot: {0}")]
    Corrupt(String),
    #[error("invalid spreadsheet document: {0}")]
    InvalidDocument(String),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    Xml(#[from] roxmltree::Error),
    #[error("row {row} has {found} values but the source declares {expected} columns")]
    RowShape {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("row source failed: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("cannot tell the table format of `{path}`; name it .csv/.tsv or pass csv or tsv")]
    UnknownFormat { path: PathBuf },
}
