//! Typed in-memory tables for sketches and small data tools.
//!
//! This crate focuses on:
//! - A column store with one homogeneous array per column (string, int, long, float, double or
//!   dictionary-encoded category), kept the same length as the row count after every operation.
//! - Best-effort coercion between column types, with per-table missing-value sentinels instead
//!   of errors for unparseable cells.
//! - Streaming CSV/TSV ingestion (quoted fields may span lines) and CSV/TSV/HTML/ODS output.
//! - A private binary snapshot format for fast save/load round trips.

#![forbid(unsafe_code)]

mod category;
pub mod coerce;
mod column;
mod error;
mod export;
mod import;
mod ods;
mod options;
mod parallel;
mod row;
mod snapshot;
mod source;
mod table;
pub mod tokenizer;
mod types;

pub use crate::category::CategoryDictionary;
pub use crate::error::{Result, TableError};
pub use crate::options::{save_format, ParseOptions, TableFormat, TextEncoding};
pub use crate::parallel::PARALLEL_ROW_THRESHOLD;
pub use crate::row::{IndexedRows, Rows, TableRow, TableRowMut};
pub use crate::snapshot::MAGIC as SNAPSHOT_MAGIC;
pub use crate::source::RowSource;
pub use crate::table::{ColumnKey, Table};
pub use crate::types::{ColumnSchema, ColumnType, MissingValues, Value};
