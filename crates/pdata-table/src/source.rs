use crate::error::{Result, TableError};
use crate::table::Table;
use crate::types::{ColumnType, Value};

/// Anything that can emit logical rows for [`Table::from_source`].
///
/// The declared schema fixes the column count. Rows may be shorter (they are padded with
/// missing values) but never wider.
pub trait RowSource {
    type Error: std::error::Error + Send + Sync + 'static;

    fn column_titles(&self) -> Option<Vec<String>>;

    /// Declared column types. An empty list lets the first row decide, as string columns.
    fn column_types(&self) -> Vec<ColumnType>;

    fn next_row(&mut self) -> std::result::Result<Option<Vec<Value>>, Self::Error>;
}

impl Table {
    /// Bulk-load every row a source emits.
    pub fn from_source<S: RowSource>(mut source: S) -> Result<Table> {
        let mut table = Table::new();
        for column_type in source.column_types() {
            table.add_column(None, column_type);
        }
        if let Some(titles) = source.column_titles() {
            table.set_column_titles(&titles);
        }

        let mut expected = table.column_count();
        let mut row = 0;
        while let Some(values) = source
            .next_row()
            .map_err(|err| TableError::Source(Box::new(err)))?
        {
            if row == 0 && expected == 0 {
                expected = values.len();
            }
            if values.len() > expected {
                return Err(TableError::RowShape {
                    row,
                    expected,
                    found: values.len(),
                });
            }
            if row >= table.row_capacity() {
                table.reserve_rows((row * 2).max(16));
            }
            table.set_row(row, &values);
            row += 1;
        }
        table.shrink_to_fit();
        Ok(table)
    }
}
