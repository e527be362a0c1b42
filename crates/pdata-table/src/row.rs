//! Lightweight `(table, row)` handles.
//!
//! A view carries nothing but a table reference and a row index, so copies are independent:
//! moving one view to another row never affects the others.

use std::iter::FusedIterator;

use crate::error::Result;
use crate::table::{ColumnKey, Table};
use crate::types::{ColumnType, Value};

/// Read-only view of one row.
#[derive(Clone, Copy, Debug)]
pub struct TableRow<'a> {
    table: &'a Table,
    row: usize,
}

impl<'a> TableRow<'a> {
    pub(crate) fn new(table: &'a Table, row: usize) -> Self {
        Self { table, row }
    }

    pub fn index(&self) -> usize {
        self.row
    }

    /// Point this view at another row of the same table.
    ///
    /// The index is checked when a cell is read, not here.
    pub fn set_index(&mut self, row: usize) {
        self.row = row;
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    pub fn column_count(&self) -> usize {
        self.table.column_count()
    }

    pub fn column_title(&self, col: usize) -> Option<&'a str> {
        self.table.column_title(col)
    }

    pub fn column_type<K: ColumnKey>(&self, col: K) -> Result<ColumnType> {
        self.table.column_type(col)
    }

    pub fn get_string<K: ColumnKey>(&self, col: K) -> Result<Option<String>> {
        self.table.get_string(self.row, col)
    }

    pub fn get_int<K: ColumnKey>(&self, col: K) -> Result<i32> {
        self.table.get_int(self.row, col)
    }

    pub fn get_long<K: ColumnKey>(&self, col: K) -> Result<i64> {
        self.table.get_long(self.row, col)
    }

    pub fn get_float<K: ColumnKey>(&self, col: K) -> Result<f32> {
        self.table.get_float(self.row, col)
    }

    pub fn get_double<K: ColumnKey>(&self, col: K) -> Result<f64> {
        self.table.get_double(self.row, col)
    }

    /// Every cell of the row as text.
    pub fn to_strings(&self) -> Result<Vec<Option<String>>> {
        self.table.get_string_row(self.row)
    }
}

/// Mutable view of one row; setters follow the table's typed setter rules.
#[derive(Debug)]
pub struct TableRowMut<'a> {
    table: &'a mut Table,
    row: usize,
}

impl<'a> TableRowMut<'a> {
    pub(crate) fn new(table: &'a mut Table, row: usize) -> Self {
        Self { table, row }
    }

    pub fn index(&self) -> usize {
        self.row
    }

    pub fn set_index(&mut self, row: usize) {
        self.row = row;
    }

    /// Reborrow as a read-only view of the same row.
    pub fn as_row(&self) -> TableRow<'_> {
        TableRow::new(&*self.table, self.row)
    }

    pub fn column_count(&self) -> usize {
        self.table.column_count()
    }

    pub fn column_title(&self, col: usize) -> Option<&str> {
        self.table.column_title(col)
    }

    pub fn column_type<K: ColumnKey>(&self, col: K) -> Result<ColumnType> {
        self.table.column_type(col)
    }

    pub fn get_string<K: ColumnKey>(&self, col: K) -> Result<Option<String>> {
        self.table.get_string(self.row, col)
    }

    pub fn get_int<K: ColumnKey>(&self, col: K) -> Result<i32> {
        self.table.get_int(self.row, col)
    }

    pub fn get_long<K: ColumnKey>(&self, col: K) -> Result<i64> {
        self.table.get_long(self.row, col)
    }

    pub fn get_float<K: ColumnKey>(&self, col: K) -> Result<f32> {
        self.table.get_float(self.row, col)
    }

    pub fn get_double<K: ColumnKey>(&self, col: K) -> Result<f64> {
        self.table.get_double(self.row, col)
    }

    pub fn set_string<'s, K: ColumnKey>(
        &mut self,
        col: K,
        value: impl Into<Option<&'s str>>,
    ) -> Result<()> {
        self.table.set_string(self.row, col, value)
    }

    pub fn set_int<K: ColumnKey>(&mut self, col: K, value: i32) -> Result<()> {
        self.table.set_int(self.row, col, value)
    }

    pub fn set_long<K: ColumnKey>(&mut self, col: K, value: i64) -> Result<()> {
        self.table.set_long(self.row, col, value)
    }

    pub fn set_float<K: ColumnKey>(&mut self, col: K, value: f32) -> Result<()> {
        self.table.set_float(self.row, col, value)
    }

    pub fn set_double<K: ColumnKey>(&mut self, col: K, value: f64) -> Result<()> {
        self.table.set_double(self.row, col, value)
    }

    pub fn set_value<K: ColumnKey>(&mut self, col: K, value: impl Into<Value>) -> Result<()> {
        self.table.set_value(self.row, col, value)
    }
}

/// Every row of a table, front to back. Clone it to iterate again.
#[derive(Clone, Debug)]
pub struct Rows<'a> {
    table: &'a Table,
    next: usize,
    end: usize,
}

impl<'a> Rows<'a> {
    pub(crate) fn new(table: &'a Table) -> Self {
        Self {
            table,
            next: 0,
            end: table.row_count(),
        }
    }
}

impl<'a> Iterator for Rows<'a> {
    type Item = TableRow<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == self.end {
            return None;
        }
        let row = TableRow::new(self.table, self.next);
        self.next += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.end - self.next;
        (len, Some(len))
    }
}

impl DoubleEndedIterator for Rows<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.next == self.end {
            return None;
        }
        self.end -= 1;
        Some(TableRow::new(self.table, self.end))
    }
}

impl ExactSizeIterator for Rows<'_> {}
impl FusedIterator for Rows<'_> {}

/// Views of a chosen set of rows, e.g. the result of a search.
#[derive(Clone, Debug)]
pub struct IndexedRows<'a> {
    table: &'a Table,
    rows: std::vec::IntoIter<usize>,
}

impl<'a> IndexedRows<'a> {
    pub(crate) fn new(table: &'a Table, rows: Vec<usize>) -> Self {
        Self {
            table,
            rows: rows.into_iter(),
        }
    }

    /// Row indices not yet yielded.
    pub fn indices(&self) -> &[usize] {
        self.rows.as_slice()
    }
}

impl<'a> Iterator for IndexedRows<'a> {
    type Item = TableRow<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(TableRow::new(self.table, row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl DoubleEndedIterator for IndexedRows<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let row = self.rows.next_back()?;
        Some(TableRow::new(self.table, row))
    }
}

impl ExactSizeIterator for IndexedRows<'_> {}
impl FusedIterator for IndexedRows<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers() -> Table {
        let mut table = Table::with_columns(&[("n", ColumnType::Int), ("label", ColumnType::String)]);
        for (n, label) in [(1, "one"), (2, "two"), (3, "three")] {
            table.add_row_values(&[n.into(), label.into()]);
        }
        table
    }

    #[test]
    fn copied_views_move_independently() {
        let table = numbers();
        let first = table.row(0).unwrap();
        let mut second = first;
        second.set_index(2);
        assert_eq!(first.get_int("n").unwrap(), 1);
        assert_eq!(second.get_int("n").unwrap(), 3);
    }

    #[test]
    fn rows_iterator_is_restartable() {
        let table = numbers();
        let rows = table.rows();
        let forward: Vec<i32> = rows.clone().map(|r| r.get_int("n").unwrap()).collect();
        let again: Vec<i32> = rows.rev().map(|r| r.get_int("n").unwrap()).collect();
        assert_eq!(forward, vec![1, 2, 3]);
        assert_eq!(again, vec![3, 2, 1]);
        assert_eq!(table.rows().len(), 3);
    }

    #[test]
    fn mutable_view_uses_typed_setters() {
        let mut table = numbers();
        let mut row = table.add_row();
        assert_eq!(row.index(), 3);
        row.set_int("n", 4).unwrap();
        row.set_string("label", "four").unwrap();
        assert!(row.set_string("n", "x").is_err());
        assert_eq!(row.as_row().to_strings().unwrap(), vec![
            Some("4".to_owned()),
            Some("four".to_owned())
        ]);
    }

    #[test]
    fn stale_view_reports_missing_row() {
        let mut table = numbers();
        table.remove_row(2).unwrap();
        let mut view = table.row(0).unwrap();
        view.set_index(2);
        assert!(view.get_int("n").is_err());
    }

    #[test]
    fn rows_at_rejects_out_of_range_indices() {
        let table = numbers();
        assert!(table.rows_at(&[0, 5]).is_err());
        let picked: Vec<usize> = table.rows_at(&[2, 0]).unwrap().map(|r| r.index()).collect();
        assert_eq!(picked, vec![2, 0]);
    }
}
