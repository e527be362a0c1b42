use std::collections::{HashMap, HashSet};

use regex::Regex;

use crate::category::CategoryDictionary;
use crate::coerce;
use crate::column::ColumnData;
use crate::error::{Result, TableError};
use crate::parallel;
use crate::row::{IndexedRows, Rows, TableRow, TableRowMut};
use crate::types::{ColumnSchema, ColumnType, MissingValues, Value};

/// Row counts above this are worth a log line when a table is resized.
const LARGE_RESIZE_ROWS: usize = 1_000_000;

/// Anything that names a column: a `usize` index or a column title.
pub trait ColumnKey {
    fn resolve(&self, table: &Table) -> Result<usize>;
}

impl ColumnKey for usize {
    fn resolve(&self, table: &Table) -> Result<usize> {
        if *self < table.column_count() {
            Ok(*self)
        } else {
            Err(TableError::ColumnOutOfBounds {
                column: *self,
                column_count: table.column_count(),
            })
        }
    }
}

impl ColumnKey for str {
    fn resolve(&self, table: &Table) -> Result<usize> {
        table.column_index(self)
    }
}

impl ColumnKey for String {
    fn resolve(&self, table: &Table) -> Result<usize> {
        table.column_index(self)
    }
}

impl<K: ColumnKey + ?Sized> ColumnKey for &K {
    fn resolve(&self, table: &Table) -> Result<usize> {
        (**self).resolve(table)
    }
}

/// A rectangular table of typed columns.
///
/// Every column holds exactly [`Table::row_count`] entries after any operation returns.
#[derive(Clone, Debug, Default)]
pub struct Table {
    pub(crate) row_count: usize,
    pub(crate) columns: Vec<ColumnData>,
    pub(crate) titles: Option<Vec<Option<String>>>,
    title_index: HashMap<String, usize>,
    pub(crate) missing: MissingValues,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table with one titled column per `(title, type)` pair and no rows.
    pub fn with_columns(columns: &[(&str, ColumnType)]) -> Self {
        let mut table = Self::new();
        for &(title, column_type) in columns {
            table.add_column(Some(title), column_type);
        }
        table
    }

    pub(crate) fn from_parts(
        row_count: usize,
        columns: Vec<ColumnData>,
        titles: Option<Vec<Option<String>>>,
        missing: MissingValues,
    ) -> Self {
        let mut table = Self {
            row_count,
            columns,
            titles,
            title_index: HashMap::new(),
            missing,
        };
        table.titles_changed();
        table
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    // ---------------------------------------------------------------------------------------
    // Missing values

    pub fn missing_values(&self) -> &MissingValues {
        &self.missing
    }

    /// Text returned for missing category cells and written for missing cells on export.
    pub fn set_missing_string(&mut self, value: Option<&str>) {
        self.missing.string = value.map(str::to_owned);
    }

    pub fn set_missing_int(&mut self, value: i32) {
        self.missing.int = value;
    }

    pub fn set_missing_long(&mut self, value: i64) {
        self.missing.long = value;
    }

    pub fn set_missing_float(&mut self, value: f32) {
        self.missing.float = value;
    }

    pub fn set_missing_double(&mut self, value: f64) {
        self.missing.double = value;
    }

    pub fn set_missing_category(&mut self, value: i32) {
        self.missing.category = value;
    }

    // ---------------------------------------------------------------------------------------
    // Columns

    /// Append a column; returns its index.
    pub fn add_column(&mut self, title: Option<&str>, column_type: ColumnType) -> usize {
        let index = self.columns.len();
        self.push_column(index, title, column_type);
        index
    }

    pub fn insert_column(
        &mut self,
        index: usize,
        title: Option<&str>,
        column_type: ColumnType,
    ) -> Result<()> {
        if index > self.columns.len() {
            return Err(TableError::ColumnOutOfBounds {
                column: index,
                column_count: self.columns.len(),
            });
        }
        self.push_column(index, title, column_type);
        Ok(())
    }

    fn push_column(&mut self, index: usize, title: Option<&str>, column_type: ColumnType) {
        let column = ColumnData::new(column_type, self.row_count, &self.missing);
        if let Some(titles) = &mut self.titles {
            titles.insert(index, title.map(str::to_owned));
        } else if let Some(title) = title {
            let mut titles = vec![None; self.columns.len()];
            titles.insert(index, Some(title.to_owned()));
            self.titles = Some(titles);
        }
        self.columns.insert(index, column);
        self.titles_changed();
    }

    pub fn remove_column<K: ColumnKey>(&mut self, col: K) -> Result<()> {
        let col = col.resolve(self)?;
        self.columns.remove(col);
        if let Some(titles) = &mut self.titles {
            titles.remove(col);
        }
        self.titles_changed();
        Ok(())
    }

    /// Grow with untitled string columns, or truncate.
    pub fn set_column_count(&mut self, count: usize) {
        let row_count = self.row_count;
        let missing = &self.missing;
        self.columns
            .resize_with(count, || ColumnData::new(ColumnType::String, row_count, missing));
        if let Some(titles) = &mut self.titles {
            titles.resize(count, None);
        }
        self.titles_changed();
    }

    pub fn column_type<K: ColumnKey>(&self, col: K) -> Result<ColumnType> {
        let col = col.resolve(self)?;
        Ok(self.columns[col].column_type())
    }

    pub fn column_types(&self) -> Vec<ColumnType> {
        self.columns.iter().map(ColumnData::column_type).collect()
    }

    pub fn schema(&self) -> Vec<ColumnSchema> {
        self.columns
            .iter()
            .enumerate()
            .map(|(col, column)| ColumnSchema {
                name: self.column_title(col).map(str::to_owned),
                column_type: column.column_type(),
            })
            .collect()
    }

    /// Change a column's type, converting every cell through its text form.
    pub fn set_column_type<K: ColumnKey>(&mut self, col: K, column_type: ColumnType) -> Result<()> {
        let col = col.resolve(self)?;
        if self.columns[col].column_type() == column_type {
            return Ok(());
        }
        log::trace!(
            "converting column {col} from {} to {column_type}",
            self.columns[col].column_type()
        );
        self.columns[col] = self.columns[col].convert(column_type, &self.missing);
        Ok(())
    }

    /// Set every column to `column_type`.
    pub fn set_table_type(&mut self, column_type: ColumnType) {
        let types = vec![column_type; self.columns.len()];
        self.convert_columns(&types);
    }

    /// Apply titles and types from a dictionary table.
    ///
    /// Titles come from the dictionary's `title` column (or its first column) and types from
    /// its `type` column (or its second column), one dictionary row per column of this table.
    pub fn set_column_types(&mut self, dictionary: &Table) -> Result<()> {
        let title_col = dictionary.find_column_index("title").unwrap_or(0);
        let type_col = dictionary.find_column_index("type").unwrap_or(1);

        let titles = dictionary.get_string_column(title_col)?;
        let types = if dictionary.column_count() > type_col {
            (0..dictionary.row_count())
                .map(|row| {
                    dictionary
                        .get_string(row, type_col)?
                        .unwrap_or_default()
                        .parse::<ColumnType>()
                })
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };

        self.set_optional_column_titles(titles);
        self.convert_columns(&types);
        Ok(())
    }

    /// Convert column `i` to `types[i]`; columns past the end of `types` are left alone.
    fn convert_columns(&mut self, types: &[ColumnType]) {
        if types.len() > self.columns.len() {
            self.set_column_count(types.len());
        }
        let missing = &self.missing;
        parallel::for_each_column(&mut self.columns, self.row_count, |col, column| {
            let Some(&target) = types.get(col) else {
                return;
            };
            if column.column_type() != target {
                log::trace!("converting column {col} from {} to {target}", column.column_type());
                *column = column.convert(target, missing);
            }
        });
    }

    pub fn category_dictionary<K: ColumnKey>(&self, col: K) -> Result<Option<&CategoryDictionary>> {
        let col = col.resolve(self)?;
        Ok(self.columns[col].dictionary())
    }

    // ---------------------------------------------------------------------------------------
    // Titles

    pub fn has_column_titles(&self) -> bool {
        self.titles.is_some()
    }

    pub fn column_titles(&self) -> Option<&[Option<String>]> {
        self.titles.as_deref()
    }

    pub fn column_title(&self, col: usize) -> Option<&str> {
        self.titles.as_ref()?.get(col)?.as_deref()
    }

    /// Replace all titles. Grows the table if there are more titles than columns.
    pub fn set_column_titles<S: AsRef<str>>(&mut self, titles: &[S]) {
        self.set_optional_column_titles(
            titles.iter().map(|t| Some(t.as_ref().to_owned())).collect(),
        );
    }

    pub fn set_optional_column_titles(&mut self, mut titles: Vec<Option<String>>) {
        if titles.len() > self.columns.len() {
            self.set_column_count(titles.len());
        }
        titles.resize(self.columns.len(), None);
        self.titles = Some(titles);
        self.titles_changed();
    }

    pub fn set_column_title(&mut self, col: usize, title: Option<&str>) -> Result<()> {
        let col = col.resolve(self)?;
        let column_count = self.columns.len();
        let titles = self.titles.get_or_insert_with(|| vec![None; column_count]);
        titles[col] = title.map(str::to_owned);
        self.titles_changed();
        Ok(())
    }

    pub fn clear_column_titles(&mut self) {
        self.titles = None;
        self.titles_changed();
    }

    /// Promote the first row to column titles and remove it.
    pub fn remove_title_row(&mut self) -> Result<()> {
        let titles = self.get_string_row(0)?;
        self.remove_row(0)?;
        self.set_optional_column_titles(titles);
        Ok(())
    }

    fn titles_changed(&mut self) {
        self.title_index.clear();
        if let Some(titles) = &self.titles {
            for (col, title) in titles.iter().enumerate() {
                if let Some(title) = title {
                    // The first column with a given title wins.
                    self.title_index.entry(title.clone()).or_insert(col);
                }
            }
        }
    }

    /// Strict title lookup.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        if self.titles.is_none() {
            return Err(TableError::NoColumnTitles);
        }
        self.find_column_index(name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_owned()))
    }

    /// Tolerant title lookup.
    pub fn find_column_index(&self, name: &str) -> Option<usize> {
        self.title_index.get(name).copied()
    }

    /// Index of the column titled `title`, adding a string column with that title if needed.
    pub fn check_column_index(&mut self, title: &str) -> usize {
        match self.find_column_index(title) {
            Some(col) => col,
            None => self.add_column(Some(title), ColumnType::String),
        }
    }

    // ---------------------------------------------------------------------------------------
    // Rows

    /// Grow or truncate every column to `count` rows.
    pub fn set_row_count(&mut self, count: usize) {
        if count == self.row_count {
            return;
        }
        if count > LARGE_RESIZE_ROWS {
            log::debug!("resizing table to {count} rows");
        }
        for column in &mut self.columns {
            column.resize(count, &self.missing);
        }
        self.row_count = count;
    }

    /// Make room for `capacity` rows in every column without changing the row count.
    pub fn reserve_rows(&mut self, capacity: usize) {
        for column in &mut self.columns {
            column.reserve(capacity);
        }
    }

    /// Rows every column can hold without reallocating.
    pub fn row_capacity(&self) -> usize {
        self.columns
            .iter()
            .map(ColumnData::capacity)
            .min()
            .unwrap_or(0)
    }

    pub fn shrink_to_fit(&mut self) {
        for column in &mut self.columns {
            column.shrink_to_fit();
        }
    }

    fn ensure_size(&mut self, row: usize, column_count: usize) {
        if column_count > self.columns.len() {
            self.set_column_count(column_count);
        }
        if row >= self.row_count {
            self.set_row_count(row + 1);
        }
    }

    /// Append an empty row and return a view of it.
    pub fn add_row(&mut self) -> TableRowMut<'_> {
        let row = self.row_count;
        self.set_row_count(row + 1);
        TableRowMut::new(self, row)
    }

    /// Append a row of values; returns the new row's index.
    pub fn add_row_values(&mut self, values: &[Value]) -> usize {
        let row = self.row_count;
        self.set_row(row, values);
        row
    }

    /// Insert a row before `index`, shifting later rows down.
    pub fn insert_row(&mut self, index: usize, values: &[Value]) -> Result<()> {
        if index > self.row_count {
            return Err(TableError::RowOutOfBounds {
                row: index,
                row_count: self.row_count,
            });
        }
        if values.len() > self.columns.len() {
            self.set_column_count(values.len());
        }
        for column in &mut self.columns {
            column.insert_missing(index, &self.missing);
        }
        self.row_count += 1;
        self.set_row(index, values);
        Ok(())
    }

    pub fn remove_row(&mut self, index: usize) -> Result<()> {
        self.check_row(index)?;
        for column in &mut self.columns {
            column.remove(index);
        }
        self.row_count -= 1;
        Ok(())
    }

    /// Overwrite a row through the permissive value path.
    ///
    /// Grows the table when `row` or `values.len()` are past the current bounds; columns past
    /// the end of `values` become missing.
    pub fn set_row(&mut self, row: usize, values: &[Value]) {
        self.ensure_size(row, values.len());
        for (col, column) in self.columns.iter_mut().enumerate() {
            match values.get(col) {
                Some(value) => column.set_value(row, value, &self.missing),
                None => column.set_text(row, None, &self.missing),
            }
        }
    }

    /// Overwrite a row from raw text fields, parsing each into its column's type.
    pub fn set_row_strings<S: AsRef<str>>(&mut self, row: usize, fields: &[S]) {
        self.ensure_size(row, fields.len());
        for (col, column) in self.columns.iter_mut().enumerate() {
            let field = fields.get(col).map(AsRef::as_ref);
            column.set_text(row, field, &self.missing);
        }
    }

    fn check_row(&self, row: usize) -> Result<()> {
        if row < self.row_count {
            Ok(())
        } else {
            Err(TableError::RowOutOfBounds {
                row,
                row_count: self.row_count,
            })
        }
    }

    fn check_cell<K: ColumnKey>(&self, row: usize, col: K) -> Result<usize> {
        let col = col.resolve(self)?;
        self.check_row(row)?;
        Ok(col)
    }

    // ---------------------------------------------------------------------------------------
    // Cells

    pub fn get_string<K: ColumnKey>(&self, row: usize, col: K) -> Result<Option<String>> {
        let col = self.check_cell(row, col)?;
        Ok(self.columns[col].get_string(row, &self.missing))
    }

    pub fn get_int<K: ColumnKey>(&self, row: usize, col: K) -> Result<i32> {
        let col = self.check_cell(row, col)?;
        Ok(self.columns[col].get_int(row, &self.missing))
    }

    pub fn get_long<K: ColumnKey>(&self, row: usize, col: K) -> Result<i64> {
        let col = self.check_cell(row, col)?;
        Ok(self.columns[col].get_long(row, &self.missing))
    }

    pub fn get_float<K: ColumnKey>(&self, row: usize, col: K) -> Result<f32> {
        let col = self.check_cell(row, col)?;
        Ok(self.columns[col].get_float(row, &self.missing))
    }

    pub fn get_double<K: ColumnKey>(&self, row: usize, col: K) -> Result<f64> {
        let col = self.check_cell(row, col)?;
        Ok(self.columns[col].get_double(row, &self.missing))
    }

    /// Write text into a string or category column.
    pub fn set_string<'a, K: ColumnKey>(
        &mut self,
        row: usize,
        col: K,
        value: impl Into<Option<&'a str>>,
    ) -> Result<()> {
        let col = self.check_cell(row, col)?;
        let value = value.into();
        match &mut self.columns[col] {
            ColumnData::Str(v) => v[row] = value.map(str::to_owned),
            ColumnData::Category {
                indices,
                dictionary,
            } => {
                indices[row] = match value {
                    Some(label) => dictionary.index(label),
                    None => self.missing.category,
                }
            }
            _ => {
                return Err(TableError::TypeMismatch {
                    column: col,
                    expected: ColumnType::String,
                })
            }
        }
        Ok(())
    }

    /// Write an int into an int or string column, or a known index into a category column.
    pub fn set_int<K: ColumnKey>(&mut self, row: usize, col: K, value: i32) -> Result<()> {
        let col = self.check_cell(row, col)?;
        match &mut self.columns[col] {
            ColumnData::Str(v) => v[row] = Some(value.to_string()),
            ColumnData::Int(v) => v[row] = value,
            ColumnData::Category {
                indices,
                dictionary,
            } => {
                if value != self.missing.category && !dictionary.has_label(value) {
                    return Err(TableError::UnknownCategory { column: col, index: value });
                }
                indices[row] = value;
            }
            _ => {
                return Err(TableError::TypeMismatch {
                    column: col,
                    expected: ColumnType::Int,
                })
            }
        }
        Ok(())
    }

    pub fn set_long<K: ColumnKey>(&mut self, row: usize, col: K, value: i64) -> Result<()> {
        let col = self.check_cell(row, col)?;
        match &mut self.columns[col] {
            ColumnData::Str(v) => v[row] = Some(value.to_string()),
            ColumnData::Long(v) => v[row] = value,
            _ => {
                return Err(TableError::TypeMismatch {
                    column: col,
                    expected: ColumnType::Long,
                })
            }
        }
        Ok(())
    }

    pub fn set_float<K: ColumnKey>(&mut self, row: usize, col: K, value: f32) -> Result<()> {
        let col = self.check_cell(row, col)?;
        match &mut self.columns[col] {
            ColumnData::Str(v) => v[row] = Some(value.to_string()),
            ColumnData::Float(v) => v[row] = value,
            _ => {
                return Err(TableError::TypeMismatch {
                    column: col,
                    expected: ColumnType::Float,
                })
            }
        }
        Ok(())
    }

    pub fn set_double<K: ColumnKey>(&mut self, row: usize, col: K, value: f64) -> Result<()> {
        let col = self.check_cell(row, col)?;
        match &mut self.columns[col] {
            ColumnData::Str(v) => v[row] = Some(value.to_string()),
            ColumnData::Double(v) => v[row] = value,
            _ => {
                return Err(TableError::TypeMismatch {
                    column: col,
                    expected: ColumnType::Double,
                })
            }
        }
        Ok(())
    }

    /// Write any value, converting it to the column's type; never a type mismatch.
    pub fn set_value<K: ColumnKey>(
        &mut self,
        row: usize,
        col: K,
        value: impl Into<Value>,
    ) -> Result<()> {
        let col = self.check_cell(row, col)?;
        self.columns[col].set_value(row, &value.into(), &self.missing);
        Ok(())
    }

    // ---------------------------------------------------------------------------------------
    // Bulk accessors

    pub fn get_string_column<K: ColumnKey>(&self, col: K) -> Result<Vec<Option<String>>> {
        let col = col.resolve(self)?;
        let column = &self.columns[col];
        Ok((0..self.row_count)
            .map(|row| column.get_string(row, &self.missing))
            .collect())
    }

    pub fn get_int_column<K: ColumnKey>(&self, col: K) -> Result<Vec<i32>> {
        let col = col.resolve(self)?;
        let column = &self.columns[col];
        Ok((0..self.row_count)
            .map(|row| column.get_int(row, &self.missing))
            .collect())
    }

    pub fn get_long_column<K: ColumnKey>(&self, col: K) -> Result<Vec<i64>> {
        let col = col.resolve(self)?;
        let column = &self.columns[col];
        Ok((0..self.row_count)
            .map(|row| column.get_long(row, &self.missing))
            .collect())
    }

    pub fn get_float_column<K: ColumnKey>(&self, col: K) -> Result<Vec<f32>> {
        let col = col.resolve(self)?;
        let column = &self.columns[col];
        Ok((0..self.row_count)
            .map(|row| column.get_float(row, &self.missing))
            .collect())
    }

    pub fn get_double_column<K: ColumnKey>(&self, col: K) -> Result<Vec<f64>> {
        let col = col.resolve(self)?;
        let column = &self.columns[col];
        Ok((0..self.row_count)
            .map(|row| column.get_double(row, &self.missing))
            .collect())
    }

    pub fn get_string_row(&self, row: usize) -> Result<Vec<Option<String>>> {
        self.check_row(row)?;
        Ok(self
            .columns
            .iter()
            .map(|column| column.get_string(row, &self.missing))
            .collect())
    }

    pub fn get_int_row(&self, row: usize) -> Result<Vec<i32>> {
        self.check_row(row)?;
        Ok(self
            .columns
            .iter()
            .map(|column| column.get_int(row, &self.missing))
            .collect())
    }

    pub fn get_long_row(&self, row: usize) -> Result<Vec<i64>> {
        self.check_row(row)?;
        Ok(self
            .columns
            .iter()
            .map(|column| column.get_long(row, &self.missing))
            .collect())
    }

    pub fn get_float_row(&self, row: usize) -> Result<Vec<f32>> {
        self.check_row(row)?;
        Ok(self
            .columns
            .iter()
            .map(|column| column.get_float(row, &self.missing))
            .collect())
    }

    pub fn get_double_row(&self, row: usize) -> Result<Vec<f64>> {
        self.check_row(row)?;
        Ok(self
            .columns
            .iter()
            .map(|column| column.get_double(row, &self.missing))
            .collect())
    }

    // ---------------------------------------------------------------------------------------
    // Row views

    pub fn row(&self, row: usize) -> Result<TableRow<'_>> {
        self.check_row(row)?;
        Ok(TableRow::new(self, row))
    }

    pub fn row_mut(&mut self, row: usize) -> Result<TableRowMut<'_>> {
        self.check_row(row)?;
        Ok(TableRowMut::new(self, row))
    }

    pub fn rows(&self) -> Rows<'_> {
        Rows::new(self)
    }

    pub fn rows_at(&self, rows: &[usize]) -> Result<IndexedRows<'_>> {
        for &row in rows {
            self.check_row(row)?;
        }
        Ok(IndexedRows::new(self, rows.to_vec()))
    }

    // ---------------------------------------------------------------------------------------
    // Sorting and searching

    /// Stable sort of every column by the values in `col`.
    pub fn sort<K: ColumnKey>(&mut self, col: K, reverse: bool) -> Result<()> {
        let col = col.resolve(self)?;
        let key = &self.columns[col];
        let mut order: Vec<usize> = (0..self.row_count).collect();
        if reverse {
            order.sort_by(|&a, &b| key.compare_rows(b, a));
        } else {
            order.sort_by(|&a, &b| key.compare_rows(a, b));
        }
        for column in &mut self.columns {
            column.permute(&order);
        }
        Ok(())
    }

    /// Rows whose text in `col` satisfies `pred`, in row order.
    fn scan<'a, F>(&'a self, col: usize, mut pred: F) -> impl Iterator<Item = usize> + 'a
    where
        F: FnMut(Option<&str>) -> bool + 'a,
    {
        let column = &self.columns[col];
        (0..self.row_count).filter(move |&row| pred(column.get_text(row, &self.missing).as_deref()))
    }

    /// First row whose text in `col` equals `value`.
    pub fn find_row_index<K: ColumnKey>(&self, value: Option<&str>, col: K) -> Result<Option<usize>> {
        let col = col.resolve(self)?;
        Ok(self.scan(col, |text| text == value).next())
    }

    pub fn find_row_indices<K: ColumnKey>(&self, value: Option<&str>, col: K) -> Result<Vec<usize>> {
        let col = col.resolve(self)?;
        Ok(self.scan(col, |text| text == value).collect())
    }

    /// First row whose text in `col` contains a match for `pattern`.
    pub fn match_row_index<K: ColumnKey>(&self, pattern: &str, col: K) -> Result<Option<usize>> {
        let regex = Regex::new(pattern)?;
        let col = col.resolve(self)?;
        let found = self
            .scan(col, |text| text.is_some_and(|t| regex.is_match(t)))
            .next();
        Ok(found)
    }

    pub fn match_row_indices<K: ColumnKey>(&self, pattern: &str, col: K) -> Result<Vec<usize>> {
        let regex = Regex::new(pattern)?;
        let col = col.resolve(self)?;
        Ok(self
            .scan(col, |text| text.is_some_and(|t| regex.is_match(t)))
            .collect())
    }

    pub fn find_row<K: ColumnKey>(&self, value: Option<&str>, col: K) -> Result<Option<TableRow<'_>>> {
        Ok(self
            .find_row_index(value, col)?
            .map(|row| TableRow::new(self, row)))
    }

    pub fn find_rows<K: ColumnKey>(&self, value: Option<&str>, col: K) -> Result<IndexedRows<'_>> {
        let rows = self.find_row_indices(value, col)?;
        Ok(IndexedRows::new(self, rows))
    }

    pub fn match_row<K: ColumnKey>(&self, pattern: &str, col: K) -> Result<Option<TableRow<'_>>> {
        Ok(self
            .match_row_index(pattern, col)?
            .map(|row| TableRow::new(self, row)))
    }

    pub fn match_rows<K: ColumnKey>(&self, pattern: &str, col: K) -> Result<IndexedRows<'_>> {
        let rows = self.match_row_indices(pattern, col)?;
        Ok(IndexedRows::new(self, rows))
    }

    // ---------------------------------------------------------------------------------------
    // Text cleanup

    /// Replace cells equal to `orig` with `replacement`. Only string columns are touched.
    pub fn replace<K: ColumnKey>(
        &mut self,
        orig: Option<&str>,
        replacement: Option<&str>,
        col: K,
    ) -> Result<()> {
        let col = col.resolve(self)?;
        if let ColumnData::Str(cells) = &mut self.columns[col] {
            for cell in cells.iter_mut().filter(|cell| cell.as_deref() == orig) {
                *cell = replacement.map(str::to_owned);
            }
        }
        Ok(())
    }

    /// [`Table::replace`] across every column.
    pub fn replace_everywhere(&mut self, orig: Option<&str>, replacement: Option<&str>) {
        for col in 0..self.columns.len() {
            // `col` is always in range.
            let _ = self.replace(orig, replacement, col);
        }
    }

    /// Regex replacement within a string column; `$1`-style group references are expanded.
    pub fn replace_all<K: ColumnKey>(&mut self, pattern: &str, replacement: &str, col: K) -> Result<()> {
        let col = col.resolve(self)?;
        let regex = Regex::new(pattern)?;
        let ColumnData::Str(cells) = &mut self.columns[col] else {
            return Err(TableError::TypeMismatch {
                column: col,
                expected: ColumnType::String,
            });
        };
        for cell in cells.iter_mut().flatten() {
            if regex.is_match(cell) {
                *cell = regex.replace_all(cell, replacement).into_owned();
            }
        }
        Ok(())
    }

    /// Strip every character in `tokens` from the text of each cell in `col`.
    pub fn remove_tokens<K: ColumnKey>(&mut self, tokens: &str, col: K) -> Result<()> {
        let col = col.resolve(self)?;
        for row in 0..self.row_count {
            let Some(text) = self.columns[col].get_string(row, &self.missing) else {
                continue;
            };
            let stripped = coerce::remove_tokens(&text, tokens);
            if stripped != text {
                self.columns[col].set_text(row, Some(&stripped), &self.missing);
            }
        }
        Ok(())
    }

    pub fn remove_tokens_everywhere(&mut self, tokens: &str) {
        for col in 0..self.columns.len() {
            let _ = self.remove_tokens(tokens, col);
        }
    }

    /// Trim leading and trailing whitespace in a string column.
    pub fn trim<K: ColumnKey>(&mut self, col: K) -> Result<()> {
        let col = col.resolve(self)?;
        if let ColumnData::Str(cells) = &mut self.columns[col] {
            for cell in cells.iter_mut().flatten() {
                let trimmed = cell.trim();
                if trimmed.len() != cell.len() {
                    *cell = trimmed.to_owned();
                }
            }
        }
        Ok(())
    }

    pub fn trim_all(&mut self) {
        for col in 0..self.columns.len() {
            let _ = self.trim(col);
        }
    }

    /// Turn missing cells in string columns into empty strings.
    pub fn make_null_empty(&mut self) {
        for column in &mut self.columns {
            if let ColumnData::Str(cells) = column {
                for cell in cells.iter_mut().filter(|cell| cell.is_none()) {
                    *cell = Some(String::new());
                }
            }
        }
    }

    /// Turn empty strings in string columns into missing cells.
    pub fn make_empty_null(&mut self) {
        for column in &mut self.columns {
            if let ColumnData::Str(cells) = column {
                for cell in cells.iter_mut().filter(|cell| cell.as_deref() == Some("")) {
                    *cell = None;
                }
            }
        }
    }

    // ---------------------------------------------------------------------------------------
    // Lookups

    /// Distinct non-missing values of `col`, in order of first appearance.
    pub fn unique<K: ColumnKey>(&self, col: K) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for text in self.scan_text(col.resolve(self)?).flatten() {
            if seen.insert(text.clone()) {
                out.push(text);
            }
        }
        Ok(out)
    }

    /// Occurrence count of every distinct non-missing value of `col`.
    pub fn unique_count<K: ColumnKey>(&self, col: K) -> Result<HashMap<String, usize>> {
        let mut counts = HashMap::new();
        for text in self.scan_text(col.resolve(self)?).flatten() {
            *counts.entry(text).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Map from each value of `col` to the last row holding it.
    pub fn row_lookup<K: ColumnKey>(&self, col: K) -> Result<HashMap<String, usize>> {
        let mut lookup = HashMap::new();
        for (row, text) in self.scan_text(col.resolve(self)?).enumerate() {
            if let Some(text) = text {
                lookup.insert(text, row);
            }
        }
        Ok(lookup)
    }

    /// Stored text of every cell in `col`; missing cells yield `None`.
    fn scan_text(&self, col: usize) -> impl Iterator<Item = Option<String>> + '_ {
        let column = &self.columns[col];
        (0..self.row_count).map(move |row| column.stored_text(row))
    }

    /// A new table with the same schema holding copies of `rows`, in that order.
    pub fn subset(&self, rows: &[usize]) -> Result<Table> {
        for &row in rows {
            self.check_row(row)?;
        }
        let columns = self.columns.iter().map(|column| column.select(rows)).collect();
        Ok(Table::from_parts(
            rows.len(),
            columns,
            self.titles.clone(),
            self.missing.clone(),
        ))
    }

    /// Largest non-NaN float over every cell, or the missing float when there is none.
    pub fn max_float(&self) -> f32 {
        self.columns
            .iter()
            .flat_map(|column| (0..self.row_count).map(move |row| column.get_float(row, &self.missing)))
            .filter(|v| !v.is_nan())
            .reduce(f32::max)
            .unwrap_or(self.missing.float)
    }
}
