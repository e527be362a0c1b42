use std::borrow::Cow;
use std::cmp::Ordering;

use crate::category::CategoryDictionary;
use crate::coerce::{
    float_to_int, float_to_long, parse_opt_double, parse_opt_float, parse_opt_int, parse_opt_long,
};
use crate::types::{ColumnType, MissingValues, Value};

/// Backing storage for one column. Every variant holds exactly `row_count` entries.
#[derive(Clone, Debug)]
pub(crate) enum ColumnData {
    Str(Vec<Option<String>>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Category {
        indices: Vec<i32>,
        dictionary: CategoryDictionary,
    },
}

/// Grow `values` so it can hold at least `min` entries, doubling when that is larger.
pub(crate) fn expand<T>(values: &mut Vec<T>, min: usize) {
    if values.capacity() >= min {
        return;
    }
    let target = min.max(values.capacity().saturating_mul(2));
    values.reserve_exact(target - values.len());
}

fn permuted<T: Clone>(values: &[T], order: &[usize]) -> Vec<T> {
    order.iter().map(|&i| values[i].clone()).collect()
}

impl ColumnData {
    pub fn new(column_type: ColumnType, len: usize, missing: &MissingValues) -> Self {
        match column_type {
            ColumnType::String => ColumnData::Str(vec![None; len]),
            ColumnType::Int => ColumnData::Int(vec![missing.int; len]),
            ColumnType::Long => ColumnData::Long(vec![missing.long; len]),
            ColumnType::Float => ColumnData::Float(vec![missing.float; len]),
            ColumnType::Double => ColumnData::Double(vec![missing.double; len]),
            ColumnType::Category => ColumnData::Category {
                indices: vec![missing.category; len],
                dictionary: CategoryDictionary::new(),
            },
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnData::Str(_) => ColumnType::String,
            ColumnData::Int(_) => ColumnType::Int,
            ColumnData::Long(_) => ColumnType::Long,
            ColumnData::Float(_) => ColumnType::Float,
            ColumnData::Double(_) => ColumnType::Double,
            ColumnData::Category { .. } => ColumnType::Category,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Str(v) => v.len(),
            ColumnData::Int(v) => v.len(),
            ColumnData::Long(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Double(v) => v.len(),
            ColumnData::Category { indices, .. } => indices.len(),
        }
    }

    pub fn dictionary(&self) -> Option<&CategoryDictionary> {
        match self {
            ColumnData::Category { dictionary, .. } => Some(dictionary),
            _ => None,
        }
    }

    /// Grow or shrink to `len` entries; new slots hold the missing value.
    pub fn resize(&mut self, len: usize, missing: &MissingValues) {
        match self {
            ColumnData::Str(v) => v.resize(len, None),
            ColumnData::Int(v) => v.resize(len, missing.int),
            ColumnData::Long(v) => v.resize(len, missing.long),
            ColumnData::Float(v) => v.resize(len, missing.float),
            ColumnData::Double(v) => v.resize(len, missing.double),
            ColumnData::Category { indices, .. } => indices.resize(len, missing.category),
        }
    }

    pub fn reserve(&mut self, capacity: usize) {
        match self {
            ColumnData::Str(v) => expand(v, capacity),
            ColumnData::Int(v) => expand(v, capacity),
            ColumnData::Long(v) => expand(v, capacity),
            ColumnData::Float(v) => expand(v, capacity),
            ColumnData::Double(v) => expand(v, capacity),
            ColumnData::Category { indices, .. } => expand(indices, capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        match self {
            ColumnData::Str(v) => v.capacity(),
            ColumnData::Int(v) => v.capacity(),
            ColumnData::Long(v) => v.capacity(),
            ColumnData::Float(v) => v.capacity(),
            ColumnData::Double(v) => v.capacity(),
            ColumnData::Category { indices, .. } => indices.capacity(),
        }
    }

    pub fn shrink_to_fit(&mut self) {
        match self {
            ColumnData::Str(v) => v.shrink_to_fit(),
            ColumnData::Int(v) => v.shrink_to_fit(),
            ColumnData::Long(v) => v.shrink_to_fit(),
            ColumnData::Float(v) => v.shrink_to_fit(),
            ColumnData::Double(v) => v.shrink_to_fit(),
            ColumnData::Category { indices, .. } => indices.shrink_to_fit(),
        }
    }

    pub fn insert_missing(&mut self, row: usize, missing: &MissingValues) {
        match self {
            ColumnData::Str(v) => v.insert(row, None),
            ColumnData::Int(v) => v.insert(row, missing.int),
            ColumnData::Long(v) => v.insert(row, missing.long),
            ColumnData::Float(v) => v.insert(row, missing.float),
            ColumnData::Double(v) => v.insert(row, missing.double),
            ColumnData::Category { indices, .. } => indices.insert(row, missing.category),
        }
    }

    pub fn remove(&mut self, row: usize) {
        match self {
            ColumnData::Str(v) => {
                v.remove(row);
            }
            ColumnData::Int(v) => {
                v.remove(row);
            }
            ColumnData::Long(v) => {
                v.remove(row);
            }
            ColumnData::Float(v) => {
                v.remove(row);
            }
            ColumnData::Double(v) => {
                v.remove(row);
            }
            ColumnData::Category { indices, .. } => {
                indices.remove(row);
            }
        }
    }

    /// Reorder so that entry `i` becomes the old entry `order[i]`.
    pub fn permute(&mut self, order: &[usize]) {
        match self {
            ColumnData::Str(v) => *v = permuted(v, order),
            ColumnData::Int(v) => *v = permuted(v, order),
            ColumnData::Long(v) => *v = permuted(v, order),
            ColumnData::Float(v) => *v = permuted(v, order),
            ColumnData::Double(v) => *v = permuted(v, order),
            ColumnData::Category { indices, .. } => *indices = permuted(indices, order),
        }
    }

    /// A new column holding the entries at `rows`, in that order.
    pub fn select(&self, rows: &[usize]) -> Self {
        let mut out = self.clone();
        out.permute(rows);
        out
    }

    fn category_label<'a>(
        indices: &[i32],
        dictionary: &'a CategoryDictionary,
        row: usize,
    ) -> Option<&'a str> {
        dictionary.label(indices[row])
    }

    pub fn get_string(&self, row: usize, missing: &MissingValues) -> Option<String> {
        match self {
            ColumnData::Str(v) => v[row].clone(),
            ColumnData::Int(v) => Some(v[row].to_string()),
            ColumnData::Long(v) => Some(v[row].to_string()),
            // NaN is the float sentinel, so it reads back as missing text.
            ColumnData::Float(v) if v[row].is_nan() => missing.string.clone(),
            ColumnData::Double(v) if v[row].is_nan() => missing.string.clone(),
            ColumnData::Float(v) => Some(v[row].to_string()),
            ColumnData::Double(v) => Some(v[row].to_string()),
            ColumnData::Category {
                indices,
                dictionary,
            } => match Self::category_label(indices, dictionary, row) {
                Some(label) => Some(label.to_owned()),
                None => missing.string.clone(),
            },
        }
    }

    /// Same as [`ColumnData::get_string`], borrowing where the column already holds text.
    pub fn get_text<'a>(&'a self, row: usize, missing: &'a MissingValues) -> Option<Cow<'a, str>> {
        match self {
            ColumnData::Str(v) => v[row].as_deref().map(Cow::Borrowed),
            ColumnData::Category { .. } => self
                .get_str(row)
                .or(missing.string.as_deref())
                .map(Cow::Borrowed),
            _ => self.get_string(row, missing).map(Cow::Owned),
        }
    }

    /// Borrowed text for string-like columns; `None` for numeric columns.
    pub fn get_str(&self, row: usize) -> Option<&str> {
        match self {
            ColumnData::Str(v) => v[row].as_deref(),
            ColumnData::Category {
                indices,
                dictionary,
            } => Self::category_label(indices, dictionary, row),
            _ => None,
        }
    }

    pub fn get_int(&self, row: usize, missing: &MissingValues) -> i32 {
        match self {
            ColumnData::Int(v) => v[row],
            // Category columns expose their raw dictionary index.
            ColumnData::Category { indices, .. } => indices[row],
            ColumnData::Long(v) => v[row] as i32,
            ColumnData::Float(v) => float_to_int(v[row] as f64, missing.int),
            ColumnData::Double(v) => float_to_int(v[row], missing.int),
            ColumnData::Str(v) => {
                parse_opt_int(v[row].as_deref(), missing.string.as_deref(), missing.int)
            }
        }
    }

    pub fn get_long(&self, row: usize, missing: &MissingValues) -> i64 {
        match self {
            ColumnData::Long(v) => v[row],
            ColumnData::Int(v) => v[row] as i64,
            ColumnData::Float(v) => float_to_long(v[row] as f64, missing.long),
            ColumnData::Double(v) => float_to_long(v[row], missing.long),
            ColumnData::Str(_) | ColumnData::Category { .. } => {
                parse_opt_long(self.get_str(row), missing.string.as_deref(), missing.long)
            }
        }
    }

    pub fn get_float(&self, row: usize, missing: &MissingValues) -> f32 {
        match self {
            ColumnData::Float(v) => v[row],
            ColumnData::Int(v) => v[row] as f32,
            ColumnData::Long(v) => v[row] as f32,
            ColumnData::Double(v) => v[row] as f32,
            ColumnData::Str(_) | ColumnData::Category { .. } => {
                parse_opt_float(self.get_str(row), missing.string.as_deref(), missing.float)
            }
        }
    }

    pub fn get_double(&self, row: usize, missing: &MissingValues) -> f64 {
        match self {
            ColumnData::Double(v) => v[row],
            ColumnData::Int(v) => v[row] as f64,
            ColumnData::Long(v) => v[row] as f64,
            ColumnData::Float(v) => v[row] as f64,
            ColumnData::Str(_) | ColumnData::Category { .. } => {
                parse_opt_double(self.get_str(row), missing.string.as_deref(), missing.double)
            }
        }
    }

    /// Store text, parsing it into the column's representation. Never fails: unparseable text
    /// becomes the missing value.
    pub fn set_text(&mut self, row: usize, text: Option<&str>, missing: &MissingValues) {
        let missing_string = missing.string.as_deref();
        match self {
            ColumnData::Str(v) => v[row] = text.map(str::to_owned),
            ColumnData::Int(v) => v[row] = parse_opt_int(text, missing_string, missing.int),
            ColumnData::Long(v) => v[row] = parse_opt_long(text, missing_string, missing.long),
            ColumnData::Float(v) => v[row] = parse_opt_float(text, missing_string, missing.float),
            ColumnData::Double(v) => {
                v[row] = parse_opt_double(text, missing_string, missing.double)
            }
            ColumnData::Category {
                indices,
                dictionary,
            } => {
                indices[row] = match text {
                    Some(label) => dictionary.index(label),
                    None => missing.category,
                }
            }
        }
    }

    /// Store a value; exact type matches are stored directly, everything else goes through
    /// [`ColumnData::set_text`].
    pub fn set_value(&mut self, row: usize, value: &Value, missing: &MissingValues) {
        match (self, value) {
            (ColumnData::Int(v), Value::Int(x)) => v[row] = *x,
            (ColumnData::Long(v), Value::Long(x)) => v[row] = *x,
            (ColumnData::Float(v), Value::Float(x)) => v[row] = *x,
            (ColumnData::Double(v), Value::Double(x)) => v[row] = *x,
            (ColumnData::Str(v), Value::String(s)) => v[row] = Some(s.clone()),
            (column, value) => column.set_text(row, value.to_text().as_deref(), missing),
        }
    }

    /// Text of a stored cell, or `None` when the cell holds the missing value.
    ///
    /// Unlike [`ColumnData::get_string`], missing cells never turn into the missing-string text.
    pub(crate) fn stored_text(&self, row: usize) -> Option<String> {
        match self {
            ColumnData::Str(v) => v[row].clone(),
            ColumnData::Int(v) => Some(v[row].to_string()),
            ColumnData::Long(v) => Some(v[row].to_string()),
            ColumnData::Float(v) if v[row].is_nan() => None,
            ColumnData::Double(v) if v[row].is_nan() => None,
            ColumnData::Float(v) => Some(v[row].to_string()),
            ColumnData::Double(v) => Some(v[row].to_string()),
            ColumnData::Category { .. } => self.get_str(row).map(str::to_owned),
        }
    }

    /// Re-encode every entry into `column_type` through its text form.
    ///
    /// Missing cells stay missing in the new representation.
    pub fn convert(&self, column_type: ColumnType, missing: &MissingValues) -> Self {
        let len = self.len();
        let mut out = ColumnData::new(column_type, len, missing);
        for row in 0..len {
            let text = self.stored_text(row);
            out.set_text(row, text.as_deref(), missing);
        }
        out
    }

    /// Ordering of two rows by this column's native type.
    ///
    /// Floats use a proper three-way comparison with NaN after every number; strings and
    /// category labels compare case-insensitively with missing values first.
    pub fn compare_rows(&self, a: usize, b: usize) -> Ordering {
        match self {
            ColumnData::Int(v) => v[a].cmp(&v[b]),
            ColumnData::Long(v) => v[a].cmp(&v[b]),
            ColumnData::Float(v) => compare_floats(v[a] as f64, v[b] as f64),
            ColumnData::Double(v) => compare_floats(v[a], v[b]),
            ColumnData::Str(_) | ColumnData::Category { .. } => {
                compare_text(self.get_str(a), self.get_str(b))
            }
        }
    }
}

fn compare_floats(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn compare_text(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a
            .chars()
            .flat_map(char::to_lowercase)
            .cmp(b.chars().flat_map(char::to_lowercase)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_columns_are_filled_with_missing_values() {
        let missing = MissingValues::default();
        let col = ColumnData::new(ColumnType::Double, 3, &missing);
        assert_eq!(col.len(), 3);
        assert!(col.get_double(2, &missing).is_nan());

        let col = ColumnData::new(ColumnType::Category, 2, &missing);
        assert_eq!(col.get_string(0, &missing), None);
        assert_eq!(col.get_int(0, &missing), -1);
    }

    #[test]
    fn expand_doubles_capacity() {
        let mut v: Vec<i32> = Vec::with_capacity(8);
        expand(&mut v, 9);
        assert!(v.capacity() >= 16);
        expand(&mut v, 100);
        assert!(v.capacity() >= 100);
    }

    #[test]
    fn convert_goes_through_text() {
        let missing = MissingValues::default();
        let mut col = ColumnData::new(ColumnType::String, 3, &missing);
        col.set_text(0, Some("3"), &missing);
        col.set_text(1, Some("not-a-number"), &missing);

        let ints = col.convert(ColumnType::Int, &missing);
        assert_eq!(ints.get_int(0, &missing), 3);
        assert_eq!(ints.get_int(1, &missing), missing.int);
        assert_eq!(ints.get_int(2, &missing), missing.int);

        let cats = col.convert(ColumnType::Category, &missing);
        assert_eq!(cats.get_string(1, &missing).as_deref(), Some("not-a-number"));
        assert_eq!(cats.get_string(2, &missing), None);
    }

    #[test]
    fn nan_reads_as_missing_text() {
        let missing = MissingValues {
            string: Some("NA".to_owned()),
            ..MissingValues::default()
        };
        let col = ColumnData::new(ColumnType::Float, 1, &missing);
        assert_eq!(col.get_string(0, &missing).as_deref(), Some("NA"));
    }

    #[test]
    fn missing_cells_survive_conversion() {
        let missing = MissingValues {
            string: Some("NA".to_owned()),
            ..MissingValues::default()
        };
        let mut col = ColumnData::new(ColumnType::Double, 2, &missing);
        col.set_text(0, Some("1.5"), &missing);

        let cats = col.convert(ColumnType::Category, &missing);
        assert_eq!(cats.get_int(1, &missing), missing.category);
        assert_eq!(cats.dictionary().map(CategoryDictionary::len), Some(1));

        let text = col.convert(ColumnType::String, &missing);
        assert_eq!(text.get_str(0), Some("1.5"));
        assert_eq!(text.get_str(1), None);

        let back = cats.convert(ColumnType::Double, &missing);
        assert!(back.get_double(1, &missing).is_nan());
    }

    #[test]
    fn float_ordering_puts_nan_last() {
        assert_eq!(compare_floats(f64::NAN, 1.0), Ordering::Greater);
        assert_eq!(compare_floats(-1e300, 1e300), Ordering::Less);
    }

    #[test]
    fn text_ordering_ignores_case() {
        assert_eq!(compare_text(Some("apple"), Some("Banana")), Ordering::Less);
        assert_eq!(compare_text(Some("ABC"), Some("abc")), Ordering::Equal);
        assert_eq!(compare_text(None, Some("a")), Ordering::Less);
    }
}
