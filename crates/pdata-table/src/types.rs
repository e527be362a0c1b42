use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TableError;

/// Declared primitive representation of a table column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    #[serde(rename = "String")]
    String,
    Int,
    Long,
    Float,
    Double,
    /// Low-cardinality strings stored as indices into a per-column dictionary.
    Category,
}

impl ColumnType {
    pub const ALL: [ColumnType; 6] = [
        ColumnType::String,
        ColumnType::Int,
        ColumnType::Long,
        ColumnType::Float,
        ColumnType::Double,
        ColumnType::Category,
    ];

    /// Tag used by the binary snapshot format.
    pub(crate) fn tag(self) -> u8 {
        match self {
            ColumnType::String => 0,
            ColumnType::Int => 1,
            ColumnType::Long => 2,
            ColumnType::Float => 3,
            ColumnType::Double => 4,
            ColumnType::Category => 5,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        ColumnType::ALL.get(tag as usize).copied()
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ColumnType::Int | ColumnType::Long | ColumnType::Float | ColumnType::Double
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColumnType::String => "String",
            ColumnType::Int => "int",
            ColumnType::Long => "long",
            ColumnType::Float => "float",
            ColumnType::Double => "double",
            ColumnType::Category => "category",
        })
    }
}

impl FromStr for ColumnType {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(ColumnType::String),
            "int" => Ok(ColumnType::Int),
            "long" => Ok(ColumnType::Long),
            "float" => Ok(ColumnType::Float),
            "double" => Ok(ColumnType::Double),
            "category" | "categorical" => Ok(ColumnType::Category),
            _ => Err(TableError::InvalidColumnType(s.to_owned())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: Option<String>,
    pub column_type: ColumnType,
}

/// A single cell value handed to the row-oriented setters.
///
/// Values that don't match the destination column's type are converted through their
/// text form; anything that fails to parse becomes the column's missing value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Missing,
    String(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl Value {
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Missing => None,
            Value::String(s) => Some(s.clone()),
            Value::Int(v) => Some(v.to_string()),
            Value::Long(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::Double(v) => Some(v.to_string()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Missing)
    }
}

/// Values substituted for cells that were never written or failed to parse.
///
/// Numeric sentinels share their domain with real data: a stored `0` in an int column is
/// indistinguishable from a missing one, and likewise `NaN` for float columns.
#[derive(Clone, Debug, PartialEq)]
pub struct MissingValues {
    pub string: Option<String>,
    pub int: i32,
    pub long: i64,
    pub float: f32,
    pub double: f64,
    pub category: i32,
}

impl Default for MissingValues {
    fn default() -> Self {
        Self {
            string: None,
            int: 0,
            long: 0,
            float: f32::NAN,
            double: f64::NAN,
            category: -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_type_names_parse_case_insensitively() {
        assert_eq!("String".parse::<ColumnType>().unwrap(), ColumnType::String);
        assert_eq!("INT".parse::<ColumnType>().unwrap(), ColumnType::Int);
        assert_eq!(
            "categorical".parse::<ColumnType>().unwrap(),
            ColumnType::Category
        );
        assert!(matches!(
            "decimal".parse::<ColumnType>(),
            Err(TableError::InvalidColumnType(name)) if name == "decimal"
        ));
    }

    #[test]
    fn tags_are_dense() {
        for ty in ColumnType::ALL {
            assert_eq!(ColumnType::from_tag(ty.tag()), Some(ty));
        }
        assert_eq!(ColumnType::from_tag(6), None);
    }

    #[test]
    fn option_values_map_none_to_missing() {
        assert_eq!(Value::from(None::<i32>), Value::Missing);
        assert_eq!(Value::from(Some("x")), Value::String("x".to_owned()));
    }
}
