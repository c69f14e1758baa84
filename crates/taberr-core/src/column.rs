use std::fmt;

use chrono::NaiveDateTime;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dtype::DataType;
use crate::error::{Error, Result};
use crate::value::Value;

/// Reference to a column, either by name or by zero-based position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Index(index) => write!(f, "#{index}"),
            ColumnRef::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for ColumnRef {
    fn from(value: &str) -> Self {
        ColumnRef::Name(value.to_string())
    }
}

impl From<String> for ColumnRef {
    fn from(value: String) -> Self {
        ColumnRef::Name(value)
    }
}

impl From<&String> for ColumnRef {
    fn from(value: &String) -> Self {
        ColumnRef::Name(value.clone())
    }
}

impl From<usize> for ColumnRef {
    fn from(value: usize) -> Self {
        ColumnRef::Index(value)
    }
}

/// A named, typed column of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ColumnParts")]
pub struct Column {
    pub name: String,
    pub dtype: DataType,
    pub values: Vec<Value>,
}

/// Wire shape of a column. Datetimes travel as strings and are parsed back
/// using the declared dtype.
#[derive(Deserialize)]
struct ColumnParts {
    name: String,
    dtype: DataType,
    values: Vec<Value>,
}

impl TryFrom<ColumnParts> for Column {
    type Error = Error;

    fn try_from(raw: ColumnParts) -> Result<Self> {
        let mut values = raw.values;
        if raw.dtype == DataType::DateTime {
            for value in &mut values {
                if let Value::Text(text) = value {
                    let parsed = parse_datetime(text).ok_or_else(|| {
                        Error::Cast(format!(
                            "column {}: {text:?} is not a datetime",
                            raw.name
                        ))
                    })?;
                    *value = Value::DateTime(parsed);
                }
            }
        }
        Ok(Self {
            name: raw.name,
            dtype: raw.dtype,
            values,
        })
    }
}

/// Parse the ISO form serde writes, or the space separated form `Display` writes.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    text.parse::<NaiveDateTime>()
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").ok())
}

impl Column {
    /// Build a column and infer its dtype from the values.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        let dtype = DataType::infer(&values, None);
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    /// Build a column with an explicit dtype.
    pub fn with_dtype(name: impl Into<String>, dtype: DataType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    pub fn ints(name: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        Self::with_dtype(
            name,
            DataType::Int,
            values.into_iter().map(Value::Int).collect(),
        )
    }

    pub fn floats(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::with_dtype(
            name,
            DataType::Float,
            values.into_iter().map(Value::Float).collect(),
        )
    }

    pub fn bools(name: impl Into<String>, values: impl IntoIterator<Item = bool>) -> Self {
        Self::with_dtype(
            name,
            DataType::Bool,
            values.into_iter().map(Value::Bool).collect(),
        )
    }

    pub fn texts<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::with_dtype(
            name,
            DataType::Text,
            values
                .into_iter()
                .map(|value| Value::Text(value.into()))
                .collect(),
        )
    }

    pub fn categorical<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::with_dtype(
            name,
            DataType::Categorical,
            values
                .into_iter()
                .map(|value| Value::Text(value.into()))
                .collect(),
        )
    }

    pub fn datetimes(
        name: impl Into<String>,
        values: impl IntoIterator<Item = NaiveDateTime>,
    ) -> Self {
        Self::with_dtype(
            name,
            DataType::DateTime,
            values.into_iter().map(Value::DateTime).collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Non-null numeric values as floats, in row order.
    pub fn numeric_values(&self) -> Vec<f64> {
        self.values.iter().filter_map(Value::as_f64).collect()
    }
}
