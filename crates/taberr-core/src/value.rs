use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDateTime;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dtype::DataType;

/// A single cell of a table.
///
/// `Null` is the universal missing marker: every dtype can hold it and it is
/// what `MissingValue` writes when no sentinel is configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Dtype of the scalar, `None` for `Null`.
    pub fn kind(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(DataType::Bool),
            Value::Int(_) => Some(DataType::Int),
            Value::Float(_) => Some(DataType::Float),
            Value::Text(_) => Some(DataType::Text),
            Value::DateTime(_) => Some(DataType::DateTime),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(value) => Some(*value),
            _ => None,
        }
    }

    /// Build a numeric value shaped like `like`: integers stay integers while
    /// the result is integral and representable, everything else is a float.
    pub fn numeric_like(like: &Value, result: f64) -> Value {
        if matches!(like, Value::Int(_))
            && result.fract() == 0.0
            && result >= i64::MIN as f64
            && result < i64::MAX as f64
        {
            Value::Int(result as i64)
        } else {
            Value::Float(result)
        }
    }

    /// Add `delta` to a numeric value. Returns `None` for non-numeric cells.
    pub fn offset_by(&self, delta: f64) -> Option<Value> {
        match self {
            Value::Int(value) if delta.fract() == 0.0 && delta.abs() < i64::MAX as f64 => {
                Some(match value.checked_add(delta as i64) {
                    Some(sum) => Value::Int(sum),
                    None => Value::Float(*value as f64 + delta),
                })
            }
            Value::Int(value) => Some(Value::Float(*value as f64 + delta)),
            Value::Float(value) => Some(Value::Float(value + delta)),
            _ => None,
        }
    }

    /// Apply `value * factor + offset` to a numeric value.
    pub fn scaled(&self, factor: f64, offset: f64) -> Option<Value> {
        let value = self.as_f64()?;
        Some(Value::numeric_like(self, value * factor + offset))
    }

    /// Equality that treats two NaN floats as the same cell.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Float(left), Value::Float(right)) if left.is_nan() && right.is_nan() => true,
            _ => self == other,
        }
    }

    /// Total order used when sorting a column: booleans, numbers, timestamps,
    /// text, and nulls last.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Bool(left), Value::Bool(right)) => left.cmp(right),
            (Value::Text(left), Value::Text(right)) => left.cmp(right),
            (Value::DateTime(left), Value::DateTime(right)) => left.cmp(right),
            (Value::Int(left), Value::Int(right)) => left.cmp(right),
            (left, right) => match (left.as_f64(), right.as_f64()) {
                (Some(left), Some(right)) => left.total_cmp(&right),
                _ => left.sort_rank().cmp(&right.sort_rank()),
            },
        }
    }

    fn sort_rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Int(_) | Value::Float(_) => 1,
            Value::DateTime(_) => 2,
            Value::Text(_) => 3,
            Value::Null => 4,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value:?}"),
            Value::Text(value) => f.write_str(value),
            Value::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
