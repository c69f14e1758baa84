use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Element type of a column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Bool,
    Int,
    Float,
    Text,
    /// Text restricted to a small set of categories. Only set explicitly.
    Categorical,
    DateTime,
    /// Mixed values; the end of the line for type degradation.
    Object,
}

impl DataType {
    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Int | DataType::Float)
    }

    pub fn is_string(self) -> bool {
        matches!(self, DataType::Text)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Bool => "bool",
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Text => "text",
            DataType::Categorical => "categorical",
            DataType::DateTime => "datetime",
            DataType::Object => "object",
        }
    }

    /// Infer the dtype of `values`, keeping `previous` when the values still fit it.
    pub fn infer(values: &[Value], previous: Option<DataType>) -> DataType {
        let mut inferred: Option<DataType> = None;
        for kind in values.iter().filter_map(Value::kind) {
            inferred = Some(match inferred {
                None => kind,
                Some(current) if current == kind => current,
                Some(DataType::Int) if kind == DataType::Float => DataType::Float,
                Some(DataType::Float) if kind == DataType::Int => DataType::Float,
                Some(_) => return DataType::Object,
            });
        }

        match (inferred, previous) {
            (None, Some(previous)) => previous,
            (None, None) => DataType::Object,
            (Some(DataType::Text), Some(DataType::Categorical)) => DataType::Categorical,
            (Some(DataType::Text), Some(DataType::Object)) => DataType::Object,
            (Some(kind), _) => kind,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
