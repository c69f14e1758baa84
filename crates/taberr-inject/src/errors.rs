use thiserror::Error;

use taberr_core::{ColumnRef, DataType};

/// Errors emitted by the injection engine.
#[derive(Debug, Error)]
pub enum InjectError {
    /// Missing or invalid configuration, raised before any cell changes.
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(
        "column '{column}' has {available} error-free cells but {requested} errors were requested"
    )]
    Capacity {
        column: ColumnRef,
        requested: usize,
        available: usize,
    },
    #[error("{error_type} cannot be applied to column '{column}' of dtype {dtype}")]
    IncompatibleType {
        column: ColumnRef,
        dtype: DataType,
        error_type: &'static str,
    },
    #[error(transparent)]
    Core(#[from] taberr_core::Error),
    #[error(transparent)]
    Plan(#[from] taberr_plan::PlanError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("logging error: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, InjectError>;
