//! Core contracts and helpers for taberr.
//!
//! This crate defines the tabular container the error-injection engine works
//! on: scalar values, column dtypes, column references, the table itself and
//! the boolean error mask that mirrors its shape.

pub mod column;
pub mod dtype;
pub mod error;
pub mod mask;
pub mod stats;
pub mod table;
pub mod value;

pub use column::{Column, ColumnRef, parse_datetime};
pub use dtype::DataType;
pub use error::{Error, Result};
pub use mask::{ErrorMask, error_count};
pub use table::Table;
pub use value::Value;
