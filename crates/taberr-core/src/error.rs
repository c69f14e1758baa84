use thiserror::Error;

/// Core error type shared across taberr crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A column name did not match any column of the table.
    #[error("column '{0}' not found")]
    ColumnNotFound(String),
    /// A positional column reference was past the last column.
    #[error("column index {index} out of range for table with {columns} column(s)")]
    ColumnIndexOutOfRange { index: usize, columns: usize },
    /// The table violates internal invariants.
    #[error("invalid table: {0}")]
    InvalidTable(String),
    /// Two shapes that must agree do not.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    /// A value could not be converted to the requested type.
    #[error("cast error: {0}")]
    Cast(String),
}

/// Convenience alias for results returned by taberr crates.
pub type Result<T> = std::result::Result<T, Error>;
