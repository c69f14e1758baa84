use taberr_core::{ColumnRef, ErrorMask, Table};

use crate::error_type::ErrorType;
use crate::errors::Result;
use crate::mechanism::ErrorMechanism;

/// Corrupt one column with one mechanism and one error type.
///
/// Returns a corrupted copy of `table` and the mask of changed cells. The
/// input table is never modified, also when an error is returned.
pub fn create_errors(
    table: &Table,
    column: &ColumnRef,
    error_rate: f64,
    mechanism: &dyn ErrorMechanism,
    error_type: &dyn ErrorType,
) -> Result<(Table, ErrorMask)> {
    let error_mask = ErrorMask::for_table(table);
    let error_mask = mechanism.sample(table, column, error_rate, &error_mask)?;
    let values = error_type.apply(table, &error_mask, column)?;

    let mut dirty = table.clone();
    dirty.set_column(column, values)?;
    Ok((dirty, error_mask))
}
