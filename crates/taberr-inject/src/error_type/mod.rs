//! Error types decide how a selected cell changes.
//!
//! `apply` checks that the column dtype fits the error type, validates the
//! config, then hands the flagged rows to `transform`, which returns a full
//! copy of the column values with only those rows changed.

mod add_delta;
mod category_swap;
mod clipping;
mod extraneous;
mod missing;
mod mistype;
mod mojibake;
mod outlier;
mod permutate;
mod replace;
mod typo;
mod wrong_unit;

use std::fmt;

use rand_chacha::ChaCha8Rng;
use tracing::debug;

use taberr_core::{Column, ColumnRef, ErrorMask, Table, Value};
use taberr_plan::{ErrorTypeConfig, ErrorTypeSpec};

use crate::errors::{InjectError, Result};
use crate::rng::seeded_rng;

pub use add_delta::AddDelta;
pub use category_swap::CategorySwap;
pub use clipping::Clipping;
pub use extraneous::Extraneous;
pub use missing::MissingValue;
pub use mistype::Mistype;
pub use mojibake::Mojibake;
pub use outlier::Outlier;
pub use permutate::Permutate;
pub use replace::Replace;
pub use typo::Typo;
pub use wrong_unit::WrongUnit;

/// Value transformation applied to the flagged cells of one column.
pub trait ErrorType: fmt::Debug + Send + Sync {
    /// Config this error type was built from.
    fn config(&self) -> ErrorTypeConfig;

    fn seed(&self) -> Option<u64>;

    /// Return the column values with `rows` transformed. `rows` is never
    /// empty and lists row indices in ascending order.
    fn transform(
        &self,
        column: &Column,
        rows: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Result<Vec<Value>>;

    fn name(&self) -> &'static str {
        self.config().name()
    }

    /// Fail when the column dtype is not one this error type handles.
    fn check_type(&self, column_ref: &ColumnRef, column: &Column) -> Result<()> {
        if self.config().supports(column.dtype) {
            Ok(())
        } else {
            Err(InjectError::IncompatibleType {
                column: column_ref.clone(),
                dtype: column.dtype,
                error_type: self.name(),
            })
        }
    }

    /// Transform the cells of `column` flagged in `error_mask`. The table is
    /// not modified.
    fn apply(&self, table: &Table, error_mask: &ErrorMask, column: &ColumnRef) -> Result<Vec<Value>> {
        let index = table.resolve(column)?;
        error_mask.ensure_matches(table)?;
        let target = table.column_at(index)?;

        self.check_type(column, target)?;
        self.config().validate()?;

        let rows = error_mask.flagged_rows(index);
        if rows.is_empty() {
            return Ok(target.values.clone());
        }

        let mut rng = seeded_rng(self.seed());
        let values = self.transform(target, &rows, &mut rng)?;
        debug!(
            column = %column,
            error_type = self.name(),
            cells = rows.len(),
            "error type applied"
        );
        Ok(values)
    }
}

/// Build the error type a plan entry describes.
pub fn error_type_from_spec(spec: &ErrorTypeSpec) -> Box<dyn ErrorType> {
    let seed = spec.seed;
    match spec.config.clone() {
        ErrorTypeConfig::MissingValue(config) => Box::new(MissingValue { config, seed }),
        ErrorTypeConfig::AddDelta(config) => Box::new(AddDelta { config, seed }),
        ErrorTypeConfig::Outlier(config) => Box::new(Outlier { config, seed }),
        ErrorTypeConfig::Mistype(config) => Box::new(Mistype { config, seed }),
        ErrorTypeConfig::Mojibake(config) => Box::new(Mojibake { config, seed }),
        ErrorTypeConfig::Permutate(config) => Box::new(Permutate { config, seed }),
        ErrorTypeConfig::Replace(config) => Box::new(Replace { config, seed }),
        ErrorTypeConfig::Extraneous(config) => Box::new(Extraneous { config, seed }),
        ErrorTypeConfig::WrongUnit(config) => Box::new(WrongUnit { config, seed }),
        ErrorTypeConfig::Clipping(config) => Box::new(Clipping { config, seed }),
        ErrorTypeConfig::Typo(config) => Box::new(Typo { config, seed }),
        ErrorTypeConfig::CategorySwap(config) => Box::new(CategorySwap { config, seed }),
    }
}

/// Copy of the column values with `change` applied to each flagged row.
/// Rows for which `change` returns `None` keep their value.
fn map_rows(
    column: &Column,
    rows: &[usize],
    mut change: impl FnMut(&Value) -> Result<Option<Value>>,
) -> Result<Vec<Value>> {
    let mut values = column.values.clone();
    for &row in rows {
        if let Some(changed) = change(&values[row])? {
            values[row] = changed;
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taberr_core::Column;
    use taberr_plan::{MissingValueConfig, MojibakeConfig};

    #[test]
    fn incompatible_dtype_is_rejected_before_transform() {
        let table = Table::new(vec![Column::ints("A", [1, 2, 3])]).expect("valid table");
        let mut mask = ErrorMask::for_table(&table);
        mask.column_mut(0)[0] = true;

        let error_type = error_type_from_spec(&ErrorTypeSpec::new(ErrorTypeConfig::Mojibake(
            MojibakeConfig::default(),
        )));
        let result = error_type.apply(&table, &mask, &"A".into());
        assert!(matches!(
            result,
            Err(InjectError::IncompatibleType {
                error_type: "mojibake",
                ..
            })
        ));
    }

    #[test]
    fn empty_mask_returns_values_unchanged() {
        let table = Table::new(vec![Column::texts("A", ["x", "y"])]).expect("valid table");
        let mask = ErrorMask::for_table(&table);
        let error_type = error_type_from_spec(&ErrorTypeSpec::new(ErrorTypeConfig::MissingValue(
            MissingValueConfig::default(),
        )));
        let values = error_type
            .apply(&table, &mask, &ColumnRef::Index(0))
            .expect("apply");
        assert_eq!(values, table.columns()[0].values);
    }
}
