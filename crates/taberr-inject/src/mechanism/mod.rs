//! Error mechanisms decide which cells of a column become errors.
//!
//! Every mechanism selects among the cells that are still error-free in the
//! mask it receives, so models applied one after another never claim the
//! same cell twice.

mod ear;
mod ecar;
mod enar;

use std::fmt;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use taberr_core::{ColumnRef, ErrorMask, Table, error_count};
use taberr_plan::{MechanismKind, MechanismSpec};

use crate::errors::{InjectError, Result};
use crate::rng::seeded_rng;

pub use ear::Ear;
pub use ecar::Ecar;
pub use enar::Enar;

/// Sampling policy over the rows of one column.
pub trait ErrorMechanism: fmt::Debug + Send + Sync {
    fn kind(&self) -> MechanismKind;

    fn condition_to_column(&self) -> Option<&ColumnRef>;

    fn seed(&self) -> Option<u64>;

    /// Pick `n_errors` rows out of `free_rows`, the error-free rows of column
    /// `target` in ascending order. Only called with `n_errors <= free_rows.len()`
    /// and `n_errors > 0`.
    fn select_rows(
        &self,
        table: &Table,
        target: usize,
        free_rows: &[usize],
        n_errors: usize,
        rng: &mut ChaCha8Rng,
    ) -> Result<Vec<usize>>;

    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Whether selection orders rows by a column other than the target.
    fn needs_other_column(&self) -> bool {
        false
    }

    /// Return a copy of `error_mask` with `error_count(rows, error_rate)`
    /// additional cells flagged in `column`. That count is
    /// `floor(rows * error_rate + 1e-9)`, see [`error_count`].
    fn sample(
        &self,
        table: &Table,
        column: &ColumnRef,
        error_rate: f64,
        error_mask: &ErrorMask,
    ) -> Result<ErrorMask> {
        if !error_rate.is_finite() || !(0.0..=1.0).contains(&error_rate) {
            return Err(InjectError::Config(format!(
                "error_rate must be between 0 and 1, got {error_rate}"
            )));
        }
        if table.is_empty() {
            return Err(InjectError::Config("the table is empty".to_string()));
        }
        if (self.needs_other_column() || self.condition_to_column().is_some())
            && table.n_columns() < 2
        {
            return Err(InjectError::Config(format!(
                "{} needs at least two columns to condition on another column",
                self.name()
            )));
        }
        error_mask.ensure_matches(table)?;
        let target = table.resolve(column)?;

        let n_errors = error_count(table.n_rows(), error_rate);
        if n_errors == 0 {
            warn!(
                column = %column,
                mechanism = self.name(),
                error_rate,
                rows = table.n_rows(),
                "error rate yields zero errors"
            );
            return Ok(error_mask.clone());
        }

        let free_rows = error_mask.free_rows(target);
        if free_rows.len() < n_errors {
            return Err(InjectError::Capacity {
                column: column.clone(),
                requested: n_errors,
                available: free_rows.len(),
            });
        }

        let mut rng = seeded_rng(self.seed());
        let rows = self.select_rows(table, target, &free_rows, n_errors, &mut rng)?;

        let mut sampled = error_mask.clone();
        let cells = sampled.column_mut(target);
        for row in rows {
            cells[row] = true;
        }

        debug!(
            column = %column,
            mechanism = self.name(),
            n_errors,
            free = free_rows.len(),
            "rows sampled"
        );
        Ok(sampled)
    }
}

/// Build the mechanism a plan entry describes.
pub fn mechanism_from_spec(spec: &MechanismSpec) -> Box<dyn ErrorMechanism> {
    let condition_to_column = spec.condition_to_column.clone();
    match spec.mechanism {
        MechanismKind::Ecar => Box::new(Ecar {
            condition_to_column,
            seed: spec.seed,
        }),
        MechanismKind::Ear => Box::new(Ear {
            condition_to_column,
            seed: spec.seed,
        }),
        MechanismKind::Enar => Box::new(Enar {
            condition_to_column,
            seed: spec.seed,
        }),
    }
}

/// Order `free_rows` by the values of column `by` (stable) and return a
/// contiguous block of `n_errors` rows starting at a random position.
fn sorted_block(
    table: &Table,
    by: usize,
    free_rows: &[usize],
    n_errors: usize,
    rng: &mut ChaCha8Rng,
) -> Result<Vec<usize>> {
    let values = &table.column_at(by)?.values;
    let mut ordered = free_rows.to_vec();
    ordered.sort_by(|left, right| values[*left].sort_cmp(&values[*right]));

    let start = rng.random_range(0..=ordered.len() - n_errors);
    Ok(ordered[start..start + n_errors].to_vec())
}
