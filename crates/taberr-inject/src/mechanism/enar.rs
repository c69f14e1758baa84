use rand_chacha::ChaCha8Rng;
use tracing::warn;

use taberr_core::{ColumnRef, Table};
use taberr_plan::MechanismKind;

use super::{ErrorMechanism, sorted_block};
use crate::errors::Result;

/// Errors not at random: a contiguous block of the column's own sort order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enar {
    /// Ignored, the column always conditions on itself.
    pub condition_to_column: Option<ColumnRef>,
    pub seed: Option<u64>,
}

impl Enar {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            condition_to_column: None,
            seed,
        }
    }
}

impl ErrorMechanism for Enar {
    fn kind(&self) -> MechanismKind {
        MechanismKind::Enar
    }

    fn condition_to_column(&self) -> Option<&ColumnRef> {
        self.condition_to_column.as_ref()
    }

    fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn select_rows(
        &self,
        table: &Table,
        target: usize,
        free_rows: &[usize],
        n_errors: usize,
        rng: &mut ChaCha8Rng,
    ) -> Result<Vec<usize>> {
        if let Some(condition) = &self.condition_to_column {
            warn!(
                condition = %condition,
                "ENAR conditions on the target column itself, condition_to_column is ignored"
            );
        }
        sorted_block(table, target, free_rows, n_errors, rng)
    }
}
