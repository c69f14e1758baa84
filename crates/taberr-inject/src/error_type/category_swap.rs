use rand::seq::IndexedRandom;
use rand_chacha::ChaCha8Rng;

use taberr_core::{Column, Value};
use taberr_plan::{CategorySwapConfig, ErrorTypeConfig};

use super::{ErrorType, map_rows};
use crate::errors::{InjectError, Result};

/// Replaces flagged cells with another category observed in the column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorySwap {
    pub config: CategorySwapConfig,
    pub seed: Option<u64>,
}

impl ErrorType for CategorySwap {
    fn config(&self) -> ErrorTypeConfig {
        ErrorTypeConfig::CategorySwap(self.config.clone())
    }

    fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn transform(
        &self,
        column: &Column,
        rows: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Result<Vec<Value>> {
        let mut categories: Vec<&Value> = column
            .values
            .iter()
            .filter(|value| !value.is_null())
            .collect();
        categories.sort_by(|left, right| left.sort_cmp(right));
        categories.dedup();
        if categories.len() < 2 {
            return Err(InjectError::Config(format!(
                "column '{}' needs at least two categories to swap between",
                column.name
            )));
        }

        map_rows(column, rows, |value| {
            let others: Vec<&Value> = categories
                .iter()
                .copied()
                .filter(|category| *category != value)
                .collect();
            Ok(others.choose(rng).map(|category| (*category).clone()))
        })
    }
}
