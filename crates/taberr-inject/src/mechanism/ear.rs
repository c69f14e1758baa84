use rand::seq::IndexedRandom;
use rand_chacha::ChaCha8Rng;
use tracing::warn;

use taberr_core::{ColumnRef, Table};
use taberr_plan::MechanismKind;

use super::{ErrorMechanism, sorted_block};
use crate::errors::{InjectError, Result};

/// Errors at random: a contiguous block of the rows sorted by another column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ear {
    /// Column to condition on; a random other column when unset.
    pub condition_to_column: Option<ColumnRef>,
    pub seed: Option<u64>,
}

impl Ear {
    pub fn new(condition_to_column: Option<ColumnRef>, seed: Option<u64>) -> Self {
        Self {
            condition_to_column,
            seed,
        }
    }
}

impl ErrorMechanism for Ear {
    fn kind(&self) -> MechanismKind {
        MechanismKind::Ear
    }

    fn condition_to_column(&self) -> Option<&ColumnRef> {
        self.condition_to_column.as_ref()
    }

    fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn needs_other_column(&self) -> bool {
        true
    }

    fn select_rows(
        &self,
        table: &Table,
        target: usize,
        free_rows: &[usize],
        n_errors: usize,
        rng: &mut ChaCha8Rng,
    ) -> Result<Vec<usize>> {
        let condition = match &self.condition_to_column {
            Some(column) => table.resolve(column)?,
            None => {
                let others: Vec<usize> = (0..table.n_columns())
                    .filter(|index| *index != target)
                    .collect();
                let picked = *others.choose(rng).ok_or_else(|| {
                    InjectError::Config(
                        "EAR needs at least two columns to condition on another column"
                            .to_string(),
                    )
                })?;
                warn!(
                    column = %table.columns()[target].name,
                    condition = %table.columns()[picked].name,
                    "EAR has no condition_to_column, picked one at random"
                );
                picked
            }
        };

        sorted_block(table, condition, free_rows, n_errors, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::capture_logs;
    use taberr_core::{Column, ErrorMask};

    #[test]
    fn single_column_tables_are_rejected() {
        let table = Table::new(vec![Column::ints("A", 0..10)]).expect("valid table");
        let mask = ErrorMask::for_table(&table);
        let result = Ear::new(None, Some(1)).sample(&table, &"A".into(), 0.2, &mask);
        assert!(matches!(result, Err(InjectError::Config(_))));
    }

    #[test]
    fn single_column_check_runs_before_counting() {
        let table = Table::new(vec![Column::ints("A", 0..10)]).expect("valid table");
        let clean = ErrorMask::for_table(&table);

        // 0.05 of 10 rows is zero errors, still not a valid EAR setup.
        let result = Ear::new(None, Some(1)).sample(&table, &"A".into(), 0.05, &clean);
        assert!(matches!(result, Err(InjectError::Config(_))));

        let mut full = ErrorMask::for_table(&table);
        full.column_mut(0).iter_mut().for_each(|cell| *cell = true);
        let result = Ear::new(None, Some(1)).sample(&table, &"A".into(), 0.2, &full);
        assert!(matches!(result, Err(InjectError::Config(_))));
    }

    #[test]
    fn unknown_condition_column_fails() {
        let table = Table::new(vec![Column::ints("A", 0..10), Column::ints("B", 0..10)])
            .expect("valid table");
        let mask = ErrorMask::for_table(&table);
        let result =
            Ear::new(Some("Z".into()), Some(1)).sample(&table, &"A".into(), 0.2, &mask);
        assert!(matches!(result, Err(InjectError::Core(_))));
    }

    #[test]
    fn auto_selected_condition_is_reproducible() {
        let table = Table::new(vec![
            Column::ints("A", 0..30),
            Column::ints("B", (0..30).rev()),
            Column::floats("C", (0..30).map(|v| ((v * 7) % 30) as f64)),
        ])
        .expect("valid table");
        let mask = ErrorMask::for_table(&table);
        let first = Ear::new(None, Some(4))
            .sample(&table, &"A".into(), 0.2, &mask)
            .expect("sample");
        let second = Ear::new(None, Some(4))
            .sample(&table, &"A".into(), 0.2, &mask)
            .expect("sample");
        assert_eq!(first, second);
        assert_eq!(first.count_column(0), 6);
        assert_eq!(first.count_column(1) + first.count_column(2), 0);
    }

    #[test]
    fn random_condition_column_is_reported() {
        let table = Table::new(vec![Column::ints("A", 0..10), Column::ints("B", 0..10)])
            .expect("valid table");
        let mask = ErrorMask::for_table(&table);
        let (sampled, logged) =
            capture_logs(|| Ear::new(None, Some(2)).sample(&table, &"A".into(), 0.2, &mask));

        assert_eq!(sampled.expect("sample").count_column(0), 2);
        assert!(logged.contains("EAR has no condition_to_column, picked one at random"));
        assert!(logged.contains("condition=B"));
    }
}
