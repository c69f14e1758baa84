use rand::seq::index;
use rand_chacha::ChaCha8Rng;
use tracing::warn;

use taberr_core::{ColumnRef, Table};
use taberr_plan::MechanismKind;

use super::ErrorMechanism;
use crate::errors::Result;

/// Errors completely at random: a uniform draw without replacement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ecar {
    /// Ignored, kept so a configured value can be reported.
    pub condition_to_column: Option<ColumnRef>,
    pub seed: Option<u64>,
}

impl Ecar {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            condition_to_column: None,
            seed,
        }
    }
}

impl ErrorMechanism for Ecar {
    fn kind(&self) -> MechanismKind {
        MechanismKind::Ecar
    }

    fn condition_to_column(&self) -> Option<&ColumnRef> {
        self.condition_to_column.as_ref()
    }

    fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn select_rows(
        &self,
        _table: &Table,
        _target: usize,
        free_rows: &[usize],
        n_errors: usize,
        rng: &mut ChaCha8Rng,
    ) -> Result<Vec<usize>> {
        if let Some(condition) = &self.condition_to_column {
            warn!(
                condition = %condition,
                "ECAR does not condition on other columns, condition_to_column is ignored"
            );
        }
        Ok(index::sample(rng, free_rows.len(), n_errors)
            .into_iter()
            .map(|position| free_rows[position])
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::capture_logs;
    use taberr_core::{Column, ErrorMask};

    #[test]
    fn selects_only_free_rows() {
        let table = Table::new(vec![Column::ints("A", 0..20)]).expect("valid table");
        let mut mask = ErrorMask::for_table(&table);
        for row in 0..10 {
            mask.column_mut(0)[row] = true;
        }

        let sampled = Ecar::new(Some(5))
            .sample(&table, &ColumnRef::Index(0), 0.5, &mask)
            .expect("sample");
        assert_eq!(sampled.count_column(0), 20);
        assert_eq!(mask.count_column(0), 10);
    }

    #[test]
    fn seed_makes_selection_reproducible() {
        let table = Table::new(vec![Column::ints("A", 0..50)]).expect("valid table");
        let mask = ErrorMask::for_table(&table);
        let first = Ecar::new(Some(9))
            .sample(&table, &"A".into(), 0.2, &mask)
            .expect("sample");
        let second = Ecar::new(Some(9))
            .sample(&table, &"A".into(), 0.2, &mask)
            .expect("sample");
        assert_eq!(first, second);
        assert_eq!(first.count_column(0), 10);
    }

    #[test]
    fn condition_column_is_reported_and_ignored() {
        let table = Table::new(vec![Column::ints("A", 0..20), Column::ints("B", 0..20)])
            .expect("valid table");
        let mask = ErrorMask::for_table(&table);
        let conditioned = Ecar {
            condition_to_column: Some("B".into()),
            seed: Some(3),
        };

        let (sampled, logged) =
            capture_logs(|| conditioned.sample(&table, &"A".into(), 0.25, &mask));
        let sampled = sampled.expect("sample");
        let plain = Ecar::new(Some(3))
            .sample(&table, &"A".into(), 0.25, &mask)
            .expect("sample");

        assert!(logged.contains("ECAR does not condition on other columns"));
        assert_eq!(sampled, plain);
    }
}
