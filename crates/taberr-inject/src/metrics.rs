use serde::{Deserialize, Serialize};

use taberr_core::{ErrorMask, Table};

use crate::errors::{InjectError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetrics {
    pub column: String,
    /// Cells flagged in the mask.
    pub masked: usize,
    /// Cells whose value differs from the original.
    pub changed: usize,
    /// Changed cells the mask does not flag. Always zero for a sound run.
    pub changed_outside_mask: usize,
    pub masked_proportion: f64,
}

/// Comparison of a clean table, its dirty copy and the error mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetrics {
    pub columns: Vec<ColumnMetrics>,
    pub masked: usize,
    pub changed: usize,
    pub changed_outside_mask: usize,
    pub masked_proportion: f64,
}

impl ErrorMetrics {
    pub fn column(&self, name: &str) -> Option<&ColumnMetrics> {
        self.columns.iter().find(|metrics| metrics.column == name)
    }

    /// True when every change is flagged in the mask.
    pub fn is_consistent(&self) -> bool {
        self.changed_outside_mask == 0
    }
}

pub fn evaluate(original: &Table, dirty: &Table, mask: &ErrorMask) -> Result<ErrorMetrics> {
    if original.n_rows() != dirty.n_rows() || original.column_names() != dirty.column_names() {
        return Err(InjectError::Config(
            "dirty table does not have the shape of the original".to_string(),
        ));
    }
    mask.ensure_matches(original)?;

    let rows = original.n_rows();
    let mut columns = Vec::with_capacity(original.n_columns());
    for (index, (clean, corrupted)) in original.columns().iter().zip(dirty.columns()).enumerate() {
        let flags = mask.column(index);
        let mut changed = 0;
        let mut changed_outside_mask = 0;
        for (row, (before, after)) in clean.values.iter().zip(&corrupted.values).enumerate() {
            if !before.same_as(after) {
                changed += 1;
                if !flags[row] {
                    changed_outside_mask += 1;
                }
            }
        }
        let masked = mask.count_column(index);
        columns.push(ColumnMetrics {
            column: clean.name.clone(),
            masked,
            changed,
            changed_outside_mask,
            masked_proportion: if rows == 0 {
                0.0
            } else {
                masked as f64 / rows as f64
            },
        });
    }

    Ok(ErrorMetrics {
        masked: columns.iter().map(|metrics| metrics.masked).sum(),
        changed: columns.iter().map(|metrics| metrics.changed).sum(),
        changed_outside_mask: columns
            .iter()
            .map(|metrics| metrics.changed_outside_mask)
            .sum(),
        masked_proportion: mask.proportion(),
        columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use taberr_core::{Column, ColumnRef, Value};

    #[test]
    fn counts_changes_inside_and_outside_the_mask() {
        let original = Table::new(vec![Column::ints("A", [1, 2, 3, 4])]).expect("valid table");
        let mut dirty = original.clone();
        dirty
            .set_column(
                &ColumnRef::Index(0),
                vec![Value::Null, Value::Int(2), Value::Int(30), Value::Int(4)],
            )
            .expect("set column");
        let mut mask = ErrorMask::for_table(&original);
        mask.column_mut(0)[0] = true;
        mask.column_mut(0)[1] = true;

        let metrics = evaluate(&original, &dirty, &mask).expect("evaluate");
        let column = metrics.column("A").expect("column metrics");
        assert_eq!(column.masked, 2);
        assert_eq!(column.changed, 2);
        assert_eq!(column.changed_outside_mask, 1);
        assert!(!metrics.is_consistent());
        assert_eq!(column.masked_proportion, 0.5);
    }
}
