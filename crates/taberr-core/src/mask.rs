use serde::{Deserialize, Serialize};

use crate::column::ColumnRef;
use crate::error::{Error, Result};
use crate::table::Table;

/// Number of cells a rate selects out of `rows`: `floor(rows * error_rate + 1e-9)`.
///
/// This is not a plain floor. The `1e-9` tolerance absorbs binary rounding
/// of the product, so `error_count(100, 0.29)` is 29 where a plain
/// `floor(100.0 * 0.29)` gives 28. Rates built as `count / rows` therefore
/// select exactly `count` cells.
pub fn error_count(rows: usize, error_rate: f64) -> usize {
    (rows as f64 * error_rate + 1e-9).floor() as usize
}

/// Boolean table shaped like its subject table; `true` marks a corrupted cell.
///
/// Stored column-major so mechanisms and error types can work on one column
/// slice at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MaskParts")]
pub struct ErrorMask {
    names: Vec<String>,
    cells: Vec<Vec<bool>>,
    rows: usize,
}

#[derive(Deserialize)]
struct MaskParts {
    names: Vec<String>,
    cells: Vec<Vec<bool>>,
    rows: usize,
}

impl TryFrom<MaskParts> for ErrorMask {
    type Error = Error;

    fn try_from(raw: MaskParts) -> Result<Self> {
        if raw.names.len() != raw.cells.len() {
            return Err(Error::ShapeMismatch(format!(
                "error mask names {} column(s) but holds {}",
                raw.names.len(),
                raw.cells.len()
            )));
        }
        if let Some((name, cells)) = raw
            .names
            .iter()
            .zip(&raw.cells)
            .find(|(_, cells)| cells.len() != raw.rows)
        {
            return Err(Error::ShapeMismatch(format!(
                "error mask column '{name}' has {} row(s), expected {}",
                cells.len(),
                raw.rows
            )));
        }
        Ok(Self {
            names: raw.names,
            cells: raw.cells,
            rows: raw.rows,
        })
    }
}

impl ErrorMask {
    /// All-false mask with the table's shape and column names.
    pub fn for_table(table: &Table) -> Self {
        let rows = table.n_rows();
        Self {
            names: table
                .column_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            cells: vec![vec![false; rows]; table.n_columns()],
            rows,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.rows
    }

    pub fn n_columns(&self) -> usize {
        self.cells.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn resolve(&self, column: &ColumnRef) -> Result<usize> {
        match column {
            ColumnRef::Index(index) if *index < self.cells.len() => Ok(*index),
            ColumnRef::Index(index) => Err(Error::ColumnIndexOutOfRange {
                index: *index,
                columns: self.cells.len(),
            }),
            ColumnRef::Name(name) => self
                .names
                .iter()
                .position(|candidate| candidate == name)
                .ok_or_else(|| Error::ColumnNotFound(name.clone())),
        }
    }

    pub fn column(&self, index: usize) -> &[bool] {
        &self.cells[index]
    }

    pub fn column_mut(&mut self, index: usize) -> &mut [bool] {
        &mut self.cells[index]
    }

    pub fn get(&self, row: usize, column: usize) -> bool {
        self.cells
            .get(column)
            .and_then(|cells| cells.get(row))
            .copied()
            .unwrap_or(false)
    }

    /// Indices of flagged rows in one column.
    pub fn flagged_rows(&self, column: usize) -> Vec<usize> {
        self.cells[column]
            .iter()
            .enumerate()
            .filter_map(|(row, flagged)| flagged.then_some(row))
            .collect()
    }

    /// Indices of error-free rows in one column.
    pub fn free_rows(&self, column: usize) -> Vec<usize> {
        self.cells[column]
            .iter()
            .enumerate()
            .filter_map(|(row, flagged)| (!flagged).then_some(row))
            .collect()
    }

    pub fn count_column(&self, column: usize) -> usize {
        self.cells[column].iter().filter(|flagged| **flagged).count()
    }

    pub fn count(&self) -> usize {
        (0..self.cells.len())
            .map(|column| self.count_column(column))
            .sum()
    }

    /// Share of flagged cells over the whole mask.
    pub fn proportion(&self) -> f64 {
        let size = self.rows * self.cells.len();
        if size == 0 {
            0.0
        } else {
            self.count() as f64 / size as f64
        }
    }

    /// Fail unless the mask has the same rows and columns as `table`.
    pub fn ensure_matches(&self, table: &Table) -> Result<()> {
        if self.rows != table.n_rows() || self.cells.len() != table.n_columns() {
            return Err(Error::ShapeMismatch(format!(
                "error mask is {}x{} but table is {}x{}",
                self.rows,
                self.cells.len(),
                table.n_rows(),
                table.n_columns()
            )));
        }
        Ok(())
    }

    /// Cells flagged in exactly one of the two masks.
    pub fn symmetric_difference(&self, other: &ErrorMask) -> Result<ErrorMask> {
        if self.rows != other.rows || self.cells.len() != other.cells.len() {
            return Err(Error::ShapeMismatch(format!(
                "cannot compare a {}x{} mask with a {}x{} mask",
                self.rows,
                self.cells.len(),
                other.rows,
                other.cells.len()
            )));
        }

        let cells = self
            .cells
            .iter()
            .zip(&other.cells)
            .map(|(left, right)| left.iter().zip(right).map(|(a, b)| a ^ b).collect())
            .collect();

        Ok(ErrorMask {
            names: self.names.clone(),
            cells,
            rows: self.rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;

    fn table() -> Table {
        Table::new(vec![
            Column::ints("A", [1, 2, 3, 4]),
            Column::ints("B", [5, 6, 7, 8]),
        ])
        .expect("valid table")
    }

    #[test]
    fn error_count_tolerates_float_rounding() {
        assert_eq!(error_count(100, 0.29), 29);
        assert_eq!(error_count(10, 0.4), 4);
        assert_eq!(error_count(3, 0.5), 1);
        assert_eq!(error_count(0, 1.0), 0);
    }

    #[test]
    fn starts_all_false() {
        let mask = ErrorMask::for_table(&table());
        assert_eq!(mask.count(), 0);
        assert_eq!(mask.n_rows(), 4);
        assert_eq!(mask.n_columns(), 2);
        assert_eq!(mask.free_rows(1), vec![0, 1, 2, 3]);
    }

    #[test]
    fn symmetric_difference_isolates_new_cells() {
        let before = ErrorMask::for_table(&table());
        let mut after = before.clone();
        after.column_mut(0)[1] = true;
        after.column_mut(1)[3] = true;

        let diff = before.symmetric_difference(&after).expect("same shape");
        assert_eq!(diff.flagged_rows(0), vec![1]);
        assert_eq!(diff.flagged_rows(1), vec![3]);
        assert!((diff.proportion() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn deserializing_checks_the_shape() {
        let mut mask = ErrorMask::for_table(&table());
        mask.column_mut(1)[2] = true;
        let json = serde_json::to_string(&mask).expect("serialize mask");
        let parsed: ErrorMask = serde_json::from_str(&json).expect("parse mask");
        assert_eq!(parsed, mask);

        let ragged = r#"{"names":["A","B"],"cells":[[true,false],[false]],"rows":2}"#;
        assert!(serde_json::from_str::<ErrorMask>(ragged).is_err());
        let unnamed = r#"{"names":["A"],"cells":[[true],[false]],"rows":1}"#;
        assert!(serde_json::from_str::<ErrorMask>(unnamed).is_err());
    }

    #[test]
    fn shape_check_rejects_other_tables() {
        let mask = ErrorMask::for_table(&table());
        let other = Table::new(vec![Column::ints("A", [1])]).expect("valid table");
        assert!(matches!(
            mask.ensure_matches(&other),
            Err(Error::ShapeMismatch(_))
        ));
    }
}
