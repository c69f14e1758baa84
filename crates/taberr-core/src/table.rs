use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::column::{Column, ColumnRef};
use crate::dtype::DataType;
use crate::error::{Error, Result};
use crate::value::Value;

/// Ordered collection of equally long, named columns.
///
/// Rows are identified by position; no operation in this crate reorders them,
/// so a row keeps its identity across column replacement.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "TableColumns")]
pub struct Table {
    columns: Vec<Column>,
}

/// Wire shape of a table, checked by `Table::new` before use.
#[derive(Deserialize)]
struct TableColumns {
    columns: Vec<Column>,
}

impl TryFrom<TableColumns> for Table {
    type Error = Error;

    fn try_from(raw: TableColumns) -> Result<Self> {
        Table::new(raw.columns)
    }
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut names = HashSet::new();
        for column in &columns {
            if !names.insert(column.name.as_str()) {
                return Err(Error::InvalidTable(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }

        if let Some(first) = columns.first() {
            let rows = first.len();
            if let Some(ragged) = columns.iter().find(|column| column.len() != rows) {
                return Err(Error::InvalidTable(format!(
                    "column '{}' has {} row(s), expected {rows}",
                    ragged.name,
                    ragged.len()
                )));
            }
        }

        Ok(Self { columns })
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Number of cells.
    pub fn size(&self) -> usize {
        self.n_rows() * self.n_columns()
    }

    /// A table is empty when it has no cells.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(|column| column.name.as_str())
            .collect()
    }

    pub fn dtypes(&self) -> Vec<DataType> {
        self.columns.iter().map(|column| column.dtype).collect()
    }

    /// Resolve a column reference to its position.
    pub fn resolve(&self, column: &ColumnRef) -> Result<usize> {
        match column {
            ColumnRef::Index(index) if *index < self.columns.len() => Ok(*index),
            ColumnRef::Index(index) => Err(Error::ColumnIndexOutOfRange {
                index: *index,
                columns: self.columns.len(),
            }),
            ColumnRef::Name(name) => self
                .columns
                .iter()
                .position(|column| &column.name == name)
                .ok_or_else(|| Error::ColumnNotFound(name.clone())),
        }
    }

    pub fn column(&self, column: &ColumnRef) -> Result<&Column> {
        let index = self.resolve(column)?;
        Ok(&self.columns[index])
    }

    pub fn column_at(&self, index: usize) -> Result<&Column> {
        self.columns.get(index).ok_or(Error::ColumnIndexOutOfRange {
            index,
            columns: self.columns.len(),
        })
    }

    /// Replace a column's values, adapting its dtype to the new values.
    pub fn set_column(&mut self, column: &ColumnRef, values: Vec<Value>) -> Result<()> {
        let index = self.resolve(column)?;
        let rows = self.n_rows();
        if values.len() != rows {
            return Err(Error::ShapeMismatch(format!(
                "column '{}' expects {rows} value(s), got {}",
                self.columns[index].name,
                values.len()
            )));
        }

        let target = &mut self.columns[index];
        target.dtype = DataType::infer(&values, Some(target.dtype));
        target.values = values;
        Ok(())
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Value> {
        self.columns
            .get(column)
            .and_then(|column| column.values.get(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(vec![
            Column::ints("A", [1, 2, 3]),
            Column::texts("B", ["x", "y", "z"]),
        ])
        .expect("valid table")
    }

    #[test]
    fn rejects_ragged_columns() {
        let result = Table::new(vec![
            Column::ints("A", [1, 2, 3]),
            Column::ints("B", [1, 2]),
        ]);
        assert!(matches!(result, Err(Error::InvalidTable(_))));
    }

    #[test]
    fn rejects_duplicate_names() {
        let result = Table::new(vec![Column::ints("A", [1]), Column::ints("A", [2])]);
        assert!(matches!(result, Err(Error::InvalidTable(_))));
    }

    #[test]
    fn resolves_by_name_and_position() {
        let table = sample();
        assert_eq!(table.resolve(&"B".into()).expect("by name"), 1);
        assert_eq!(table.resolve(&ColumnRef::Index(0)).expect("by index"), 0);
        assert!(matches!(
            table.resolve(&ColumnRef::Index(2)),
            Err(Error::ColumnIndexOutOfRange { index: 2, columns: 2 })
        ));
        assert!(matches!(
            table.resolve(&"C".into()),
            Err(Error::ColumnNotFound(_))
        ));
    }

    #[test]
    fn set_column_adapts_dtype() {
        let mut table = sample();
        table
            .set_column(
                &"A".into(),
                vec![Value::Int(1), Value::Float(2.5), Value::Null],
            )
            .expect("set column");
        assert_eq!(table.dtypes()[0], DataType::Float);

        let result = table.set_column(&"A".into(), vec![Value::Int(1)]);
        assert!(matches!(result, Err(Error::ShapeMismatch(_))));
    }
}
