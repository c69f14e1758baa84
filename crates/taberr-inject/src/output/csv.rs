use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use taberr_core::{ErrorMask, Table};

/// Write a table as CSV in column order. Missing cells are empty fields.
/// Returns the number of bytes written.
pub fn write_table_csv(path: &Path, table: &Table) -> Result<u64, csv::Error> {
    let file = File::create(path).map_err(csv::Error::from)?;
    write_table(BufWriter::new(file), table)
}

/// Write an error mask as CSV with `true`/`false` cells.
pub fn write_mask_csv(path: &Path, mask: &ErrorMask) -> Result<u64, csv::Error> {
    let file = File::create(path).map_err(csv::Error::from)?;
    write_mask(BufWriter::new(file), mask)
}

pub fn write_table<W: Write>(writer: W, table: &Table) -> Result<u64, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(CountingWriter::new(writer));

    writer.write_record(table.column_names())?;
    for row in 0..table.n_rows() {
        let record: Vec<String> = (0..table.n_columns())
            .map(|column| {
                table
                    .cell(row, column)
                    .map(ToString::to_string)
                    .unwrap_or_default()
            })
            .collect();
        writer.write_record(&record)?;
    }

    finish(writer)
}

pub fn write_mask<W: Write>(writer: W, mask: &ErrorMask) -> Result<u64, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(CountingWriter::new(writer));

    writer.write_record(mask.column_names())?;
    for row in 0..mask.n_rows() {
        let record: Vec<&str> = (0..mask.n_columns())
            .map(|column| if mask.get(row, column) { "true" } else { "false" })
            .collect();
        writer.write_record(&record)?;
    }

    finish(writer)
}

fn finish<W: Write>(mut writer: csv::Writer<CountingWriter<W>>) -> Result<u64, csv::Error> {
    writer.flush()?;
    let mut counting = writer.into_inner().map_err(|err| err.into_error())?;
    counting.flush()?;
    Ok(counting.bytes_written())
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taberr_core::{Column, ColumnRef, Value};

    #[test]
    fn writes_nulls_as_empty_fields() {
        let mut table = Table::new(vec![
            Column::ints("id", [1, 2]),
            Column::texts("name", ["ann", "bo"]),
        ])
        .expect("valid table");
        table
            .set_column(
                &ColumnRef::Name("name".to_string()),
                vec![Value::Null, Value::Text("bo".to_string())],
            )
            .expect("set column");

        let mut buffer = Vec::new();
        let bytes = write_table(&mut buffer, &table).expect("write csv");
        let text = String::from_utf8(buffer).expect("utf8");
        assert_eq!(text, "id,name\n1,\n2,bo\n");
        assert_eq!(bytes, text.len() as u64);
    }

    #[test]
    fn writes_mask_flags() {
        let table = Table::new(vec![Column::ints("a", [1, 2])]).expect("valid table");
        let mut mask = ErrorMask::for_table(&table);
        mask.column_mut(0)[1] = true;

        let mut buffer = Vec::new();
        write_mask(&mut buffer, &mask).expect("write csv");
        assert_eq!(
            String::from_utf8(buffer).expect("utf8"),
            "a\nfalse\ntrue\n"
        );
    }
}
