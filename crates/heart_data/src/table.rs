//! Headerless raw CSV tables

use crate::errors::Result;
use std::io::{Read, Write};
use std::path::Path;

/// Cell text the source dataset uses for unknown values
pub const MISSING_PLACEHOLDER: &str = "?";

/// Rows of trimmed text cells; `None` marks a missing value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<Option<String>>>) -> Self {
        Self { rows }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    /// Read a headerless CSV. Empty cells and `?` become missing values.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(parse_cell).collect());
        }
        Ok(Self { rows })
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        self.write_to(file)
    }

    /// Write a headerless CSV, rendering missing values as `?`
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(writer);
        for row in &self.rows {
            writer.write_record(
                row.iter()
                    .map(|cell| cell.as_deref().unwrap_or(MISSING_PLACEHOLDER)),
            )?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn parse_cell(cell: &str) -> Option<String> {
    if cell.is_empty() || cell == MISSING_PLACEHOLDER {
        None
    } else {
        Some(cell.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_and_blanks_are_missing() {
        let table = RawTable::from_reader("63.0,1.0,?\n 67.0 ,,2\n".as_bytes()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][2], None);
        assert_eq!(table.rows[1][0].as_deref(), Some("67.0"));
        assert_eq!(table.rows[1][1], None);
    }

    #[test]
    fn write_then_read_keeps_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        let table = RawTable::new(vec![
            vec![Some("1".into()), None],
            vec![Some("2.5".into()), Some("x".into())],
        ]);

        table.write_csv(&path).unwrap();
        assert_eq!(RawTable::from_path(&path).unwrap(), table);
    }
}
