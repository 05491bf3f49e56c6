use crate::Result;

use anyhow::Context;
use std::fs::File;
use std::io::Read;

/// Raw cell grid read from a CSV file, addressed by (row, column).
///
/// Rows may differ in length; cells past the end of a row read as empty.
#[derive(Debug, Clone, Default)]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

impl Grid {
    /// Parse a CSV file without treating any row as a header.
    pub fn from_path(path: &str) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("open sheet {}", path))?;
        Self::from_reader(file).with_context(|| format!("read sheet {}", path))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (idx, record) in csv_reader.records().enumerate() {
            let record = record.with_context(|| format!("csv parse error at line {}", idx + 1))?;
            rows.push(record.iter().map(|c| c.trim().to_string()).collect());
        }
        Ok(Self { rows })
    }

    /// Cell text at (row, col), or "" when out of range.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Length of row `row` (0 when out of range).
    pub fn width(&self, row: usize) -> usize {
        self.rows.get(row).map(Vec::len).unwrap_or(0)
    }
}
