//! Tabular data model and delimited-text loading

use crate::error::{ReconError, Result};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Which snapshot a dataset came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Original export (v1)
    Old,
    /// Migrated export (v2)
    New,
}

impl Side {
    pub fn label(&self) -> &'static str {
        match self {
            Side::Old => "v1",
            Side::New => "v2",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Composite key: the values of the key columns, in key-column order
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key(Vec<String>);

impl Key {
    pub fn new(values: Vec<String>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

/// Ordered set of unique column names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: IndexSet<String>,
}

impl Schema {
    /// Build a schema, rejecting empty and repeated column names
    pub fn new(columns: Vec<String>) -> Result<Self> {
        if columns.is_empty() {
            return Err(ReconError::invalid_input("Schema has no columns"));
        }

        let mut set = IndexSet::with_capacity(columns.len());
        for column in columns {
            if !set.insert(column.clone()) {
                return Err(ReconError::invalid_input(format!(
                    "Duplicate column name in header: '{}'",
                    column
                )));
            }
        }

        Ok(Self { columns: set })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.get_index_of(column)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.columns.iter().cloned().collect()
    }
}

/// A single row: one value per schema column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    values: Vec<String>,
}

impl Record {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    pub fn get(&self, position: usize) -> Option<&str> {
        self.values.get(position).map(String::as_str)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// An ordered sequence of records sharing one schema
#[derive(Debug, Clone)]
pub struct Dataset {
    side: Side,
    source: String,
    schema: Schema,
    records: Vec<Record>,
}

impl Dataset {
    /// Build a dataset from in-memory rows.
    ///
    /// Short rows are padded with empty values; rows wider than the header
    /// are rejected.
    pub fn from_rows(
        side: Side,
        source: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Result<Self> {
        let schema = Schema::new(columns)?;
        let source = source.into();
        let width = schema.len();

        let mut records = Vec::with_capacity(rows.len());
        for (idx, row) in rows.into_iter().enumerate() {
            records.push(normalize_row(row, width, || {
                format!("{} row {}", source, idx + 1)
            })?);
        }

        Ok(Self {
            side,
            source,
            schema,
            records,
        })
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Value of `column` in row `row`, if both exist
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let position = self.schema.position(column)?;
        self.records.get(row)?.get(position)
    }

    /// Column name to value view of one row
    pub fn record_map(&self, row: usize) -> Option<IndexMap<&str, &str>> {
        let record = self.records.get(row)?;
        Some(
            self.schema
                .names()
                .zip(record.values().iter().map(String::as_str))
                .collect(),
        )
    }

    /// Extract the composite key of a row given resolved key positions
    pub fn key_at(&self, row: usize, positions: &[usize]) -> Key {
        let record = &self.records[row];
        Key::new(
            positions
                .iter()
                .map(|&p| record.get(p).unwrap_or_default().to_string())
                .collect(),
        )
    }
}

/// Options controlling how delimited files are read
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Load a delimited text file with a header row; every cell stays a string
pub fn load_delimited(path: &Path, side: Side, options: &LoadOptions) -> Result<Dataset> {
    if !path.exists() {
        return Err(ReconError::invalid_input(format!(
            "File not found: {}",
            path.display()
        )));
    }

    if !path.is_file() {
        return Err(ReconError::invalid_input(format!(
            "Path is not a file: {}",
            path.display()
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    if columns.is_empty() || (columns.len() == 1 && columns[0].is_empty()) {
        return Err(ReconError::invalid_input(format!(
            "File has no header row: {}",
            path.display()
        )));
    }

    let schema = Schema::new(columns)?;
    let width = schema.len();
    let source = path.display().to_string();

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let row = result?;
        let line = row
            .position()
            .map(|p| p.line())
            .unwrap_or(idx as u64 + 2);
        let values: Vec<String> = row.iter().map(str::to_string).collect();
        records.push(normalize_row(values, width, || {
            format!("{} line {}", source, line)
        })?);
    }

    log::debug!(
        "Loaded {} dataset from {}: {} rows, {} columns",
        side,
        source,
        records.len(),
        width
    );

    Ok(Dataset {
        side,
        source,
        schema,
        records,
    })
}

fn normalize_row(
    mut values: Vec<String>,
    width: usize,
    location: impl FnOnce() -> String,
) -> Result<Record> {
    if values.len() > width {
        return Err(ReconError::invalid_input(format!(
            "{}: expected {} fields, found {}",
            location(),
            width,
            values.len()
        )));
    }
    values.resize(width, String::new());
    Ok(Record::new(values))
}
