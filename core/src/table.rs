//! In-memory table representation with typed, nullable cells
//!
//! A [`TableSnapshot`] is the unit the reconciliation engine operates on:
//! an ordered header plus rows of scalar cells, loaded once and read-only
//! for the rest of the run. Loaders exist for CSV and JSON record files;
//! any other source can be adapted through [`TableSnapshot::new`] or
//! [`TableSnapshot::from_records`].

use crate::error::{Result, SurveyrecError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A single nullable scalar cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Null-aware value equality: both null, or both non-null and equal
    /// under value equality. No coercion between text and number, so
    /// `Text("9")` and `Number(9.0)` are NOT the same.
    pub fn same_as(&self, other: &CellValue) -> bool {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => true,
            (CellValue::Number(a), CellValue::Number(b)) => a == b,
            (CellValue::Text(a), CellValue::Text(b)) => a == b,
            _ => false,
        }
    }

    /// Canonical textual rendering, used for key normalization and export.
    /// Integral numbers print without a fractional part so `1001.0` and
    /// `"1001"` produce the same key text. Null renders empty.
    pub fn canonical_text(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Number(n) => render_number(*n),
            CellValue::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

fn render_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Scalar inference for CSV cells: empty becomes null, numeric lexemes
/// become numbers, everything else stays text.
pub(crate) fn infer_scalar(raw: &str) -> CellValue {
    if raw.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = raw.parse::<i64>() {
        return CellValue::Number(i as f64);
    }
    // Only attempt float parsing on plain numeric lexemes so "inf", "nan"
    // and the like survive as text.
    let numeric_shape = raw.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'+' | b'-' | b'e' | b'E'))
        && raw.bytes().any(|b| b.is_ascii_digit());
    if numeric_shape {
        if let Ok(f) = raw.parse::<f64>() {
            if f.is_finite() {
                return CellValue::Number(f);
            }
        }
    }
    CellValue::Text(raw.to_string())
}

/// Immutable, ordered-column view of a loaded dataset
///
/// Invariant: every row is exactly as wide as the header, and column
/// names are unique.
#[derive(Debug, Clone, Serialize)]
pub struct TableSnapshot {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl TableSnapshot {
    /// Build a snapshot from an ordered header and positional rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self> {
        let mut index = HashMap::with_capacity(columns.len());
        for (pos, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), pos).is_some() {
                return Err(SurveyrecError::schema(format!(
                    "duplicate column name '{name}'"
                )));
            }
        }
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(SurveyrecError::schema(format!(
                    "row {} has {} cells, expected {}",
                    row_idx,
                    row.len(),
                    columns.len()
                )));
            }
        }
        Ok(Self {
            columns,
            rows,
            index,
        })
    }

    /// Build a snapshot from map-shaped records against an explicit header.
    /// A record key outside the header is a schema error; a missing key is
    /// a null cell.
    pub fn from_records(
        columns: Vec<String>,
        records: Vec<IndexMap<String, CellValue>>,
    ) -> Result<Self> {
        let positions: HashMap<&str, usize> = columns
            .iter()
            .enumerate()
            .map(|(pos, name)| (name.as_str(), pos))
            .collect();
        let mut rows = Vec::with_capacity(records.len());
        for (row_idx, record) in records.into_iter().enumerate() {
            let mut row = vec![CellValue::Null; columns.len()];
            for (key, value) in record {
                match positions.get(key.as_str()) {
                    Some(&pos) => row[pos] = value,
                    None => {
                        return Err(SurveyrecError::schema(format!(
                            "row {row_idx} has unknown column '{key}'"
                        )))
                    }
                }
            }
            rows.push(row);
        }
        Self::new(columns, rows)
    }

    /// Load a snapshot from a CSV file. The first record is the header;
    /// cells go through scalar inference.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SurveyrecError::source_not_found(path));
        }
        let mut reader = csv::ReaderBuilder::new().flexible(false).from_path(path)?;
        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| {
                if matches!(e.kind(), csv::ErrorKind::UnequalLengths { .. }) {
                    SurveyrecError::schema(e.to_string())
                } else {
                    SurveyrecError::Csv(e)
                }
            })?;
            rows.push(record.iter().map(infer_scalar).collect());
        }
        Self::new(columns, rows)
    }

    /// Load a snapshot from a JSON file containing an array of flat
    /// objects. The first object fixes the header; every later object must
    /// carry the same key set.
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SurveyrecError::source_not_found(path));
        }
        let file = std::fs::File::open(path)?;
        let records: Vec<IndexMap<String, serde_json::Value>> =
            serde_json::from_reader(std::io::BufReader::new(file))?;
        let Some(first) = records.first() else {
            return Self::new(Vec::new(), Vec::new());
        };
        let columns: Vec<String> = first.keys().cloned().collect();
        let mut rows = Vec::with_capacity(records.len());
        for (row_idx, record) in records.iter().enumerate() {
            if record.len() != columns.len()
                || !columns.iter().all(|c| record.contains_key(c))
            {
                return Err(SurveyrecError::schema(format!(
                    "record {row_idx} does not match the header column set"
                )));
            }
            let mut row = Vec::with_capacity(columns.len());
            for name in &columns {
                row.push(json_scalar(&record[name], name, row_idx)?);
            }
            rows.push(row);
        }
        Self::new(columns, rows)
    }

    /// Dispatch on file extension: `.json` loads as JSON records,
    /// everything else as CSV.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_path(path),
            _ => Self::from_csv_path(path),
        }
    }

    /// Render every cell of the designated identifier column to canonical
    /// text, so mixed numeric/string identifiers compare stably across the
    /// two sides. No-op when the column is absent.
    pub fn normalize_key_column(&mut self, column: &str) {
        let Some(&pos) = self.index.get(column) else {
            return;
        };
        for row in &mut self.rows {
            if !row[pos].is_null() {
                row[pos] = CellValue::Text(row[pos].canonical_text());
            }
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Cell by row ordinal and column name. None when either is out of range.
    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let pos = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[pos])
    }

    /// Cell by row ordinal and column position.
    pub fn cell_at(&self, row: usize, pos: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(pos))
    }

    pub fn row(&self, row: usize) -> Option<&[CellValue]> {
        self.rows.get(row).map(|r| r.as_slice())
    }

    pub fn rows(&self) -> impl Iterator<Item = &[CellValue]> {
        self.rows.iter().map(|r| r.as_slice())
    }
}

fn json_scalar(value: &serde_json::Value, column: &str, row: usize) -> Result<CellValue> {
    match value {
        serde_json::Value::Null => Ok(CellValue::Null),
        serde_json::Value::Number(n) => Ok(CellValue::Number(n.as_f64().ok_or_else(|| {
            SurveyrecError::schema(format!("non-finite number in '{column}' at record {row}"))
        })?)),
        serde_json::Value::String(s) => Ok(CellValue::Text(s.clone())),
        serde_json::Value::Bool(b) => Ok(CellValue::Text(b.to_string())),
        _ => Err(SurveyrecError::schema(format!(
            "nested value in '{column}' at record {row}; only scalars are supported"
        ))),
    }
}
