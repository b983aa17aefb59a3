//! Column-oriented in-memory dataset. The core never performs file I/O; an
//! external loader supplies the table and consumes the results.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DatasetError {
    #[error("duplicate column name {0:?}")]
    DuplicateColumn(String),
    #[error("column {column:?} has {len} rows, expected {expected}")]
    RowCountMismatch {
        column: String,
        len: usize,
        expected: usize,
    },
    #[error("column {column:?} is not numeric")]
    UnsupportedColumnType { column: String },
    #[error("no column named {0:?}")]
    UnknownColumn(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            ColumnData::Numeric(values) => Some(values),
            ColumnData::Text(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Text(values),
        }
    }
}

/// Ordered set of named columns sharing one row count. Construction enforces
/// the invariants; the struct is never mutated in place by transforms.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Result<Self, DatasetError> {
        let mut seen = HashSet::new();
        let expected = columns.first().map(|c| c.data.len()).unwrap_or(0);
        for column in &columns {
            if !seen.insert(column.name.clone()) {
                return Err(DatasetError::DuplicateColumn(column.name.clone()));
            }
            if column.data.len() != expected {
                return Err(DatasetError::RowCountMismatch {
                    column: column.name.clone(),
                    len: column.data.len(),
                    expected,
                });
            }
        }
        Ok(Self { columns })
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.data.len()).unwrap_or(0)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Numeric view of one column, for feeding an encrypted-column pipeline.
    pub fn numeric_column(&self, name: &str) -> Result<&[f64], DatasetError> {
        let column = self
            .column(name)
            .ok_or_else(|| DatasetError::UnknownColumn(name.to_string()))?;
        column
            .data
            .as_numeric()
            .ok_or_else(|| DatasetError::UnsupportedColumnType {
                column: name.to_string(),
            })
    }

    /// Descriptive summary per numeric column (None for text columns),
    /// for original-vs-anonymized comparison.
    pub fn summarize(&self) -> Vec<(String, Option<ColumnSummary>)> {
        self.columns
            .iter()
            .map(|c| {
                let summary = c.data.as_numeric().and_then(ColumnSummary::of);
                (c.name.clone(), summary)
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl ColumnSummary {
    /// Population mean/std over the column; None when empty.
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
        })
    }
}
