//! Tabular dataset handling
//!
//! A [`Dataset`] wraps a polars `DataFrame` and adds the pieces the evaluator
//! needs on top of it: semantic column kinds, case-insensitive target lookup
//! and missing-value accounting. [`Split`] turns a cleaned dataset into the
//! numeric train/test matrices every evaluation round works on.

pub mod loader;
pub mod split;

pub use loader::DataLoader;
pub use split::Split;

use crate::error::{EvaluatorError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Semantic type of a column, inferred from its storage type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// Per-column overview used by the `info` command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub kind: ColumnKind,
    pub dtype: String,
    pub null_count: usize,
}

/// Check if dtype is numeric
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
            | DataType::Boolean
    )
}

/// An ordered collection of records with named, typed columns
#[derive(Debug, Clone)]
pub struct Dataset {
    df: DataFrame,
}

impl Dataset {
    pub fn new(df: DataFrame) -> Self {
        Self { df }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn into_frame(self) -> DataFrame {
        self.df
    }

    /// Number of records
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.df.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Semantic kind of a column
    pub fn column_kind(&self, name: &str) -> Result<ColumnKind> {
        let column = self
            .df
            .column(name)
            .map_err(|_| EvaluatorError::DataError(format!("column '{}' not found", name)))?;
        Ok(kind_of(column.dtype()))
    }

    /// Total number of missing cells across all columns
    pub fn missing_count(&self) -> usize {
        self.df.get_columns().iter().map(|c| c.null_count()).sum()
    }

    /// Resolve a user-supplied target name against the header, ignoring case.
    ///
    /// Returns the column name as spelled in the dataset.
    pub fn resolve_target(&self, requested: &str) -> Result<String> {
        let wanted = requested.trim().to_lowercase();
        self.df
            .get_column_names()
            .into_iter()
            .find(|name| name.to_lowercase() == wanted)
            .map(|name| name.to_string())
            .ok_or_else(|| EvaluatorError::TargetNotFound(requested.to_string()))
    }

    pub fn summary(&self) -> Vec<ColumnSummary> {
        self.df
            .get_columns()
            .iter()
            .map(|column| ColumnSummary {
                name: column.name().to_string(),
                kind: kind_of(column.dtype()),
                dtype: format!("{:?}", column.dtype()),
                null_count: column.null_count(),
            })
            .collect()
    }
}

impl From<DataFrame> for Dataset {
    fn from(df: DataFrame) -> Self {
        Self::new(df)
    }
}

fn kind_of(dtype: &DataType) -> ColumnKind {
    if is_numeric_dtype(dtype) {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new(
            df!(
                "Age" => &[Some(25.0), None, Some(40.0)],
                "city" => &[Some("oslo"), Some("rome"), None],
                "Price" => &[1.0, 2.0, 3.0]
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_resolve_target_ignores_case() {
        let ds = sample();
        assert_eq!(ds.resolve_target("price").unwrap(), "Price");
        assert_eq!(ds.resolve_target(" PRICE ").unwrap(), "Price");
    }

    #[test]
    fn test_resolve_target_missing() {
        let ds = sample();
        let err = ds.resolve_target("salary").unwrap_err();
        assert!(matches!(err, EvaluatorError::TargetNotFound(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_column_kinds_and_missing() {
        let ds = sample();
        assert_eq!(ds.column_kind("Age").unwrap(), ColumnKind::Numeric);
        assert_eq!(ds.column_kind("city").unwrap(), ColumnKind::Categorical);
        assert_eq!(ds.missing_count(), 2);
        assert_eq!(ds.summary().len(), 3);
    }
}
