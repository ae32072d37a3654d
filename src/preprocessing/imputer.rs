//! Missing value imputation strategies

use crate::data::{is_numeric_dtype, Dataset};
use crate::error::{EvaluatorError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Policy for handling missing values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImputationPolicy {
    /// Replace with column mean (numeric only)
    Mean,
    /// Replace with column median (numeric only)
    Median,
    /// Replace with the most frequent value
    Mode,
    /// Drop rows with any missing value
    Drop,
}

impl ImputationPolicy {
    /// Parse a user-supplied name, falling back to [`ImputationPolicy::Drop`]
    /// with a warning when it is not recognized
    pub fn parse_or_drop(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            warn!(strategy = %name.trim(), "Invalid strategy. Using default 'drop'.");
            ImputationPolicy::Drop
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImputationPolicy::Mean => "mean",
            ImputationPolicy::Median => "median",
            ImputationPolicy::Mode => "mode",
            ImputationPolicy::Drop => "drop",
        }
    }

    /// Apply the policy to a whole dataset, returning a new one without missing values
    pub fn apply(&self, dataset: &Dataset) -> Result<Dataset> {
        let mut imputer = Imputer::new(*self);
        imputer.fit_transform(dataset)
    }
}

impl FromStr for ImputationPolicy {
    type Err = EvaluatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mean" => Ok(ImputationPolicy::Mean),
            "median" => Ok(ImputationPolicy::Median),
            "mode" | "most_frequent" => Ok(ImputationPolicy::Mode),
            "drop" => Ok(ImputationPolicy::Drop),
            other => Err(EvaluatorError::ConfigError(format!(
                "unrecognized imputation strategy '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ImputationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum ImputeValue {
    Numeric(f64),
    String(String),
}

/// Imputer for handling missing values.
///
/// Fill values are learned per column in [`Imputer::fit`]; the input frame is
/// never modified. Under the fill policies a column with no observed values
/// is removed rather than imputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    policy: ImputationPolicy,
    fill_values: HashMap<String, ImputeValue>,
    empty_columns: Vec<String>,
    is_fitted: bool,
}

impl Imputer {
    /// Create a new imputer with the specified policy
    pub fn new(policy: ImputationPolicy) -> Self {
        Self {
            policy,
            fill_values: HashMap::new(),
            empty_columns: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn policy(&self) -> ImputationPolicy {
        self.policy
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Columns without a single observed value, dropped by `transform`
    pub fn empty_columns(&self) -> &[String] {
        &self.empty_columns
    }

    /// Learn per-column fill values from the non-missing entries
    pub fn fit(&mut self, dataset: &Dataset) -> Result<&mut Self> {
        self.fill_values.clear();
        self.empty_columns.clear();

        if self.policy != ImputationPolicy::Drop {
            for column in dataset.frame().get_columns() {
                let series = column.as_materialized_series();
                if series.null_count() == 0 {
                    continue;
                }
                match self.compute_fill_value(series)? {
                    Some(value) => {
                        self.fill_values.insert(series.name().to_string(), value);
                    }
                    None => {
                        warn!(
                            column = %series.name(),
                            "Column has no observed values to impute from; dropping the column"
                        );
                        self.empty_columns.push(series.name().to_string());
                    }
                }
            }
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace missing cells with the learned fill values and remove empty
    /// columns.
    ///
    /// Rows that still hold a missing value afterwards (every incomplete row
    /// for [`ImputationPolicy::Drop`]) are removed.
    pub fn transform(&self, dataset: &Dataset) -> Result<Dataset> {
        if !self.is_fitted {
            return Err(EvaluatorError::ModelNotFitted);
        }

        let mut result = dataset.frame().clone();
        for name in &self.empty_columns {
            if result.column(name).is_ok() {
                result = result.drop(name)?;
            }
        }
        for (col_name, fill_value) in &self.fill_values {
            if let Ok(column) = dataset.frame().column(col_name) {
                let filled = Self::fill_series(column.as_materialized_series(), fill_value)?;
                result.with_column(filled)?;
            }
        }

        let before = result.height();
        let result = drop_incomplete_rows(&result)?;
        if result.height() < before {
            debug!(dropped = before - result.height(), "Dropped rows with missing values");
        }

        Ok(Dataset::new(result))
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, dataset: &Dataset) -> Result<Dataset> {
        self.fit(dataset)?;
        self.transform(dataset)
    }

    fn compute_fill_value(&self, series: &Series) -> Result<Option<ImputeValue>> {
        let numeric = is_numeric_dtype(series.dtype());

        match self.policy {
            ImputationPolicy::Mean | ImputationPolicy::Median if !numeric => {
                warn!(
                    column = %series.name(),
                    strategy = %self.policy,
                    "Strategy needs numeric data, using mode for categorical column"
                );
                Ok(Self::compute_mode_string(series)?.map(ImputeValue::String))
            }
            ImputationPolicy::Mean => {
                let cast = series.cast(&DataType::Float64)?;
                Ok(cast.f64()?.mean().map(ImputeValue::Numeric))
            }
            ImputationPolicy::Median => {
                let cast = series.cast(&DataType::Float64)?;
                Ok(cast.f64()?.median().map(ImputeValue::Numeric))
            }
            ImputationPolicy::Mode if numeric => {
                Ok(Self::compute_mode_numeric(series)?.map(ImputeValue::Numeric))
            }
            ImputationPolicy::Mode => Ok(Self::compute_mode_string(series)?.map(ImputeValue::String)),
            ImputationPolicy::Drop => Ok(None),
        }
    }

    /// Most frequent value; ties resolve to the smallest value
    fn compute_mode_numeric(series: &Series) -> Result<Option<f64>> {
        let cast = series.cast(&DataType::Float64)?;
        let mut counts: HashMap<u64, usize> = HashMap::new();
        for val in cast.f64()?.into_iter().flatten() {
            *counts.entry(val.to_bits()).or_insert(0) += 1;
        }

        Ok(counts
            .into_iter()
            .map(|(bits, count)| (f64::from_bits(bits), count))
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.total_cmp(&a.0)))
            .map(|(value, _)| value))
    }

    /// Most frequent string; ties resolve to the lexicographically smallest
    fn compute_mode_string(series: &Series) -> Result<Option<String>> {
        let cast = series.cast(&DataType::String)?;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for val in cast.str()?.into_iter().flatten() {
            *counts.entry(val).or_insert(0) += 1;
        }

        Ok(counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(value, _)| value.to_string()))
    }

    fn fill_series(series: &Series, fill_value: &ImputeValue) -> Result<Series> {
        match fill_value {
            ImputeValue::Numeric(val) => {
                let cast = series.cast(&DataType::Float64)?;
                let filled: Float64Chunked = cast
                    .f64()?
                    .into_iter()
                    .map(|opt| Some(opt.unwrap_or(*val)))
                    .collect();
                Ok(filled.with_name(series.name().clone()).into_series())
            }
            ImputeValue::String(val) => {
                let cast = series.cast(&DataType::String)?;
                let filled: StringChunked = cast
                    .str()?
                    .into_iter()
                    .map(|opt| Some(opt.unwrap_or(val.as_str()).to_string()))
                    .collect();
                Ok(filled.with_name(series.name().clone()).into_series())
            }
        }
    }
}

/// Keep only rows where every column is present
fn drop_incomplete_rows(df: &DataFrame) -> Result<DataFrame> {
    if df.get_columns().iter().all(|c| c.null_count() == 0) {
        return Ok(df.clone());
    }

    let mut mask = BooleanChunked::full("mask".into(), true, df.height());
    for column in df.get_columns() {
        mask = &mask & &column.as_materialized_series().is_not_null();
    }
    Ok(df.filter(&mask)?)
}
