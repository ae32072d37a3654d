//! Evaluator configuration

use crate::error::{EvaluatorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Session-wide settings for splitting, cross-validation and model defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Fraction of rows held out for the test set
    pub test_size: f64,

    /// Seed for the train/test shuffle (and fold shuffling, when enabled)
    pub random_state: u64,

    /// Number of folds for regression models
    pub regression_cv_folds: usize,

    /// Number of stratified folds for classification models
    pub classification_cv_folds: usize,

    /// Shuffle rows before assigning folds
    pub shuffle_folds: bool,

    /// Number of equal-width bins for continuous classification targets
    pub n_bins: usize,

    /// Iteration cap for the logistic classifier
    pub logistic_max_iter: usize,

    /// Degree of the polynomial feature expansion
    pub polynomial_degree: usize,

    /// Regularization strength used when none is given
    pub default_alpha: f64,

    /// Directory that saved models are written to
    pub output_dir: PathBuf,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            random_state: 42,
            regression_cv_folds: 5,
            classification_cv_folds: 3,
            shuffle_folds: false,
            n_bins: 4,
            logistic_max_iter: 10_000,
            polynomial_degree: 2,
            default_alpha: 1.0,
            output_dir: PathBuf::from("."),
        }
    }
}

impl EvaluatorConfig {
    /// Load a configuration from a JSON file; missing fields keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            EvaluatorError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| EvaluatorError::ConfigError(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_regression_cv_folds(mut self, folds: usize) -> Self {
        self.regression_cv_folds = folds;
        self
    }

    pub fn with_classification_cv_folds(mut self, folds: usize) -> Self {
        self.classification_cv_folds = folds;
        self
    }

    pub fn with_shuffle_folds(mut self, shuffle: bool) -> Self {
        self.shuffle_folds = shuffle;
        self
    }

    pub fn with_n_bins(mut self, n_bins: usize) -> Self {
        self.n_bins = n_bins;
        self
    }

    pub fn with_logistic_max_iter(mut self, max_iter: usize) -> Self {
        self.logistic_max_iter = max_iter;
        self
    }

    pub fn with_default_alpha(mut self, alpha: f64) -> Self {
        self.default_alpha = alpha;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Check that all values are usable
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(invalid("test_size", self.test_size, "must be in (0, 1)"));
        }
        if self.regression_cv_folds < 2 {
            return Err(invalid("regression_cv_folds", self.regression_cv_folds, "must be at least 2"));
        }
        if self.classification_cv_folds < 2 {
            return Err(invalid("classification_cv_folds", self.classification_cv_folds, "must be at least 2"));
        }
        if self.n_bins < 1 {
            return Err(invalid("n_bins", self.n_bins, "must be at least 1"));
        }
        if self.polynomial_degree < 1 {
            return Err(invalid("polynomial_degree", self.polynomial_degree, "must be at least 1"));
        }
        if self.logistic_max_iter == 0 {
            return Err(invalid("logistic_max_iter", self.logistic_max_iter, "must be positive"));
        }
        if !(self.default_alpha >= 0.0) {
            return Err(invalid("default_alpha", self.default_alpha, "must be non-negative"));
        }
        Ok(())
    }
}

fn invalid(name: &str, value: impl ToString, reason: &str) -> EvaluatorError {
    EvaluatorError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
