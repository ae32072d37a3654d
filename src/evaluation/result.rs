//! Round results and the fitted-model bundle they produce

use crate::data::split::encode_features;
use crate::error::{EvaluatorError, Result};
use crate::preprocessing::StandardScaler;
use crate::training::{CVResults, Estimator, Model, ModelKind, ModelSpec, TargetDiscretizer, TaskKind};
use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// Held-out error metrics reported alongside R² for regression
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetrics {
    pub mse: f64,
    pub rmse: f64,
}

/// Outcome of one evaluation round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub model: ModelKind,
    pub task: TaskKind,
    pub cv: CVResults,
    /// R² for regression, rounded-label accuracy for classification
    pub primary: f64,
    /// `None` for classification
    pub secondary: Option<ErrorMetrics>,
    pub n_train: usize,
    pub n_test: usize,
    pub training_time_secs: f64,
}

impl EvaluationResult {
    pub fn cv_scores(&self) -> &[f64] {
        &self.cv.scores
    }

    pub fn primary_metric_name(&self) -> &'static str {
        match self.task {
            TaskKind::Regression => "R²",
            TaskKind::Classification => "Accuracy",
        }
    }

    /// Flat name/value pairs for saved metadata
    pub fn metrics(&self) -> Vec<(String, f64)> {
        let mut metrics = vec![
            ("cv_mean".to_string(), self.cv.mean_score),
            ("cv_std".to_string(), self.cv.std_score),
        ];
        match self.task {
            TaskKind::Regression => metrics.push(("r2".to_string(), self.primary)),
            TaskKind::Classification => metrics.push(("accuracy".to_string(), self.primary)),
        }
        if let Some(err) = self.secondary {
            metrics.push(("mse".to_string(), err.mse));
            metrics.push(("rmse".to_string(), err.rmse));
        }
        metrics
    }

    /// Plain-text summary of the round
    pub fn report(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!("=== {} Model Evaluation ===\n\n", self.model.display_name()));
        report.push_str(&format!("Task:        {}\n", self.task));
        report.push_str(&format!("Train rows:  {}\n", self.n_train));
        report.push_str(&format!("Test rows:   {}\n\n", self.n_test));

        report.push_str("--- Cross-Validation ---\n");
        let scores: Vec<String> = self.cv.scores.iter().map(|s| format!("{:.4}", s)).collect();
        report.push_str(&format!("Scores:      [{}]\n", scores.join(", ")));
        report.push_str(&format!("Mean:        {:.4} (± {:.4})\n\n", self.cv.mean_score, self.cv.std_score));

        report.push_str("--- Test Set ---\n");
        report.push_str(&format!("{:<12} {:.4}\n", format!("{}:", self.primary_metric_name()), self.primary));
        match self.secondary {
            Some(err) => {
                report.push_str(&format!("MSE:         {:.4}\n", err.mse));
                report.push_str(&format!("RMSE:        {:.4}\n", err.rmse));
            }
            None => report.push_str("MSE/RMSE:    not applicable\n"),
        }
        report
    }
}

/// A fitted model with everything needed to apply it to raw feature rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub spec: ModelSpec,
    pub model: Model,
    pub feature_names: Vec<String>,
    pub target_name: String,
    /// Labels of a text target, indexed by encoded value
    pub target_classes: Option<Vec<String>>,
    /// Category labels of text features, aligned with `feature_names`
    pub feature_categories: Vec<Option<Vec<String>>>,
    pub scaler: StandardScaler,
    /// Present when a continuous target was binned for classification
    pub discretizer: Option<TargetDiscretizer>,
}

impl TrainedModel {
    pub fn kind(&self) -> ModelKind {
        self.spec.kind
    }

    /// Encode raw feature columns the way the training split did
    pub fn encode_frame(&self, df: &DataFrame) -> Result<Array2<f64>> {
        encode_features(df, &self.feature_names, &self.feature_categories)
    }

    /// Predict from a frame of raw rows holding every feature column
    pub fn predict_frame(&self, df: &DataFrame) -> Result<Array1<f64>> {
        let x = self.encode_frame(df)?;
        self.predict(&x)
    }

    /// Predict from unscaled feature rows
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let scaled = self.scaler.transform(x)?;
        self.predict_scaled(&scaled)
    }

    /// Predict from rows already standardized with this model's scaler
    pub fn predict_scaled(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.model.is_fitted() {
            return Err(EvaluatorError::ModelNotFitted);
        }
        self.model.predict(x)
    }
}
