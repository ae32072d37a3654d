//! Evaluation round: cross-validate, fit, predict and score one model

use super::result::{ErrorMetrics, EvaluationResult, TrainedModel};
use crate::config::EvaluatorConfig;
use crate::data::Split;
use crate::error::Result;
use crate::preprocessing::StandardScaler;
use crate::reporting::PredictionReporter;
use crate::training::metrics::{mean_squared_error, r2_score, rounded_accuracy};
use crate::training::{
    cross_val_score, is_continuous, CVStrategy, CrossValidator, Estimator, ModelSpec,
    TargetDiscretizer, TaskKind,
};
use ndarray::Array1;
use std::time::Instant;
use tracing::{debug, info};

/// Everything one round produces
#[derive(Debug, Clone)]
pub struct RoundOutcome {
    pub result: EvaluationResult,
    pub trained: TrainedModel,
    /// Test targets as scored (binned when the target was discretized)
    pub y_true: Array1<f64>,
    pub y_pred: Array1<f64>,
}

/// Round-local targets
struct Targets {
    train: Array1<f64>,
    test: Array1<f64>,
    discretizer: Option<TargetDiscretizer>,
}

/// Runs evaluation rounds against a standardized [`Split`]
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: EvaluatorConfig,
}

impl Evaluator {
    pub fn new(config: EvaluatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Cross-validation splitter for a task
    pub fn cross_validator(&self, task: TaskKind) -> CrossValidator {
        let folds = match task {
            TaskKind::Regression => self.config.regression_cv_folds,
            TaskKind::Classification => self.config.classification_cv_folds,
        };
        CrossValidator::new(CVStrategy::for_task(task, folds, self.config.shuffle_folds))
            .with_random_state(self.config.random_state)
    }

    /// Copy the split's targets, binning them when a classifier meets a
    /// continuous target. The split itself is never touched.
    fn targets_for(&self, task: TaskKind, split: &Split) -> Result<Targets> {
        let train = split.y_train();
        let test = split.y_test();

        if task == TaskKind::Classification && is_continuous(train) {
            let discretizer = TargetDiscretizer::fit(train, self.config.n_bins)?;
            debug!(edges = ?discretizer.edges(), "Discretized continuous target");
            return Ok(Targets {
                train: discretizer.transform(train),
                test: discretizer.transform(test),
                discretizer: Some(discretizer),
            });
        }

        Ok(Targets {
            train: train.clone(),
            test: test.clone(),
            discretizer: None,
        })
    }

    /// Evaluate one model against a split whose features are already
    /// standardized by `scaler`
    pub fn evaluate(&self, spec: &ModelSpec, split: &Split, scaler: &StandardScaler) -> Result<RoundOutcome> {
        spec.validate()?;
        let start = Instant::now();
        let task = spec.task();
        let targets = self.targets_for(task, split)?;

        let cv = self.cross_validator(task);
        let cv_results = cross_val_score(spec, split.x_train(), &targets.train, &cv)?;
        info!(scores = ?cv_results.scores, "Cross-validation scores: {:?}", cv_results.scores);
        info!(mean = cv_results.mean_score, "Average CV score: {:.4}", cv_results.mean_score);

        let mut model = spec.build();
        model.fit(split.x_train(), &targets.train)?;
        let y_pred = model.predict(split.x_test())?;

        let (primary, secondary) = match task {
            TaskKind::Regression => {
                let r2 = r2_score(&targets.test, &y_pred)?;
                let mse = mean_squared_error(&targets.test, &y_pred)?;
                let rmse = mse.sqrt();
                info!(r2, mse, rmse, "R²: {:.4}, MSE: {:.4}, RMSE: {:.4}", r2, mse, rmse);
                (r2, Some(ErrorMetrics { mse, rmse }))
            }
            TaskKind::Classification => {
                let accuracy = rounded_accuracy(&targets.test, &y_pred)?;
                info!(accuracy, "Accuracy: {:.4}", accuracy);
                (accuracy, None)
            }
        };

        let result = EvaluationResult {
            model: spec.kind,
            task,
            cv: cv_results,
            primary,
            secondary,
            n_train: split.n_train(),
            n_test: split.n_test(),
            training_time_secs: start.elapsed().as_secs_f64(),
        };

        let trained = TrainedModel {
            spec: spec.clone(),
            model,
            feature_names: split.feature_names().to_vec(),
            target_name: split.target_name().to_string(),
            target_classes: split.target_classes().map(|c| c.to_vec()),
            feature_categories: split.feature_categories().to_vec(),
            scaler: scaler.clone(),
            discretizer: targets.discretizer,
        };

        Ok(RoundOutcome {
            result,
            trained,
            y_true: targets.test,
            y_pred,
        })
    }

    /// Evaluate, then hand the test predictions to a reporter
    pub fn run_round(
        &self,
        spec: &ModelSpec,
        split: &Split,
        scaler: &StandardScaler,
        reporter: &dyn PredictionReporter,
    ) -> Result<RoundOutcome> {
        let outcome = self.evaluate(spec, split, scaler)?;
        reporter.report(&outcome.y_true, &outcome.y_pred, spec.kind, outcome.result.task);
        Ok(outcome)
    }
}
