//! Evaluation session
//!
//! A [`Session`] owns the cleaned, split and standardized data for one
//! dataset/target pair and runs evaluation rounds against it until the
//! [`Prompter`] says stop.

mod prompt;

pub use prompt::{Prompter, ScriptedPrompter};

use crate::config::EvaluatorConfig;
use crate::data::{Dataset, Split};
use crate::error::{EvaluatorError, Result};
use crate::evaluation::{EvaluationResult, Evaluator, RoundOutcome};
use crate::export::save_model;
use crate::preprocessing::{ImputationPolicy, StandardScaler};
use crate::reporting::PredictionReporter;
use crate::training::{ModelKind, ModelSpec};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// What a finished session loop produced
#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    /// Results of the rounds that completed, in order
    pub results: Vec<EvaluationResult>,
    /// Files written by saved rounds
    pub saved: Vec<PathBuf>,
    /// Rounds rejected or aborted (unknown model, numeric failure, ...)
    pub failed_rounds: usize,
}

/// Prepared data plus the evaluator that runs rounds on it
#[derive(Debug, Clone)]
pub struct Session {
    evaluator: Evaluator,
    policy: ImputationPolicy,
    split: Split,
    scaler: StandardScaler,
}

impl Session {
    /// Impute, resolve the target, split and standardize.
    ///
    /// Any error here is a dataset problem and ends the session before a
    /// round runs.
    pub fn prepare(
        dataset: &Dataset,
        target: &str,
        policy: ImputationPolicy,
        config: EvaluatorConfig,
    ) -> Result<Self> {
        config.validate()?;
        // fail on a bad target before spending time on imputation
        let target_name = dataset.resolve_target(target)?;
        let target_nulls = dataset.frame().column(&target_name)?.null_count();
        if dataset.height() > 0 && target_nulls == dataset.height() {
            return Err(EvaluatorError::DataError(format!(
                "target column '{}' has no values",
                target_name
            )));
        }

        let cleaned = policy.apply(dataset)?;
        if cleaned.height() < dataset.height() {
            info!(
                dropped = dataset.height() - cleaned.height(),
                remaining = cleaned.height(),
                "Dropped rows with missing values"
            );
        }

        let split = Split::from_dataset(&cleaned, target, config.test_size, config.random_state)?;
        let (split, scaler) = split.standardize()?;

        Ok(Self {
            evaluator: Evaluator::new(config),
            policy,
            split,
            scaler,
        })
    }

    pub fn config(&self) -> &EvaluatorConfig {
        self.evaluator.config()
    }

    pub fn policy(&self) -> ImputationPolicy {
        self.policy
    }

    /// Standardized train/test data every round uses
    pub fn split(&self) -> &Split {
        &self.split
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Spec for `kind` with configured defaults and an optional alpha
    pub fn spec_for(&self, kind: ModelKind, alpha: Option<f64>) -> ModelSpec {
        let spec = ModelSpec::from_config(kind, self.config());
        match alpha {
            Some(alpha) => spec.with_alpha(alpha),
            None => spec,
        }
    }

    /// Run one round and report its predictions
    pub fn run_round(&self, spec: &ModelSpec, reporter: &dyn PredictionReporter) -> Result<RoundOutcome> {
        info!(model = %spec.kind, task = %spec.task(), "Evaluating {} model", spec.kind.display_name());
        self.evaluator.run_round(spec, &self.split, &self.scaler, reporter)
    }

    /// Persist a round's model into the configured output directory
    pub fn save(&self, outcome: &RoundOutcome) -> Result<PathBuf> {
        save_model(&outcome.trained, &outcome.result, &self.config().output_dir)
    }

    /// Prompt for models until the user stops.
    ///
    /// Unknown identifiers are logged and re-prompted. Round errors are
    /// logged and the loop goes on to ask whether to continue; only fatal
    /// errors and prompt failures end it early.
    pub fn run_loop(
        &self,
        prompter: &mut dyn Prompter,
        reporter: &dyn PredictionReporter,
    ) -> Result<SessionSummary> {
        let mut summary = SessionSummary::default();

        loop {
            let identifier = prompter.model_identifier()?;
            let kind = match ModelKind::parse(&identifier) {
                Some(kind) => kind,
                None => {
                    error!(model = %identifier.trim(), "Unknown model type.");
                    summary.failed_rounds += 1;
                    continue;
                }
            };

            let alpha = if kind.takes_alpha() {
                Some(prompter.alpha(kind.identifier(), self.config().default_alpha)?)
            } else {
                None
            };
            let spec = self.spec_for(kind, alpha);

            match self.run_round(&spec, reporter) {
                Ok(outcome) => {
                    if prompter.confirm_save()? {
                        match self.save(&outcome) {
                            Ok(path) => summary.saved.push(path),
                            Err(e) => warn!(error = %e, "Could not save model"),
                        }
                    }
                    summary.results.push(outcome.result);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!(model = %kind, error = %e, "Round failed");
                    summary.failed_rounds += 1;
                }
            }

            if !prompter.confirm_continue()? {
                break;
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::NullReporter;
    use polars::prelude::*;

    fn dataset() -> Dataset {
        let a: Vec<f64> = (0..40).map(|i| i as f64).collect();
        let b: Vec<f64> = (0..40).map(|i| ((i * 3) % 7) as f64).collect();
        let y: Vec<f64> = a.iter().zip(&b).map(|(a, b)| a + 2.0 * b).collect();
        Dataset::new(df!("a" => a, "b" => b, "Price" => y).unwrap())
    }

    #[test]
    fn test_prepare_resolves_target_case_insensitively() {
        let session = Session::prepare(&dataset(), "price", ImputationPolicy::Drop, EvaluatorConfig::default()).unwrap();
        assert_eq!(session.split().target_name(), "Price");
        assert_eq!(session.split().n_test(), 8);
    }

    #[test]
    fn test_missing_target_is_fatal() {
        let err = Session::prepare(&dataset(), "cost", ImputationPolicy::Drop, EvaluatorConfig::default()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_unknown_model_is_reprompted() {
        let session = Session::prepare(&dataset(), "price", ImputationPolicy::Mean, EvaluatorConfig::default()).unwrap();
        let mut prompter = ScriptedPrompter::new().with_models(["foo", "linear"]);
        let summary = session.run_loop(&mut prompter, &NullReporter).unwrap();

        assert_eq!(summary.failed_rounds, 1);
        assert_eq!(summary.results.len(), 1);
        assert_eq!(summary.results[0].model, ModelKind::Linear);
        assert_eq!(prompter.remaining_models(), 0);
    }

    #[test]
    fn test_empty_feature_column_is_dropped_by_fill_policies() {
        let mut df = dataset().into_frame();
        df.with_column(Series::new("notes".into(), vec![None::<&str>; 40])).unwrap();
        let ds = Dataset::new(df);

        let session = Session::prepare(&ds, "price", ImputationPolicy::Mean, EvaluatorConfig::default()).unwrap();
        assert_eq!(session.split().n_train() + session.split().n_test(), 40);
        assert_eq!(session.split().feature_names(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_empty_target_column_is_fatal() {
        let mut df = dataset().into_frame();
        df.with_column(Series::new("Empty".into(), vec![None::<f64>; 40])).unwrap();
        let err = Session::prepare(&Dataset::new(df), "empty", ImputationPolicy::Median, EvaluatorConfig::default())
            .unwrap_err();
        assert!(matches!(err, EvaluatorError::DataError(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_alpha_reaches_the_model() {
        let session = Session::prepare(&dataset(), "price", ImputationPolicy::Drop, EvaluatorConfig::default()).unwrap();
        assert_eq!(session.spec_for(ModelKind::Lasso, Some(0.25)).alpha, 0.25);
        assert_eq!(session.spec_for(ModelKind::Lasso, None).alpha, 1.0);
    }
}
