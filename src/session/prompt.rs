//! Prompt boundary between the session loop and whoever answers it

use crate::error::{EvaluatorError, Result};
use crate::preprocessing::ImputationPolicy;
use std::collections::VecDeque;

/// Source of the user's decisions during a session.
///
/// Implementations return already-typed values; parsing and re-asking on
/// malformed input happen on their side of the boundary.
pub trait Prompter {
    /// How missing values should be handled
    fn imputation_policy(&mut self) -> Result<ImputationPolicy>;

    /// Raw model identifier; the session decides whether it is known
    fn model_identifier(&mut self) -> Result<String>;

    /// Regularization strength for `model`, falling back to `default`
    fn alpha(&mut self, model: &str, default: f64) -> Result<f64>;

    fn confirm_save(&mut self) -> Result<bool>;

    fn confirm_continue(&mut self) -> Result<bool>;
}

/// Prompter that replays queued answers, for tests and batch runs.
///
/// Running out of model identifiers is an error; the other queues fall back
/// to the policy's default, the supplied alpha, "don't save" and "stop".
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompter {
    policy: Option<ImputationPolicy>,
    models: VecDeque<String>,
    alphas: VecDeque<f64>,
    saves: VecDeque<bool>,
    continues: VecDeque<bool>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: ImputationPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models.extend(models.into_iter().map(Into::into));
        self
    }

    pub fn with_alphas(mut self, alphas: impl IntoIterator<Item = f64>) -> Self {
        self.alphas.extend(alphas);
        self
    }

    pub fn with_saves(mut self, saves: impl IntoIterator<Item = bool>) -> Self {
        self.saves.extend(saves);
        self
    }

    pub fn with_continues(mut self, continues: impl IntoIterator<Item = bool>) -> Self {
        self.continues.extend(continues);
        self
    }

    /// Model identifiers not consumed yet
    pub fn remaining_models(&self) -> usize {
        self.models.len()
    }
}

impl Prompter for ScriptedPrompter {
    fn imputation_policy(&mut self) -> Result<ImputationPolicy> {
        Ok(self.policy.unwrap_or(ImputationPolicy::Drop))
    }

    fn model_identifier(&mut self) -> Result<String> {
        self.models.pop_front().ok_or_else(|| {
            EvaluatorError::ConfigError("no scripted model identifier left".to_string())
        })
    }

    fn alpha(&mut self, _model: &str, default: f64) -> Result<f64> {
        Ok(self.alphas.pop_front().unwrap_or(default))
    }

    fn confirm_save(&mut self) -> Result<bool> {
        Ok(self.saves.pop_front().unwrap_or(false))
    }

    fn confirm_continue(&mut self) -> Result<bool> {
        Ok(self.continues.pop_front().unwrap_or(false))
    }
}
