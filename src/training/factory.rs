//! Model identifiers, hyperparameters and construction of untrained models

use super::linear_models::{LassoRegression, LinearRegression, PolynomialRegression, RidgeRegression};
use super::logistic::LogisticRegression;
use super::Estimator;
use crate::config::EvaluatorConfig;
use crate::error::{EvaluatorError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a model predicts a continuous value or a class label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    Regression,
    Classification,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Regression => write!(f, "Regression"),
            TaskKind::Classification => write!(f, "Classification"),
        }
    }
}

/// Supported model families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    Linear,
    Ridge,
    Lasso,
    Polynomial,
    Logistic,
}

impl ModelKind {
    pub const ALL: [ModelKind; 5] = [
        ModelKind::Linear,
        ModelKind::Ridge,
        ModelKind::Lasso,
        ModelKind::Polynomial,
        ModelKind::Logistic,
    ];

    /// Case-insensitive lookup; `None` for unknown identifiers
    pub fn parse(identifier: &str) -> Option<Self> {
        match identifier.trim().to_lowercase().as_str() {
            "linear" => Some(ModelKind::Linear),
            "ridge" => Some(ModelKind::Ridge),
            "lasso" => Some(ModelKind::Lasso),
            "polynomial" => Some(ModelKind::Polynomial),
            "logistic" => Some(ModelKind::Logistic),
            _ => None,
        }
    }

    /// Lowercase identifier used on the command line and in file names
    pub fn identifier(&self) -> &'static str {
        match self {
            ModelKind::Linear => "linear",
            ModelKind::Ridge => "ridge",
            ModelKind::Lasso => "lasso",
            ModelKind::Polynomial => "polynomial",
            ModelKind::Logistic => "logistic",
        }
    }

    /// Capitalized name for titles and reports
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelKind::Linear => "Linear",
            ModelKind::Ridge => "Ridge",
            ModelKind::Lasso => "Lasso",
            ModelKind::Polynomial => "Polynomial",
            ModelKind::Logistic => "Logistic",
        }
    }

    pub fn task(&self) -> TaskKind {
        match self {
            ModelKind::Logistic => TaskKind::Classification,
            _ => TaskKind::Regression,
        }
    }

    /// Ridge and lasso take a regularization strength
    pub fn takes_alpha(&self) -> bool {
        matches!(self, ModelKind::Ridge | ModelKind::Lasso)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for ModelKind {
    type Err = EvaluatorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| EvaluatorError::UnknownModel(s.trim().to_string()))
    }
}

/// A model kind together with its hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub kind: ModelKind,
    /// Regularization strength (ridge, lasso)
    pub alpha: f64,
    /// Expansion degree (polynomial)
    pub degree: usize,
    /// Iteration cap (logistic)
    pub max_iter: usize,
}

impl ModelSpec {
    pub fn new(kind: ModelKind) -> Self {
        Self {
            kind,
            alpha: 1.0,
            degree: 2,
            max_iter: 10_000,
        }
    }

    /// Defaults taken from the evaluator configuration
    pub fn from_config(kind: ModelKind, config: &EvaluatorConfig) -> Self {
        Self {
            kind,
            alpha: config.default_alpha,
            degree: config.polynomial_degree,
            max_iter: config.logistic_max_iter,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_degree(mut self, degree: usize) -> Self {
        self.degree = degree;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn task(&self) -> TaskKind {
        self.kind.task()
    }

    /// Check the hyperparameters that apply to this kind
    pub fn validate(&self) -> Result<()> {
        if self.kind.takes_alpha() && !(self.alpha.is_finite() && self.alpha >= 0.0) {
            return Err(EvaluatorError::InvalidParameter {
                name: "alpha".to_string(),
                value: self.alpha.to_string(),
                reason: "must be a finite, non-negative number".to_string(),
            });
        }
        if self.kind == ModelKind::Polynomial && self.degree == 0 {
            return Err(EvaluatorError::InvalidParameter {
                name: "degree".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.kind == ModelKind::Logistic && self.max_iter == 0 {
            return Err(EvaluatorError::InvalidParameter {
                name: "max_iter".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Construct a fresh, untrained model
    pub fn build(&self) -> Model {
        match self.kind {
            ModelKind::Linear => Model::Linear(LinearRegression::new()),
            ModelKind::Ridge => Model::Ridge(RidgeRegression::new(self.alpha)),
            ModelKind::Lasso => Model::Lasso(LassoRegression::new(self.alpha)),
            ModelKind::Polynomial => Model::Polynomial(PolynomialRegression::new(self.degree)),
            ModelKind::Logistic => Model::Logistic(LogisticRegression::new(self.max_iter)),
        }
    }

    /// Hyperparameters relevant to this kind, for reports and saved metadata
    pub fn hyperparameters(&self) -> Vec<(String, String)> {
        match self.kind {
            ModelKind::Linear => Vec::new(),
            ModelKind::Ridge | ModelKind::Lasso => vec![("alpha".to_string(), self.alpha.to_string())],
            ModelKind::Polynomial => vec![("degree".to_string(), self.degree.to_string())],
            ModelKind::Logistic => vec![
                ("max_iter".to_string(), self.max_iter.to_string()),
                ("multi_class".to_string(), "multinomial".to_string()),
            ],
        }
    }
}

/// Untrained model for an identifier with default hyperparameters, or `None`
/// when the identifier is unknown
pub fn create_model(identifier: &str, alpha: Option<f64>) -> Option<Model> {
    let kind = ModelKind::parse(identifier)?;
    let mut spec = ModelSpec::new(kind);
    if let Some(alpha) = alpha {
        spec = spec.with_alpha(alpha);
    }
    Some(spec.build())
}

/// Any model the factory can produce
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Model {
    Linear(LinearRegression),
    Ridge(RidgeRegression),
    Lasso(LassoRegression),
    Polynomial(PolynomialRegression),
    Logistic(LogisticRegression),
}

impl Model {
    pub fn kind(&self) -> ModelKind {
        match self {
            Model::Linear(_) => ModelKind::Linear,
            Model::Ridge(_) => ModelKind::Ridge,
            Model::Lasso(_) => ModelKind::Lasso,
            Model::Polynomial(_) => ModelKind::Polynomial,
            Model::Logistic(_) => ModelKind::Logistic,
        }
    }

    fn as_estimator(&self) -> &dyn Estimator {
        match self {
            Model::Linear(m) => m,
            Model::Ridge(m) => m,
            Model::Lasso(m) => m,
            Model::Polynomial(m) => m,
            Model::Logistic(m) => m,
        }
    }

    fn as_estimator_mut(&mut self) -> &mut dyn Estimator {
        match self {
            Model::Linear(m) => m,
            Model::Ridge(m) => m,
            Model::Lasso(m) => m,
            Model::Polynomial(m) => m,
            Model::Logistic(m) => m,
        }
    }
}

impl Estimator for Model {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.as_estimator_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.as_estimator().predict(x)
    }

    fn is_fitted(&self) -> bool {
        self.as_estimator().is_fitted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(ModelKind::parse("Ridge"), Some(ModelKind::Ridge));
        assert_eq!(ModelKind::parse("  LOGISTIC "), Some(ModelKind::Logistic));
        assert_eq!(ModelKind::parse("foo"), None);
        assert!(matches!(
            "foo".parse::<ModelKind>(),
            Err(EvaluatorError::UnknownModel(ref id)) if id == "foo"
        ));
    }

    #[test]
    fn test_task_is_tagged_on_kind() {
        for kind in ModelKind::ALL {
            let expected = if kind == ModelKind::Logistic {
                TaskKind::Classification
            } else {
                TaskKind::Regression
            };
            assert_eq!(kind.task(), expected);
            assert_eq!(ModelKind::parse(kind.identifier()), Some(kind));
        }
    }

    #[test]
    fn test_create_model() {
        let model = create_model("lasso", Some(0.5)).unwrap();
        match model {
            Model::Lasso(ref m) => assert_eq!(m.alpha, 0.5),
            other => panic!("unexpected model {:?}", other.kind()),
        }
        assert!(!model.is_fitted());
        assert!(create_model("svm", None).is_none());
    }

    #[test]
    fn test_logistic_default_iteration_cap() {
        match ModelSpec::new(ModelKind::Logistic).build() {
            Model::Logistic(m) => assert_eq!(m.max_iter, 10_000),
            other => panic!("unexpected model {:?}", other.kind()),
        }
    }

    #[test]
    fn test_validate_rejects_negative_alpha() {
        let spec = ModelSpec::new(ModelKind::Ridge).with_alpha(-1.0);
        assert!(matches!(
            spec.validate(),
            Err(EvaluatorError::InvalidParameter { .. })
        ));
        // alpha is irrelevant for OLS
        assert!(ModelSpec::new(ModelKind::Linear).with_alpha(-1.0).validate().is_ok());
    }

    #[test]
    fn test_model_dispatch() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![1.0, 3.0, 5.0, 7.0];
        let mut model = ModelSpec::new(ModelKind::Linear).build();
        model.fit(&x, &y).unwrap();
        let preds = model.predict(&array![[4.0]]).unwrap();
        assert!((preds[0] - 9.0).abs() < 1e-9);
    }
}
