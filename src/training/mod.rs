//! Model training module
//!
//! - Linear models (OLS, Ridge, Lasso, Polynomial)
//! - Multinomial logistic regression
//! - Model factory keyed by identifier
//! - K-fold and stratified k-fold cross-validation
//! - Regression and classification metrics
//! - Target discretization for classifiers

pub mod cross_validation;
pub mod discretizer;
pub mod factory;
pub mod linear_models;
pub mod logistic;
pub mod metrics;

pub use cross_validation::{cross_val_score, CVResults, CVSplit, CVStrategy, CrossValidator};
pub use discretizer::{is_continuous, TargetDiscretizer};
pub use factory::{create_model, Model, ModelKind, ModelSpec, TaskKind};
pub use linear_models::{
    LassoRegression, LinearRegression, PolynomialFeatures, PolynomialRegression, RidgeRegression,
};
pub use logistic::LogisticRegression;

use crate::error::Result;
use ndarray::{Array1, Array2};

/// Common interface of every trainable model
pub trait Estimator: Send + Sync {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Make predictions
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    fn is_fitted(&self) -> bool;
}
