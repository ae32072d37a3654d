//! Multinomial logistic regression

use super::Estimator;
use crate::error::{EvaluatorError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Softmax classifier trained by full-batch gradient descent.
///
/// Minimizes the mean cross-entropy plus `||W||^2 / (2 * C * n)`, which is the
/// usual `C`-parameterized L2 penalty rescaled to the mean loss. Labels are the
/// distinct values seen in `y`; predictions are always one of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Sorted distinct labels seen during fit
    pub classes: Vec<f64>,
    /// Weights, shape (n_features, n_classes)
    pub coefficients: Option<Array2<f64>>,
    /// Per-class bias
    pub intercepts: Option<Array1<f64>>,
    /// Inverse regularization strength
    pub c: f64,
    pub max_iter: usize,
    /// Stop once the gradient's max-norm falls below this
    pub tol: f64,
    /// Fixed step size; derived from the data when `None`
    pub learning_rate: Option<f64>,
    /// Iterations used by the last fit
    pub n_iter: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl LogisticRegression {
    pub fn new(max_iter: usize) -> Self {
        Self {
            classes: Vec::new(),
            coefficients: None,
            intercepts: None,
            c: 1.0,
            max_iter,
            tol: 1e-6,
            learning_rate: None,
            n_iter: 0,
        }
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = Some(lr);
        self
    }

    /// Row-wise softmax, shifted by each row's max for stability
    fn softmax(logits: &mut Array2<f64>) {
        for mut row in logits.rows_mut() {
            let max = row.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
            row.mapv_inplace(|v| (v - max).exp());
            let sum = row.sum();
            row.mapv_inplace(|v| v / sum);
        }
    }

    fn logits(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (w, b) = match (&self.coefficients, &self.intercepts) {
            (Some(w), Some(b)) => (w, b),
            _ => return Err(EvaluatorError::ModelNotFitted),
        };
        if x.ncols() != w.nrows() {
            return Err(EvaluatorError::ShapeError {
                expected: format!("{} features", w.nrows()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x.dot(w) + b)
    }

    /// Class membership probabilities, columns ordered like `classes`
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let mut probs = self.logits(x)?;
        Self::softmax(&mut probs);
        Ok(probs)
    }

    /// Step size from an upper bound on the loss's Lipschitz constant:
    /// `(trace(X^T X) / n + 1) / 2 + 1 / (C n)` bounds the softmax Hessian,
    /// the `+ 1` accounting for the bias column.
    fn step_size(&self, x: &Array2<f64>) -> f64 {
        if let Some(lr) = self.learning_rate {
            return lr;
        }
        let n = x.nrows() as f64;
        let trace = x.iter().map(|v| v * v).sum::<f64>() / n;
        let lipschitz = 0.5 * (trace + 1.0) + 1.0 / (self.c * n);
        1.0 / lipschitz
    }
}

impl Estimator for LogisticRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(EvaluatorError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(EvaluatorError::TrainingError(
                "class labels must be finite".to_string(),
            ));
        }
        if self.c <= 0.0 || !self.c.is_finite() {
            return Err(EvaluatorError::InvalidParameter {
                name: "C".to_string(),
                value: self.c.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let mut classes: Vec<f64> = y.to_vec();
        classes.sort_by(|a, b| a.total_cmp(b));
        classes.dedup();
        if classes.len() < 2 {
            return Err(EvaluatorError::TrainingError(format!(
                "logistic regression needs at least 2 classes, found {}",
                classes.len()
            )));
        }

        let n = x.nrows();
        let k = classes.len();
        let nf = n as f64;

        let mut targets = Array2::<f64>::zeros((n, k));
        for (i, label) in y.iter().enumerate() {
            if let Ok(c) = classes.binary_search_by(|known| known.total_cmp(label)) {
                targets[[i, c]] = 1.0;
            }
        }

        let lr = self.step_size(x);
        let penalty = 1.0 / (self.c * nf);
        let mut w = Array2::<f64>::zeros((x.ncols(), k));
        let mut b = Array1::<f64>::zeros(k);
        let mut converged = false;
        let mut iterations = 0;

        for iter in 0..self.max_iter {
            iterations = iter + 1;
            let mut probs = x.dot(&w) + &b;
            Self::softmax(&mut probs);
            let residual = probs - &targets;

            let grad_w = x.t().dot(&residual) / nf + &w * penalty;
            let grad_b = residual.sum_axis(Axis(0)) / nf;

            let grad_norm = grad_w
                .iter()
                .chain(grad_b.iter())
                .fold(0.0f64, |m, g| m.max(g.abs()));
            if grad_norm < self.tol {
                converged = true;
                break;
            }

            w.scaled_add(-lr, &grad_w);
            b.scaled_add(-lr, &grad_b);
        }

        if !converged {
            warn!(
                max_iter = self.max_iter,
                "Logistic regression did not converge; consider scaling features or raising max_iter"
            );
        }
        debug!(iterations, classes = k, "Fitted logistic regression");

        self.classes = classes;
        self.coefficients = Some(w);
        self.intercepts = Some(b);
        self.n_iter = iterations;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let logits = self.logits(x)?;
        Ok(logits
            .rows()
            .into_iter()
            .map(|row| {
                let best = row
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                self.classes[best]
            })
            .collect())
    }

    fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }
}
