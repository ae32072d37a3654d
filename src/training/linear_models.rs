//! Linear regression family: OLS, Ridge, Lasso and polynomial OLS

use super::Estimator;
use crate::error::{EvaluatorError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Forward/backward substitution on a Cholesky factor. `None` if `a` is not
/// positive definite.
fn cholesky_factor_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let sum: f64 = (0..i).map(|j| l[[i, j]] * y[j]).sum();
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // L^T x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum: f64 = ((i + 1)..n).map(|j| l[[j, i]] * x[j]).sum();
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Solve symmetric positive-definite `A x = b`. Retries once with a small
/// diagonal jitter when `A` is only semi-definite.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }
    if let Some(x) = cholesky_factor_solve(a, b) {
        return Some(x);
    }

    let jitter = 1e-8 * a.diag().iter().map(|v| v.abs()).sum::<f64>() / n.max(1) as f64;
    if jitter <= 0.0 {
        return None;
    }
    let mut a_reg = a.clone();
    a_reg.diag_mut().mapv_inplace(|v| v + jitter);
    cholesky_factor_solve(&a_reg, b)
}

/// Matrix inversion by Gauss-Jordan elimination with partial pivoting
fn matrix_inverse(m: &Array2<f64>) -> Option<Array2<f64>> {
    let n = m.nrows();
    if n != m.ncols() {
        return None;
    }

    // [M | I]
    let mut aug = Array2::<f64>::zeros((n, 2 * n));
    aug.slice_mut(ndarray::s![.., ..n]).assign(m);
    for i in 0..n {
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&a, &b| aug[[a, col]].abs().total_cmp(&aug[[b, col]].abs()))
            .unwrap_or(col);
        if pivot_row != col {
            for j in 0..2 * n {
                aug.swap([col, j], [pivot_row, j]);
            }
        }

        let pivot = aug[[col, col]];
        if pivot.abs() < 1e-10 {
            return None;
        }
        aug.row_mut(col).mapv_inplace(|v| v / pivot);

        let pivot_values = aug.row(col).to_owned();
        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                if factor != 0.0 {
                    aug.row_mut(row).scaled_add(-factor, &pivot_values);
                }
            }
        }
    }

    Some(aug.slice(ndarray::s![.., n..]).to_owned())
}

/// Solve `(X^T X + alpha I) w = X^T y`
fn solve_normal_equations(x: &Array2<f64>, y: &Array1<f64>, alpha: f64) -> Result<Array1<f64>> {
    let mut xtx = x.t().dot(x);
    if alpha > 0.0 {
        xtx.diag_mut().mapv_inplace(|v| v + alpha);
    }
    let xty = x.t().dot(y);

    if let Some(w) = cholesky_solve(&xtx, &xty) {
        return Ok(w);
    }
    matrix_inverse(&xtx)
        .map(|inv| inv.dot(&xty))
        .ok_or_else(|| EvaluatorError::NumericError("normal equations are singular".to_string()))
}

fn check_samples(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(EvaluatorError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(EvaluatorError::TrainingError("no training samples".to_string()));
    }
    Ok(())
}

/// Data centered on its column means, with the means kept to recover the intercept
struct Centered {
    x: Array2<f64>,
    y: Array1<f64>,
    x_mean: Array1<f64>,
    y_mean: f64,
}

impl Centered {
    fn new(x: &Array2<f64>, y: &Array1<f64>, fit_intercept: bool) -> Self {
        if !fit_intercept {
            return Self {
                x: x.clone(),
                y: y.clone(),
                x_mean: Array1::zeros(x.ncols()),
                y_mean: 0.0,
            };
        }
        let x_mean = x
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(x.ncols()));
        let y_mean = y.mean().unwrap_or(0.0);
        Self {
            x: x - &x_mean,
            y: y - y_mean,
            x_mean,
            y_mean,
        }
    }

    fn intercept(&self, w: &Array1<f64>) -> f64 {
        self.y_mean - w.dot(&self.x_mean)
    }
}

fn linear_predict(coefficients: &Option<Array1<f64>>, intercept: f64, x: &Array2<f64>) -> Result<Array1<f64>> {
    let w = coefficients.as_ref().ok_or(EvaluatorError::ModelNotFitted)?;
    if x.ncols() != w.len() {
        return Err(EvaluatorError::ShapeError {
            expected: format!("{} features", w.len()),
            actual: format!("{} features", x.ncols()),
        });
    }
    Ok(x.dot(w) + intercept)
}

/// Ordinary least squares
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted coefficients (weights)
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept (bias)
    pub intercept: f64,
    /// Whether to fit intercept
    pub fit_intercept: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            fit_intercept: true,
        }
    }

    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }
}

impl Estimator for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_samples(x, y)?;
        let data = Centered::new(x, y, self.fit_intercept);
        let w = solve_normal_equations(&data.x, &data.y, 0.0)?;
        self.intercept = data.intercept(&w);
        self.coefficients = Some(w);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        linear_predict(&self.coefficients, self.intercept, x)
    }

    fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }
}

/// Ridge regression: least squares with an L2 penalty `alpha * ||w||^2`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidgeRegression {
    pub coefficients: Option<Array1<f64>>,
    pub intercept: f64,
    pub fit_intercept: bool,
    /// L2 regularization strength
    pub alpha: f64,
}

impl Default for RidgeRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl RidgeRegression {
    pub fn new(alpha: f64) -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            fit_intercept: true,
            alpha,
        }
    }
}

impl Estimator for RidgeRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_samples(x, y)?;
        let data = Centered::new(x, y, self.fit_intercept);
        let w = solve_normal_equations(&data.x, &data.y, self.alpha)?;
        self.intercept = data.intercept(&w);
        self.coefficients = Some(w);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        linear_predict(&self.coefficients, self.intercept, x)
    }

    fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }
}

/// Lasso regression, minimizing `(1/2n) ||y - Xw||^2 + alpha * ||w||_1` by
/// coordinate descent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LassoRegression {
    pub coefficients: Option<Array1<f64>>,
    pub intercept: f64,
    pub fit_intercept: bool,
    /// L1 regularization strength
    pub alpha: f64,
    pub max_iter: usize,
    pub tol: f64,
    /// Coordinate-descent sweeps run by the last fit
    pub n_iter: usize,
}

impl Default for LassoRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl LassoRegression {
    pub fn new(alpha: f64) -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            fit_intercept: true,
            alpha,
            max_iter: 1000,
            tol: 1e-6,
            n_iter: 0,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Proximal operator of the L1 norm
    fn soft_threshold(val: f64, threshold: f64) -> f64 {
        if val > threshold {
            val - threshold
        } else if val < -threshold {
            val + threshold
        } else {
            0.0
        }
    }
}

impl Estimator for LassoRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_samples(x, y)?;
        let data = Centered::new(x, y, self.fit_intercept);
        let n_features = data.x.ncols();

        let col_norms: Vec<f64> = data
            .x
            .columns()
            .into_iter()
            .map(|c| c.dot(&c))
            .collect();
        let lambda = self.alpha * data.x.nrows() as f64;

        let mut w = Array1::<f64>::zeros(n_features);
        let mut residual = data.y.clone();
        let mut converged = false;
        let mut iterations = 0;

        for iter in 0..self.max_iter {
            iterations = iter + 1;
            let mut max_step = 0.0f64;

            for j in 0..n_features {
                if col_norms[j] < 1e-15 {
                    w[j] = 0.0;
                    continue;
                }
                let column = data.x.column(j);
                let rho = column.dot(&residual) + col_norms[j] * w[j];
                let updated = Self::soft_threshold(rho, lambda) / col_norms[j];
                let delta = w[j] - updated;
                if delta != 0.0 {
                    residual.scaled_add(delta, &column);
                    w[j] = updated;
                    max_step = max_step.max(delta.abs());
                }
            }

            if max_step < self.tol {
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(
                max_iter = self.max_iter,
                alpha = self.alpha,
                "Lasso coordinate descent did not converge; consider raising max_iter"
            );
        }

        self.intercept = data.intercept(&w);
        self.coefficients = Some(w);
        self.n_iter = iterations;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        linear_predict(&self.coefficients, self.intercept, x)
    }

    fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }
}

/// Expands features into every monomial up to a given degree
/// (`x_i`, `x_i * x_j` for `i <= j`, ...), without a bias column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolynomialFeatures {
    pub degree: usize,
    /// Column indices multiplied together for each output feature
    terms: Vec<Vec<usize>>,
    n_input_features: usize,
}

impl PolynomialFeatures {
    pub fn new(degree: usize) -> Self {
        Self {
            degree: degree.max(1),
            terms: Vec::new(),
            n_input_features: 0,
        }
    }

    pub fn fit(&mut self, n_features: usize) {
        let mut terms: Vec<Vec<usize>> = Vec::new();
        let mut current: Vec<Vec<usize>> = (0..n_features).map(|j| vec![j]).collect();
        terms.extend(current.iter().cloned());

        for _ in 2..=self.degree {
            let mut next = Vec::new();
            for term in &current {
                let start = term.last().copied().unwrap_or(0);
                for j in start..n_features {
                    let mut extended = term.clone();
                    extended.push(j);
                    next.push(extended);
                }
            }
            terms.extend(next.iter().cloned());
            current = next;
        }

        self.terms = terms;
        self.n_input_features = n_features;
    }

    pub fn n_output_features(&self) -> usize {
        self.terms.len()
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_input_features {
            return Err(EvaluatorError::ShapeError {
                expected: format!("{} features", self.n_input_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(Array2::from_shape_fn((x.nrows(), self.terms.len()), |(r, t)| {
            self.terms[t].iter().map(|&j| x[[r, j]]).product()
        }))
    }
}

/// Polynomial feature expansion followed by ordinary least squares, trained
/// and used as one model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolynomialRegression {
    pub features: PolynomialFeatures,
    pub inner: LinearRegression,
}

impl PolynomialRegression {
    pub fn new(degree: usize) -> Self {
        Self {
            features: PolynomialFeatures::new(degree),
            inner: LinearRegression::new(),
        }
    }

    pub fn degree(&self) -> usize {
        self.features.degree
    }
}

impl Estimator for PolynomialRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.features.fit(x.ncols());
        let expanded = self.features.transform(x)?;
        self.inner.fit(&expanded, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.inner.is_fitted() {
            return Err(EvaluatorError::ModelNotFitted);
        }
        let expanded = self.features.transform(x)?;
        self.inner.predict(&expanded)
    }

    fn is_fitted(&self) -> bool {
        self.inner.is_fitted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::metrics::r2_score;
    use ndarray::array;

    #[test]
    fn test_linear_regression_simple() {
        // y = 2*x1 + 3*x2 + 1
        let x = array![[1.0, 1.0], [2.0, 1.0], [1.0, 2.0], [2.0, 2.0], [3.0, 1.0]];
        let y = array![6.0, 8.0, 9.0, 11.0, 10.0];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        assert!(model.is_fitted());

        let w = model.coefficients.as_ref().unwrap();
        assert!((w[0] - 2.0).abs() < 1e-8);
        assert!((w[1] - 3.0).abs() < 1e-8);
        assert!((model.intercept - 1.0).abs() < 1e-8);
    }

    #[test]
    fn test_linear_regression_collinear_columns() {
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];
        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        let r2 = r2_score(&y, &model.predict(&x).unwrap()).unwrap();
        assert!(r2 > 0.99, "R² = {}", r2);
    }

    #[test]
    fn test_predict_before_fit() {
        let model = LinearRegression::new();
        assert!(matches!(
            model.predict(&array![[1.0]]),
            Err(EvaluatorError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_ridge_shrinks_coefficients() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];

        let mut ols = LinearRegression::new();
        ols.fit(&x, &y).unwrap();
        let mut ridge = RidgeRegression::new(10.0);
        ridge.fit(&x, &y).unwrap();

        let w_ols = ols.coefficients.as_ref().unwrap()[0];
        let w_ridge = ridge.coefficients.as_ref().unwrap()[0];
        assert!(w_ridge.abs() < w_ols.abs());
        // centered x has sum of squares 5, x^T y = 10: w = 10 / (5 + 10)
        assert!((w_ridge - 10.0 / 15.0).abs() < 1e-10);
    }

    #[test]
    fn test_lasso_regression() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];
        let mut model = LassoRegression::new(0.01);
        model.fit(&x, &y).unwrap();
        let r2 = r2_score(&y, &model.predict(&x).unwrap()).unwrap();
        assert!(r2 > 0.99, "Lasso R² = {}", r2);
        assert_eq!(model.coefficients.as_ref().unwrap()[1], 0.0);
    }

    #[test]
    fn test_lasso_large_alpha_zeroes_weights() {
        let x = array![[1.0, 5.0], [2.0, 3.0], [3.0, 4.0], [4.0, 1.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];
        let mut model = LassoRegression::new(100.0);
        model.fit(&x, &y).unwrap();
        assert!(model.coefficients.as_ref().unwrap().iter().all(|w| *w == 0.0));
        assert!((model.intercept - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_lasso_stops_at_max_iter() {
        let x = array![[1.0, 2.0], [2.0, 1.0], [3.0, 5.0], [4.0, 3.0], [5.0, 4.0]];
        let y = array![3.0, 3.5, 8.0, 7.0, 9.5];

        let mut capped = LassoRegression::new(0.01).with_max_iter(2);
        capped.fit(&x, &y).unwrap();
        assert_eq!(capped.n_iter, 2);
        assert!(capped.is_fitted());

        let mut full = LassoRegression::new(0.01);
        full.fit(&x, &y).unwrap();
        assert!(full.n_iter > 2 && full.n_iter < full.max_iter);
    }

    #[test]
    fn test_polynomial_feature_expansion() {
        let mut features = PolynomialFeatures::new(2);
        features.fit(2);
        // x1, x2, x1^2, x1*x2, x2^2
        assert_eq!(features.n_output_features(), 5);

        let expanded = features.transform(&array![[2.0, 3.0]]).unwrap();
        assert_eq!(expanded.row(0).to_vec(), vec![2.0, 3.0, 4.0, 6.0, 9.0]);
    }

    #[test]
    fn test_polynomial_regression_quadratic() {
        let x = array![[-2.0], [-1.0], [0.0], [1.0], [2.0], [3.0]];
        let y = x.column(0).mapv(|v| v * v - 2.0 * v + 1.0);
        let mut model = PolynomialRegression::new(2);
        model.fit(&x, &y).unwrap();

        let preds = model.predict(&x).unwrap();
        for (p, t) in preds.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-6);
        }
    }

    #[test]
    fn test_matrix_inverse() {
        let m = array![[4.0, 7.0], [2.0, 6.0]];
        let inv = matrix_inverse(&m).unwrap();
        let identity = m.dot(&inv);
        assert!((identity[[0, 0]] - 1.0).abs() < 1e-10);
        assert!(identity[[0, 1]].abs() < 1e-10);
        assert!(matrix_inverse(&array![[1.0, 2.0], [2.0, 4.0]]).is_none());
    }
}
