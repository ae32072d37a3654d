//! Feature standardization

use crate::error::{EvaluatorError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Per-column parameters learned during fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    /// Column means
    pub center: Array1<f64>,
    /// Column standard deviations (1.0 for constant columns)
    pub scale: Array1<f64>,
}

/// Standard (z-score) scaler: `(x - mean) / std`.
///
/// Uses the population standard deviation. Parameters come from the data
/// passed to [`StandardScaler::fit`] only; `transform` never changes them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    feature_names: Vec<String>,
    params: Option<ScalerParams>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach column names so diagnostics can name offending columns
    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = names;
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.params.is_some()
    }

    pub fn params(&self) -> Option<&ScalerParams> {
        self.params.as_ref()
    }

    /// Learn column means and standard deviations
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(EvaluatorError::ValidationError(
                "cannot fit scaler on an empty matrix".to_string(),
            ));
        }

        let center = x
            .mean_axis(Axis(0))
            .ok_or_else(|| EvaluatorError::NumericError("empty axis".to_string()))?;
        let mut scale = x.std_axis(Axis(0), 0.0);

        for (j, s) in scale.iter_mut().enumerate() {
            if *s == 0.0 || !s.is_finite() {
                warn!(
                    column = %self.column_label(j),
                    "Zero-variance feature, using unit scale"
                );
                *s = 1.0;
            }
        }

        self.params = Some(ScalerParams { center, scale });
        Ok(self)
    }

    /// Apply the learned transform
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let params = self.params.as_ref().ok_or(EvaluatorError::ModelNotFitted)?;
        self.check_width(x, params)?;
        Ok((x - &params.center) / &params.scale)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Map standardized values back to the original units
    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let params = self.params.as_ref().ok_or(EvaluatorError::ModelNotFitted)?;
        self.check_width(x, params)?;
        Ok(x * &params.scale + &params.center)
    }

    fn check_width(&self, x: &Array2<f64>, params: &ScalerParams) -> Result<()> {
        if x.ncols() != params.center.len() {
            return Err(EvaluatorError::ShapeError {
                expected: format!("{} columns", params.center.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        Ok(())
    }

    fn column_label(&self, j: usize) -> String {
        self.feature_names
            .get(j)
            .cloned()
            .unwrap_or_else(|| format!("#{}", j))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standard_scaler() {
        let x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0], [5.0, 50.0]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        for col in scaled.columns() {
            assert!(col.mean().unwrap().abs() < 1e-10);
            assert!((col.var(0.0) - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_zero_variance_column_is_centered_only() {
        let x = array![[1.0, 7.0], [2.0, 7.0], [3.0, 7.0]];
        let mut scaler = StandardScaler::new().with_feature_names(vec!["a".into(), "flat".into()]);
        let scaled = scaler.fit_transform(&x).unwrap();

        assert_eq!(scaler.params().unwrap().scale[1], 1.0);
        assert!(scaled.column(1).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_transform_does_not_refit() {
        let train = array![[0.0], [2.0], [4.0]];
        let test = array![[100.0], [200.0]];
        let mut scaler = StandardScaler::new();
        scaler.fit(&train).unwrap();
        let before = scaler.params().unwrap().clone();

        let scaled = scaler.transform(&test).unwrap();
        assert_eq!(scaler.params().unwrap(), &before);
        assert!((scaled[[0, 0]] - (100.0 - 2.0) / before.scale[0]).abs() < 1e-12);
    }

    #[test]
    fn test_inverse_transform() {
        let x = array![[1.0, -3.0], [2.0, 0.5], [6.0, 9.0]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();
        let restored = scaler.inverse_transform(&scaled).unwrap();

        for (o, r) in x.iter().zip(restored.iter()) {
            assert!((o - r).abs() < 1e-10);
        }
    }

    #[test]
    fn test_width_mismatch() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&array![[1.0]]),
            Err(EvaluatorError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_transform_requires_fit() {
        let scaler = StandardScaler::new();
        assert!(matches!(
            scaler.transform(&array![[1.0]]),
            Err(EvaluatorError::ModelNotFitted)
        ));
    }
}
