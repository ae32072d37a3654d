//! Equal-width binning of a continuous target for classification

use crate::error::{EvaluatorError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// True when any value has a fractional part (or is not finite)
pub fn is_continuous(y: &Array1<f64>) -> bool {
    y.iter().any(|v| !v.is_finite() || v.fract() != 0.0)
}

/// Maps a continuous target onto `n_bins` integer labels.
///
/// Edges are `linspace(0, max, n_bins + 1)` where `max` is the largest training
/// target. Bins are closed on the left; the last bin also contains `max`.
/// Values below 0 land in bin 0 and values above `max` in the last bin, so
/// labels are always `0..n_bins`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetDiscretizer {
    edges: Vec<f64>,
}

impl TargetDiscretizer {
    /// Derive the bin edges from training targets
    pub fn fit(y_train: &Array1<f64>, n_bins: usize) -> Result<Self> {
        if n_bins == 0 {
            return Err(EvaluatorError::InvalidParameter {
                name: "n_bins".to_string(),
                value: "0".to_string(),
                reason: "at least one bin is required".to_string(),
            });
        }
        if y_train.is_empty() {
            return Err(EvaluatorError::NumericError(
                "cannot discretize an empty target".to_string(),
            ));
        }

        let max = y_train.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
        if !max.is_finite() || max <= 0.0 {
            return Err(EvaluatorError::NumericError(format!(
                "target maximum {} gives degenerate bins over [0, max]",
                max
            )));
        }

        let edges = (0..=n_bins)
            .map(|i| max * i as f64 / n_bins as f64)
            .collect();
        Ok(Self { edges })
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }

    /// Label for a single value
    pub fn bin(&self, value: f64) -> usize {
        // interior edges at or below the value
        let interior = &self.edges[1..self.n_bins()];
        interior.partition_point(|edge| *edge <= value)
    }

    pub fn transform(&self, y: &Array1<f64>) -> Array1<f64> {
        y.mapv(|v| self.bin(v) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_edges_follow_linspace() {
        let d = TargetDiscretizer::fit(&array![1.0, 10.0, 4.5], 4).unwrap();
        assert_eq!(d.edges(), &[0.0, 2.5, 5.0, 7.5, 10.0]);
        assert_eq!(d.n_bins(), 4);
    }

    #[test]
    fn test_bins_are_left_closed_and_last_is_closed() {
        let d = TargetDiscretizer::fit(&array![10.0], 4).unwrap();
        assert_eq!(d.bin(0.0), 0);
        assert_eq!(d.bin(2.49), 0);
        assert_eq!(d.bin(2.5), 1);
        assert_eq!(d.bin(7.5), 3);
        assert_eq!(d.bin(10.0), 3);
    }

    #[test]
    fn test_out_of_range_values_clamp() {
        let d = TargetDiscretizer::fit(&array![3.0, 10.0], 4).unwrap();
        assert_eq!(d.bin(-5.0), 0);
        assert_eq!(d.bin(12.0), 3);
        let labels = d.transform(&array![-1.0, 0.5, 5.2, 99.0]);
        assert_eq!(labels, array![0.0, 0.0, 2.0, 3.0]);
    }

    #[test]
    fn test_non_positive_max_fails() {
        assert!(matches!(
            TargetDiscretizer::fit(&array![-3.0, 0.0], 4),
            Err(EvaluatorError::NumericError(_))
        ));
        assert!(TargetDiscretizer::fit(&Array1::zeros(0), 4).is_err());
    }

    #[test]
    fn test_is_continuous() {
        assert!(is_continuous(&array![1.0, 2.5]));
        assert!(!is_continuous(&array![0.0, 3.0, 7.0]));
    }
}
