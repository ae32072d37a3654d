//! Cross-validation splitters and fold scoring

use super::factory::{ModelSpec, TaskKind};
use super::metrics::{r2_score, rounded_accuracy};
use super::Estimator;
use crate::error::{EvaluatorError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Cross-validation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CVStrategy {
    /// Contiguous folds over the sample order
    KFold { n_splits: usize, shuffle: bool },
    /// Folds that keep each class's share roughly constant
    StratifiedKFold { n_splits: usize, shuffle: bool },
}

impl CVStrategy {
    /// Plain k-fold for regression, stratified k-fold for classification
    pub fn for_task(task: TaskKind, n_splits: usize, shuffle: bool) -> Self {
        match task {
            TaskKind::Regression => CVStrategy::KFold { n_splits, shuffle },
            TaskKind::Classification => CVStrategy::StratifiedKFold { n_splits, shuffle },
        }
    }

    pub fn n_splits(&self) -> usize {
        match self {
            CVStrategy::KFold { n_splits, .. } | CVStrategy::StratifiedKFold { n_splits, .. } => {
                *n_splits
            }
        }
    }
}

impl Default for CVStrategy {
    fn default() -> Self {
        CVStrategy::KFold { n_splits: 5, shuffle: false }
    }
}

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Cross-validation splitter
#[derive(Debug, Clone)]
pub struct CrossValidator {
    strategy: CVStrategy,
    random_state: u64,
}

impl CrossValidator {
    pub fn new(strategy: CVStrategy) -> Self {
        Self {
            strategy,
            random_state: 42,
        }
    }

    /// Seed used when the strategy shuffles
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn strategy(&self) -> CVStrategy {
        self.strategy
    }

    /// Generate train/test index splits in fold order
    pub fn split(&self, n_samples: usize, y: Option<&Array1<f64>>) -> Result<Vec<CVSplit>> {
        let n_splits = self.strategy.n_splits();
        if n_splits < 2 {
            return Err(EvaluatorError::ValidationError(
                "n_splits must be at least 2".to_string(),
            ));
        }
        if n_samples < n_splits {
            return Err(EvaluatorError::ValidationError(format!(
                "n_samples ({}) must be >= n_splits ({})",
                n_samples, n_splits
            )));
        }

        let folds = match self.strategy {
            CVStrategy::KFold { shuffle, .. } => self.k_fold(n_samples, n_splits, shuffle),
            CVStrategy::StratifiedKFold { shuffle, .. } => {
                let y = y.ok_or_else(|| {
                    EvaluatorError::ValidationError("StratifiedKFold requires target array".to_string())
                })?;
                if y.len() != n_samples {
                    return Err(EvaluatorError::ShapeError {
                        expected: format!("{} targets", n_samples),
                        actual: format!("{} targets", y.len()),
                    });
                }
                self.stratified_k_fold(y, n_splits, shuffle)
            }
        };

        if folds.iter().any(|f| f.is_empty()) {
            return Err(EvaluatorError::ValidationError(format!(
                "cannot build {} non-empty folds from {} samples",
                n_splits, n_samples
            )));
        }

        Ok(Self::folds_to_splits(folds))
    }

    fn rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.random_state)
    }

    /// Test folds: the first `n % k` folds get one extra sample
    fn k_fold(&self, n_samples: usize, n_splits: usize, shuffle: bool) -> Vec<Vec<usize>> {
        let mut indices: Vec<usize> = (0..n_samples).collect();
        if shuffle {
            indices.shuffle(&mut self.rng());
        }

        let base = n_samples / n_splits;
        let remainder = n_samples % n_splits;
        let mut folds = Vec::with_capacity(n_splits);
        let mut current = 0;
        for i in 0..n_splits {
            let size = if i < remainder { base + 1 } else { base };
            folds.push(indices[current..current + size].to_vec());
            current += size;
        }
        folds
    }

    /// Deal each class's samples round-robin across folds, continuing the
    /// rotation from one class to the next so fold sizes stay balanced.
    fn stratified_k_fold(&self, y: &Array1<f64>, n_splits: usize, shuffle: bool) -> Vec<Vec<usize>> {
        let mut class_indices: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (idx, &val) in y.iter().enumerate() {
            class_indices.entry(val.round() as i64).or_default().push(idx);
        }

        if shuffle {
            let mut rng = self.rng();
            for indices in class_indices.values_mut() {
                indices.shuffle(&mut rng);
            }
        }

        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); n_splits];
        let mut next_fold = 0;
        for indices in class_indices.values() {
            for &idx in indices {
                folds[next_fold].push(idx);
                next_fold = (next_fold + 1) % n_splits;
            }
        }
        for fold in &mut folds {
            fold.sort_unstable();
        }
        folds
    }

    fn folds_to_splits(folds: Vec<Vec<usize>>) -> Vec<CVSplit> {
        (0..folds.len())
            .map(|fold_idx| CVSplit {
                test_indices: folds[fold_idx].clone(),
                train_indices: folds
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != fold_idx)
                    .flat_map(|(_, f)| f.iter().copied())
                    .collect(),
                fold_idx,
            })
            .collect()
    }
}

/// Cross-validation results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CVResults {
    /// Scores for each fold, in fold order
    pub scores: Vec<f64>,
    pub mean_score: f64,
    /// Population standard deviation of the scores
    pub std_score: f64,
    pub n_folds: usize,
}

impl CVResults {
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len();
        if n_folds == 0 {
            return Self {
                scores,
                mean_score: f64::NAN,
                std_score: f64::NAN,
                n_folds,
            };
        }
        let mean_score = scores.iter().sum::<f64>() / n_folds as f64;
        let variance = scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n_folds as f64;

        Self {
            scores,
            mean_score,
            std_score: variance.sqrt(),
            n_folds,
        }
    }
}

/// Score a fresh model per fold: R² for regression, rounded-label accuracy
/// for classification. Folds are fitted in parallel; scores keep fold order.
pub fn cross_val_score(
    spec: &ModelSpec,
    x: &Array2<f64>,
    y: &Array1<f64>,
    cv: &CrossValidator,
) -> Result<CVResults> {
    if x.nrows() != y.len() {
        return Err(EvaluatorError::ShapeError {
            expected: format!("{} targets", x.nrows()),
            actual: format!("{} targets", y.len()),
        });
    }
    let splits = cv.split(x.nrows(), Some(y))?;
    let task = spec.task();

    let scores = splits
        .par_iter()
        .map(|split| -> Result<f64> {
            let x_train = x.select(Axis(0), &split.train_indices);
            let y_train = y.select(Axis(0), &split.train_indices);
            let x_val = x.select(Axis(0), &split.test_indices);
            let y_val = y.select(Axis(0), &split.test_indices);

            let mut model = spec.build();
            model.fit(&x_train, &y_train)?;
            let preds = model.predict(&x_val)?;

            let score = match task {
                TaskKind::Regression => r2_score(&y_val, &preds)?,
                TaskKind::Classification => rounded_accuracy(&y_val, &preds)?,
            };
            debug!(fold = split.fold_idx, score, "Scored fold");
            Ok(score)
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok(CVResults::from_scores(scores))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::factory::ModelKind;
    use std::collections::HashSet;

    #[test]
    fn test_k_fold() {
        let cv = CrossValidator::new(CVStrategy::KFold { n_splits: 5, shuffle: false });
        let splits = cv.split(100, None).unwrap();

        assert_eq!(splits.len(), 5);
        for split in &splits {
            assert_eq!(split.test_indices.len(), 20);
            assert_eq!(split.train_indices.len(), 80);
        }

        let mut all_test: Vec<usize> = splits.iter().flat_map(|s| s.test_indices.clone()).collect();
        all_test.sort();
        assert_eq!(all_test, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_unshuffled_k_fold_is_contiguous() {
        let cv = CrossValidator::new(CVStrategy::KFold { n_splits: 3, shuffle: false });
        let splits = cv.split(7, None).unwrap();
        assert_eq!(splits[0].test_indices, vec![0, 1, 2]);
        assert_eq!(splits[1].test_indices, vec![3, 4]);
        assert_eq!(splits[2].test_indices, vec![5, 6]);
    }

    #[test]
    fn test_shuffled_k_fold_is_seeded() {
        let cv = CrossValidator::new(CVStrategy::KFold { n_splits: 4, shuffle: true }).with_random_state(7);
        let a = cv.split(40, None).unwrap();
        let b = cv.split(40, None).unwrap();
        assert_eq!(a[0].test_indices, b[0].test_indices);
    }

    #[test]
    fn test_stratified_k_fold() {
        let y = Array1::from_vec(vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        let cv = CrossValidator::new(CVStrategy::StratifiedKFold { n_splits: 5, shuffle: false });
        let splits = cv.split(10, Some(&y)).unwrap();

        assert_eq!(splits.len(), 5);
        for split in &splits {
            assert_eq!(split.test_indices.len(), 2);
            let classes: HashSet<i64> = split.test_indices.iter().map(|&i| y[i] as i64).collect();
            assert_eq!(classes.len(), 2);
        }
    }

    #[test]
    fn test_stratified_requires_target() {
        let cv = CrossValidator::new(CVStrategy::StratifiedKFold { n_splits: 3, shuffle: false });
        assert!(matches!(cv.split(9, None), Err(EvaluatorError::ValidationError(_))));
    }

    #[test]
    fn test_too_few_samples() {
        let cv = CrossValidator::new(CVStrategy::KFold { n_splits: 5, shuffle: false });
        assert!(cv.split(3, None).is_err());
    }

    #[test]
    fn test_cv_results_stats() {
        let results = CVResults::from_scores(vec![0.5, 1.0]);
        assert_eq!(results.n_folds, 2);
        assert!((results.mean_score - 0.75).abs() < 1e-12);
        assert!((results.std_score - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_cross_val_score_fold_count() {
        let n = 30;
        let x = Array2::from_shape_fn((n, 2), |(i, j)| (i * (j + 1)) as f64 * 0.1 + (i % 3) as f64);
        let y = Array1::from_shape_fn(n, |i| 2.0 * x[[i, 0]] - x[[i, 1]] + 0.5);

        for folds in [3, 5] {
            let cv = CrossValidator::new(CVStrategy::KFold { n_splits: folds, shuffle: false });
            let results = cross_val_score(&ModelSpec::new(ModelKind::Linear), &x, &y, &cv).unwrap();
            assert_eq!(results.scores.len(), folds);
            assert!(results.scores.iter().all(|s| (*s - 1.0).abs() < 1e-6));
        }
    }
}
