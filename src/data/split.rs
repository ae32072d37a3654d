//! Train/test partitioning and feature encoding

use super::{is_numeric_dtype, Dataset};
use crate::error::{EvaluatorError, Result};
use crate::preprocessing::StandardScaler;
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Disjoint train and test partitions of a cleaned dataset.
///
/// A split is never modified after construction; operations that change
/// features or targets return a new value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Split {
    feature_names: Vec<String>,
    target_name: String,
    /// Category labels when the target column was text, indexed by code
    target_classes: Option<Vec<String>>,
    /// Sorted category labels per feature, `None` for numeric features
    feature_categories: Vec<Option<Vec<String>>>,
    x_train: Array2<f64>,
    y_train: Array1<f64>,
    x_test: Array2<f64>,
    y_test: Array1<f64>,
    train_indices: Vec<usize>,
    test_indices: Vec<usize>,
}

impl Split {
    /// Build a split from already-partitioned arrays
    pub fn new(
        feature_names: Vec<String>,
        target_name: impl Into<String>,
        x_train: Array2<f64>,
        y_train: Array1<f64>,
        x_test: Array2<f64>,
        y_test: Array1<f64>,
    ) -> Result<Self> {
        if x_train.nrows() != y_train.len() || x_test.nrows() != y_test.len() {
            return Err(EvaluatorError::ShapeError {
                expected: format!("{} train / {} test targets", x_train.nrows(), x_test.nrows()),
                actual: format!("{} train / {} test targets", y_train.len(), y_test.len()),
            });
        }
        if x_train.ncols() != feature_names.len() || x_test.ncols() != feature_names.len() {
            return Err(EvaluatorError::ShapeError {
                expected: format!("{} feature columns", feature_names.len()),
                actual: format!("{} train / {} test columns", x_train.ncols(), x_test.ncols()),
            });
        }

        let n_train = x_train.nrows();
        let n_test = x_test.nrows();
        Ok(Self {
            feature_categories: vec![None; feature_names.len()],
            feature_names,
            target_name: target_name.into(),
            target_classes: None,
            x_train,
            y_train,
            x_test,
            y_test,
            train_indices: (0..n_train).collect(),
            test_indices: (n_train..n_train + n_test).collect(),
        })
    }

    /// Separate the target from the features and shuffle rows into train and test.
    ///
    /// The test partition receives `ceil(test_size * n)` rows. The same seed
    /// always yields the same partition.
    pub fn from_dataset(dataset: &Dataset, target: &str, test_size: f64, seed: u64) -> Result<Self> {
        let target_name = dataset.resolve_target(target)?;
        let feature_names: Vec<String> = dataset
            .column_names()
            .into_iter()
            .filter(|name| name != &target_name)
            .collect();

        if feature_names.is_empty() {
            return Err(EvaluatorError::DataError(format!(
                "no feature columns remain after removing target '{}'",
                target_name
            )));
        }

        let n = dataset.height();
        if n == 0 {
            return Err(EvaluatorError::DataError(
                "dataset has no rows after cleaning".to_string(),
            ));
        }
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(EvaluatorError::ValidationError(format!(
                "test_size must be in (0, 1), got {}",
                test_size
            )));
        }

        let n_test = (test_size * n as f64).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(EvaluatorError::DataError(format!(
                "cannot split {} rows with test_size {}",
                n, test_size
            )));
        }

        let df = dataset.frame();
        let (x, feature_categories) = columns_to_array2(df, &feature_names)?;
        let (y, target_classes) = encode_column(df, &target_name)?;
        let y = Array1::from_vec(y);

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let test_indices = indices[..n_test].to_vec();
        let train_indices = indices[n_test..].to_vec();

        info!(
            rows = n,
            features = feature_names.len(),
            "Data loaded with {} rows and {} features",
            n,
            feature_names.len()
        );
        debug!(train = train_indices.len(), test = test_indices.len(), seed, "Split dataset");

        Ok(Self {
            x_train: x.select(Axis(0), &train_indices),
            y_train: y.select(Axis(0), &train_indices),
            x_test: x.select(Axis(0), &test_indices),
            y_test: y.select(Axis(0), &test_indices),
            feature_names,
            target_name,
            target_classes,
            feature_categories,
            train_indices,
            test_indices,
        })
    }

    /// Fit a standard scaler on the train features and apply it to both partitions
    pub fn standardize(&self) -> Result<(Split, StandardScaler)> {
        let mut scaler = StandardScaler::new().with_feature_names(self.feature_names.clone());
        let x_train = scaler.fit_transform(&self.x_train)?;
        let x_test = scaler.transform(&self.x_test)?;

        let scaled = Split {
            x_train,
            x_test,
            ..self.clone()
        };
        Ok((scaled, scaler))
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn target_classes(&self) -> Option<&[String]> {
        self.target_classes.as_deref()
    }

    /// Category labels for each feature, in feature order
    pub fn feature_categories(&self) -> &[Option<Vec<String>>] {
        &self.feature_categories
    }

    pub fn x_train(&self) -> &Array2<f64> {
        &self.x_train
    }

    pub fn y_train(&self) -> &Array1<f64> {
        &self.y_train
    }

    pub fn x_test(&self) -> &Array2<f64> {
        &self.x_test
    }

    pub fn y_test(&self) -> &Array1<f64> {
        &self.y_test
    }

    /// Row positions (in the cleaned dataset) that landed in train
    pub fn train_indices(&self) -> &[usize] {
        &self.train_indices
    }

    /// Row positions (in the cleaned dataset) that landed in test
    pub fn test_indices(&self) -> &[usize] {
        &self.test_indices
    }

    pub fn n_train(&self) -> usize {
        self.x_train.nrows()
    }

    pub fn n_test(&self) -> usize {
        self.x_test.nrows()
    }
}

/// Extract named columns into a row-major matrix, encoding text columns as
/// ordinal codes. Returns the categories learned for each column.
fn columns_to_array2(
    df: &DataFrame,
    col_names: &[String],
) -> Result<(Array2<f64>, Vec<Option<Vec<String>>>)> {
    let n_rows = df.height();
    let (col_data, categories): (Vec<Vec<f64>>, Vec<Option<Vec<String>>>) = col_names
        .iter()
        .map(|name| encode_column(df, name))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .unzip();

    let x = Array2::from_shape_fn((n_rows, col_names.len()), |(r, c)| col_data[c][r]);
    Ok((x, categories))
}

/// Encode raw feature columns with categories learned at split time.
///
/// Numeric features are cast to `f64`. Categorical features map each label to
/// its code; a label that was never seen is a `ValidationError`.
pub fn encode_features(
    df: &DataFrame,
    feature_names: &[String],
    categories: &[Option<Vec<String>>],
) -> Result<Array2<f64>> {
    if feature_names.len() != categories.len() {
        return Err(EvaluatorError::ShapeError {
            expected: format!("{} category entries", feature_names.len()),
            actual: format!("{} category entries", categories.len()),
        });
    }

    let col_data: Vec<Vec<f64>> = feature_names
        .iter()
        .zip(categories)
        .map(|(name, cats)| match cats {
            None => encode_column(df, name).and_then(|(values, learned)| match learned {
                None => Ok(values),
                Some(_) => Err(EvaluatorError::ValidationError(format!(
                    "column '{}' was numeric when the model was trained",
                    name
                ))),
            }),
            Some(cats) => encode_with_categories(df, name, cats),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Array2::from_shape_fn((df.height(), feature_names.len()), |(r, c)| {
        col_data[c][r]
    }))
}

fn encode_with_categories(df: &DataFrame, name: &str, categories: &[String]) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| EvaluatorError::DataError(format!("column '{}' not found", name)))?;
    let series = column.as_materialized_series();
    if series.null_count() > 0 {
        return Err(EvaluatorError::DataError(format!(
            "column '{}' has {} missing values",
            name,
            series.null_count()
        )));
    }

    let cast = series.cast(&DataType::String)?;
    let codes = cast
        .str()?
        .into_no_null_iter()
        .map(|label| {
            categories
                .binary_search_by(|c| c.as_str().cmp(label))
                .map(|code| code as f64)
                .map_err(|_| {
                    EvaluatorError::ValidationError(format!(
                        "unknown category '{}' in column '{}'",
                        label, name
                    ))
                })
        })
        .collect::<Result<Vec<f64>>>()?;
    Ok(codes)
}

/// Convert one column to `f64`.
///
/// Numeric columns are cast directly. Any other column is treated as
/// categorical: categories are sorted and each value becomes its position.
fn encode_column(df: &DataFrame, name: &str) -> Result<(Vec<f64>, Option<Vec<String>>)> {
    let column = df
        .column(name)
        .map_err(|_| EvaluatorError::DataError(format!("column '{}' not found", name)))?;
    let series = column.as_materialized_series();

    if series.null_count() > 0 {
        return Err(EvaluatorError::DataError(format!(
            "column '{}' still has {} missing values",
            name,
            series.null_count()
        )));
    }

    if is_numeric_dtype(series.dtype()) {
        let cast = series.cast(&DataType::Float64)?;
        let values: Vec<f64> = cast.f64()?.into_no_null_iter().collect();
        return Ok((values, None));
    }

    let cast = series.cast(&DataType::String)?;
    let ca = cast.str()?;
    let codes: BTreeMap<String, usize> = ca
        .into_no_null_iter()
        .map(|s| (s.to_string(), 0))
        .collect::<BTreeMap<_, _>>()
        .into_keys()
        .enumerate()
        .map(|(code, category)| (category, code))
        .collect();

    let values: Vec<f64> = ca
        .into_no_null_iter()
        .map(|s| codes.get(s).copied().unwrap_or(0) as f64)
        .collect();
    let categories: Vec<String> = codes.into_keys().collect();

    debug!(column = name, categories = categories.len(), "Encoded categorical column");
    Ok((values, Some(categories)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn dataset(n: usize) -> Dataset {
        let a: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let b: Vec<f64> = (0..n).map(|i| (i * 2) as f64).collect();
        let y: Vec<f64> = (0..n).map(|i| (i % 10) as f64).collect();
        Dataset::new(df!("a" => a, "b" => b, "Target" => y).unwrap())
    }

    #[test]
    fn test_split_is_disjoint_and_complete() {
        let split = Split::from_dataset(&dataset(100), "target", 0.2, 42).unwrap();
        assert_eq!(split.n_test(), 20);
        assert_eq!(split.n_train(), 80);

        let train: HashSet<usize> = split.train_indices().iter().copied().collect();
        let test: HashSet<usize> = split.test_indices().iter().copied().collect();
        assert!(train.is_disjoint(&test));
        let all: HashSet<usize> = train.union(&test).copied().collect();
        assert_eq!(all, (0..100).collect::<HashSet<_>>());
    }

    #[test]
    fn test_split_is_deterministic() {
        let a = Split::from_dataset(&dataset(50), "Target", 0.2, 42).unwrap();
        let b = Split::from_dataset(&dataset(50), "Target", 0.2, 42).unwrap();
        assert_eq!(a.test_indices(), b.test_indices());
        assert_eq!(a.x_train(), b.x_train());
    }

    #[test]
    fn test_rows_follow_their_indices() {
        let split = Split::from_dataset(&dataset(30), "target", 0.2, 1).unwrap();
        for (row, &idx) in split.test_indices().iter().enumerate() {
            assert_eq!(split.x_test()[[row, 0]], idx as f64);
            assert_eq!(split.y_test()[row], (idx % 10) as f64);
        }
    }

    #[test]
    fn test_test_size_rounds_up() {
        let split = Split::from_dataset(&dataset(11), "target", 0.2, 42).unwrap();
        assert_eq!(split.n_test(), 3);
        assert_eq!(split.n_train(), 8);
    }

    #[test]
    fn test_only_target_column_is_error() {
        let ds = Dataset::new(df!("y" => &[1.0, 2.0, 3.0]).unwrap());
        let err = Split::from_dataset(&ds, "y", 0.2, 42).unwrap_err();
        assert!(matches!(err, EvaluatorError::DataError(_)));
    }

    #[test]
    fn test_categorical_columns_are_encoded() {
        let ds = Dataset::new(
            df!(
                "color" => &["red", "blue", "red", "green", "blue"],
                "y" => &["no", "yes", "no", "yes", "no"]
            )
            .unwrap(),
        );
        let split = Split::from_dataset(&ds, "y", 0.4, 3).unwrap();
        assert_eq!(split.target_classes().unwrap(), &["no".to_string(), "yes".to_string()]);
        assert_eq!(
            split.feature_categories(),
            &[Some(vec!["blue".to_string(), "green".to_string(), "red".to_string()])]
        );
        for v in split.x_train().iter().chain(split.x_test().iter()) {
            assert!([0.0, 1.0, 2.0].contains(v));
        }
    }

    #[test]
    fn test_encode_features_reuses_learned_codes() {
        let train = df!(
            "color" => &["red", "blue", "red", "green", "blue"],
            "size" => &[1.0, 2.0, 3.0, 4.0, 5.0],
            "y" => &[1.0, 2.0, 3.0, 4.0, 5.0]
        )
        .unwrap();
        let split = Split::from_dataset(&Dataset::new(train), "y", 0.4, 3).unwrap();

        // "green" alone would get code 0 if the column were re-encoded
        let fresh = df!("size" => &[9.0, 8.0], "color" => &["green", "red"]).unwrap();
        let x = encode_features(&fresh, split.feature_names(), split.feature_categories()).unwrap();
        assert_eq!(x, ndarray::array![[1.0, 9.0], [2.0, 8.0]]);

        let unseen = df!("color" => &["purple"], "size" => &[1.0]).unwrap();
        let err = encode_features(&unseen, split.feature_names(), split.feature_categories()).unwrap_err();
        assert!(matches!(err, EvaluatorError::ValidationError(_)));
    }

    #[test]
    fn test_standardize_leaves_targets_untouched() {
        let split = Split::from_dataset(&dataset(40), "target", 0.2, 42).unwrap();
        let (scaled, scaler) = split.standardize().unwrap();
        assert_eq!(scaled.y_train(), split.y_train());
        assert_eq!(scaled.y_test(), split.y_test());
        assert!(scaler.is_fitted());

        let mean = scaled.x_train().column(0).mean().unwrap();
        assert!(mean.abs() < 1e-10);
    }
}
