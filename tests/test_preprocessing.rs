//! Integration test: imputation, splitting and scaling

use ml_model_evaluator::data::{Dataset, Split};
use ml_model_evaluator::preprocessing::{ImputationPolicy, StandardScaler};
use ndarray::Axis;
use polars::prelude::*;

fn df_with_missing() -> DataFrame {
    df!(
        "f1" => &[Some(1.0), Some(2.0), None, Some(4.0), Some(5.0), Some(6.0), None, Some(8.0), Some(9.0), Some(10.0)],
        "f2" => &[Some(2.0), None, Some(6.0), Some(8.0), Some(10.0), Some(12.0), Some(14.0), Some(16.0), None, Some(20.0)],
        "kind" => &[Some("a"), Some("b"), Some("a"), None, Some("b"), Some("a"), Some("c"), Some("a"), Some("b"), Some("a")],
        "target" => &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]
    )
    .unwrap()
}

#[test]
fn test_every_policy_leaves_no_missing_values() {
    let ds = Dataset::new(df_with_missing());
    for policy in [
        ImputationPolicy::Mean,
        ImputationPolicy::Median,
        ImputationPolicy::Mode,
        ImputationPolicy::Drop,
    ] {
        let cleaned = policy.apply(&ds).unwrap();
        assert_eq!(cleaned.missing_count(), 0, "{} left gaps", policy);
    }
}

#[test]
fn test_fill_policies_replace_only_missing_cells() {
    let ds = Dataset::new(df_with_missing());
    let original = ds.frame().column("f1").unwrap().f64().unwrap().clone();

    for policy in [ImputationPolicy::Mean, ImputationPolicy::Median, ImputationPolicy::Mode] {
        let cleaned = policy.apply(&ds).unwrap();
        assert_eq!(cleaned.height(), ds.height());
        let filled = cleaned.frame().column("f1").unwrap().f64().unwrap().clone();
        for (before, after) in original.into_iter().zip(filled.into_iter()) {
            if let Some(v) = before {
                assert_eq!(after, Some(v));
            }
        }
    }
}

#[test]
fn test_drop_is_idempotent() {
    let once = ImputationPolicy::Drop.apply(&Dataset::new(df_with_missing())).unwrap();
    let twice = ImputationPolicy::Drop.apply(&once).unwrap();
    assert_eq!(once.height(), 5);
    assert!(once.frame().equals(twice.frame()));
}

#[test]
fn test_unrecognized_policy_drops() {
    let policy = ImputationPolicy::parse_or_drop("interpolate");
    assert_eq!(policy, ImputationPolicy::Drop);
}

#[test]
fn test_scaler_is_fitted_on_train_only() {
    let ds = ImputationPolicy::Mean.apply(&Dataset::new(df_with_missing())).unwrap();
    let split = Split::from_dataset(&ds, "TARGET", 0.2, 42).unwrap();
    let (scaled, scaler) = split.standardize().unwrap();

    for column in scaled.x_train().axis_iter(Axis(1)) {
        let mean = column.mean().unwrap();
        let var = column.var(0.0);
        assert!(mean.abs() < 1e-10);
        // constant columns stay at zero variance
        assert!((var - 1.0).abs() < 1e-10 || var < 1e-20);
    }

    let mut refit = StandardScaler::new();
    refit.fit(split.x_train()).unwrap();
    assert_eq!(refit.params(), scaler.params());

    let before = scaler.params().cloned();
    let _ = scaler.transform(split.x_test()).unwrap();
    assert_eq!(scaler.params().cloned(), before);
}
