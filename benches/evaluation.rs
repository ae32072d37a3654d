use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ml_model_evaluator::config::EvaluatorConfig;
use ml_model_evaluator::data::Dataset;
use ml_model_evaluator::preprocessing::ImputationPolicy;
use ml_model_evaluator::reporting::NullReporter;
use ml_model_evaluator::session::Session;
use ml_model_evaluator::training::ModelKind;
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn create_regression_data(n_rows: usize, n_features: usize) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    let mut columns: Vec<Column> = Vec::with_capacity(n_features + 1);
    let mut target = vec![0.0; n_rows];
    for i in 0..n_features {
        let values: Vec<f64> = (0..n_rows).map(|_| rng.gen::<f64>() * 10.0).collect();
        for (t, v) in target.iter_mut().zip(&values) {
            *t += v / n_features as f64;
        }
        columns.push(Column::new(format!("feature_{}", i).into(), values));
    }

    // Keep the target positive and continuous
    for t in target.iter_mut() {
        *t += rng.gen::<f64>() * 0.1;
    }
    columns.push(Column::new("target".into(), target));

    DataFrame::new(columns).unwrap()
}

fn bench_rounds(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluation_round");
    group.sample_size(10);

    for n_rows in [500, 2000].iter() {
        let dataset = Dataset::new(create_regression_data(*n_rows, 8));
        let session = Session::prepare(&dataset, "target", ImputationPolicy::Drop, EvaluatorConfig::default()).unwrap();

        for kind in [ModelKind::Linear, ModelKind::Lasso, ModelKind::Polynomial, ModelKind::Logistic] {
            let spec = session.spec_for(kind, None);
            group.bench_with_input(BenchmarkId::new(kind.identifier(), n_rows), &spec, |b, spec| {
                b.iter(|| session.run_round(black_box(spec), &NullReporter).unwrap())
            });
        }
    }

    group.finish();
}

fn bench_prepare(c: &mut Criterion) {
    let mut group = c.benchmark_group("prepare");

    for n_rows in [1000, 10000].iter() {
        let dataset = Dataset::new(create_regression_data(*n_rows, 8));
        group.bench_with_input(BenchmarkId::new("impute_split_scale", n_rows), &dataset, |b, ds| {
            b.iter(|| {
                Session::prepare(black_box(ds), "target", ImputationPolicy::Mean, EvaluatorConfig::default()).unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rounds, bench_prepare);
criterion_main!(benches);
