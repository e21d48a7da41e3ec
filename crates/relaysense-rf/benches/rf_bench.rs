//! Criterion benchmarks for relaysense-rf: forest training, batch
//! prediction, and report construction on sensor-shaped data.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use relaysense_rf::{ClassificationReport, RandomForestConfig, TrainTestSplit};

/// Five noisy sensor channels; the relay is ON when temperature and flow
/// are both high.
fn make_sensor_data(n_samples: usize, seed: u64) -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for _ in 0..n_samples {
        let temperature = 15.0 + rng.r#gen::<f64>() * 30.0;
        let flow = rng.r#gen::<f64>() * 20.0;
        let accel: [f64; 3] = [rng.r#gen(), rng.r#gen(), rng.r#gen()];
        labels.push(usize::from(temperature > 30.0 && flow > 8.0));
        features.push(vec![temperature, flow, accel[0], accel[1], accel[2]]);
    }
    let names = ["Temperature_C", "FlowRate_Lmin", "Accel_X", "Accel_Y", "Accel_Z"]
        .map(String::from)
        .to_vec();
    (features, labels, names)
}

fn bench_rf_train(c: &mut Criterion) {
    let (features, labels, names) = make_sensor_data(1000, 42);
    let cfg = RandomForestConfig::new(100).unwrap().with_seed(42);

    c.bench_function("rf_train_1000x5_100trees", |b| {
        b.iter(|| cfg.fit(&features, &labels, &names).unwrap());
    });
}

fn bench_rf_predict_batch(c: &mut Criterion) {
    let (features, labels, names) = make_sensor_data(1000, 42);
    let forest = RandomForestConfig::new(100)
        .unwrap()
        .with_seed(42)
        .fit(&features, &labels, &names)
        .unwrap()
        .into_forest();

    c.bench_function("rf_predict_batch_1000x5_100trees", |b| {
        b.iter(|| forest.predict_batch(&features).unwrap());
    });
}

fn bench_holdout_and_report(c: &mut Criterion) {
    let (features, labels, names) = make_sensor_data(1000, 42);
    let split = TrainTestSplit::new(0.2).unwrap().split(&features, &labels).unwrap();
    let forest = RandomForestConfig::new(100)
        .unwrap()
        .fit(&split.train_features, &split.train_labels, &names)
        .unwrap()
        .into_forest();
    let predicted = forest.predict_batch(&split.test_features).unwrap();
    let class_names = vec!["OFF".to_string(), "ON".to_string()];

    c.bench_function("classification_report_200rows", |b| {
        b.iter(|| {
            ClassificationReport::from_predictions(&split.test_labels, &predicted, &class_names)
                .unwrap()
                .to_string()
        });
    });
}

criterion_group!(benches, bench_rf_train, bench_rf_predict_batch, bench_holdout_and_report);
criterion_main!(benches);
