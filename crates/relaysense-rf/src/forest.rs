//! Random Forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::RandomForestConfig;
use crate::error::RfError;
use crate::importance::aggregate_importances;
use crate::result::{RandomForestResult, TrainingMetadata};
use crate::tree::{DecisionTree, DecisionTreeConfig};

/// A fitted Random Forest ensemble.
#[derive(Debug, Clone)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
    pub(crate) feature_names: Vec<String>,
}

/// Check shape and finiteness of a row-major training set.
///
/// Returns the number of feature columns.
pub(crate) fn validate_training_data(
    features: &[Vec<f64>],
    labels: &[usize],
) -> Result<usize, RfError> {
    let Some(first) = features.first() else {
        return Err(RfError::EmptyDataset);
    };
    if labels.len() != features.len() {
        return Err(RfError::LengthMismatch {
            expected: features.len(),
            got: labels.len(),
        });
    }
    let n_features = first.len();
    if n_features == 0 {
        return Err(RfError::ZeroFeatures);
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(RfError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(RfError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }
    Ok(n_features)
}

/// Draw `n_samples` row indices with replacement.
fn bootstrap_indices(n_samples: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}

/// Train the Random Forest ensemble.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
pub(crate) fn train(
    config: &RandomForestConfig,
    features: &[Vec<f64>],
    labels: &[usize],
    feature_names: &[String],
) -> Result<RandomForestResult, RfError> {
    let n_features = validate_training_data(features, labels)?;
    if feature_names.len() != n_features {
        return Err(RfError::LengthMismatch {
            expected: n_features,
            got: feature_names.len(),
        });
    }
    let max_features = config.max_features.resolve(n_features)?;
    let n_samples = features.len();
    let max_label = labels.iter().max().copied().unwrap_or(0);
    let n_classes = config.n_classes.unwrap_or(max_label + 1);
    if max_label >= n_classes {
        return Err(RfError::LabelOutOfRange {
            label: max_label,
            n_classes,
        });
    }

    let tree_config = DecisionTreeConfig::new()
        .with_criterion(config.criterion)
        .with_max_depth(config.max_depth)
        .with_min_samples_split(config.min_samples_split)
        .with_min_samples_leaf(config.min_samples_leaf)
        .with_max_features(Some(max_features))
        .with_n_classes(Some(n_classes));

    info!(
        n_trees = config.n_trees,
        n_samples,
        n_features,
        n_classes,
        max_features,
        "training random forest"
    );

    // Per-tree seeds come from one master stream so the ensemble does not
    // depend on how rayon schedules the trees.
    let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master_rng.r#gen()).collect();

    let trees: Vec<DecisionTree> = tree_seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let drawn = bootstrap_indices(n_samples, &mut rng);
            let boot_features: Vec<Vec<f64>> =
                drawn.iter().map(|&i| features[i].clone()).collect();
            let boot_labels: Vec<usize> = drawn.iter().map(|&i| labels[i]).collect();

            tree_config
                .clone()
                .with_seed(rng.r#gen())
                .fit(&boot_features, &boot_labels)
        })
        .collect::<Result<_, _>>()?;

    let per_tree: Vec<Vec<f64>> = trees.iter().map(DecisionTree::feature_importances).collect();
    let importances = aggregate_importances(&per_tree, feature_names);

    debug!(
        total_nodes = trees.iter().map(DecisionTree::n_nodes).sum::<usize>(),
        "tree training complete"
    );

    let forest = RandomForest {
        trees,
        n_features,
        n_classes,
        feature_names: feature_names.to_vec(),
    };
    let metadata = TrainingMetadata {
        n_trees: config.n_trees,
        n_features,
        n_classes,
        n_samples,
        max_features_resolved: max_features,
    };

    info!("random forest training complete");
    Ok(RandomForestResult::new(forest, importances, metadata))
}

#[cfg(test)]
mod tests {
    use crate::config::{MaxFeatures, RandomForestConfig};
    use crate::RfError;

    /// Two classes separated along the first of five columns.
    fn make_sensor_like() -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..30 {
            let jitter = (i % 7) as f64 * 0.1;
            features.push(vec![20.0 + jitter, 5.0 + jitter, 0.1, -0.1, 9.8]);
            labels.push(0);
            features.push(vec![60.0 + jitter, 5.2 - jitter, 0.1, -0.1, 9.8]);
            labels.push(1);
        }
        let names = ["t", "f", "ax", "ay", "az"].map(String::from).to_vec();
        (features, labels, names)
    }

    #[test]
    fn separable_training_accuracy() {
        let (features, labels, names) = make_sensor_like();
        let result = RandomForestConfig::new(30)
            .unwrap()
            .fit(&features, &labels, &names)
            .unwrap();
        let predictions = result.forest().predict_batch(&features).unwrap();
        assert_eq!(predictions, labels);
        assert_eq!(result.metadata().max_features_resolved, 2);
        assert_eq!(result.forest().n_trees(), 30);
    }

    #[test]
    fn deterministic_with_same_seed() {
        let (features, labels, names) = make_sensor_like();
        let config = RandomForestConfig::new(15).unwrap().with_seed(99);
        let a = config.fit(&features, &labels, &names).unwrap();
        let b = config.fit(&features, &labels, &names).unwrap();
        let queries: Vec<Vec<f64>> = (0..20)
            .map(|i| vec![15.0 + i as f64 * 3.0, 5.0, 0.1, -0.1, 9.8])
            .collect();
        assert_eq!(
            a.forest().predict_batch(&queries).unwrap(),
            b.forest().predict_batch(&queries).unwrap()
        );
        for (x, y) in a.importances().iter().zip(b.importances()) {
            assert_eq!(x.name, y.name);
            assert_eq!(x.importance, y.importance);
        }
    }

    #[test]
    fn importances_rank_informative_column_first() {
        let (features, labels, names) = make_sensor_like();
        let result = RandomForestConfig::new(40)
            .unwrap()
            .with_max_features(MaxFeatures::All)
            .fit(&features, &labels, &names)
            .unwrap();
        let total: f64 = result.importances().iter().map(|f| f.importance).sum();
        assert!((total - 1.0).abs() < 1e-10, "total = {total}");
        assert_eq!(result.importances()[0].name, "t");
        assert_eq!(result.importances()[0].rank, 1);
    }

    #[test]
    fn single_class_bootstrap_keeps_forest_class_count() {
        // 1 row of class 1 among 9 of class 0: many bootstraps miss it.
        let mut features: Vec<Vec<f64>> = (0..9).map(|i| vec![i as f64]).collect();
        features.push(vec![100.0]);
        let mut labels = vec![0; 9];
        labels.push(1);
        let names = vec!["x".to_string()];
        let result = RandomForestConfig::new(20)
            .unwrap()
            .fit(&features, &labels, &names)
            .unwrap();
        let proba = result.forest().predict_proba(&[3.0]).unwrap();
        assert_eq!(proba.as_slice().len(), 2);
    }

    #[test]
    fn configured_class_count_covers_unseen_class() {
        let features: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64]).collect();
        let labels = vec![0; 6];
        let names = vec!["x".to_string()];
        let result = RandomForestConfig::new(5)
            .unwrap()
            .with_n_classes(Some(2))
            .fit(&features, &labels, &names)
            .unwrap();
        assert_eq!(result.forest().n_classes(), 2);
        assert_eq!(result.metadata().n_classes, 2);
        let proba = result.forest().predict_proba(&[2.0]).unwrap();
        assert_eq!(proba.as_slice(), &[1.0, 0.0]);
    }

    #[test]
    fn label_beyond_configured_class_count_error() {
        let err = RandomForestConfig::new(3)
            .unwrap()
            .with_n_classes(Some(1))
            .fit(&[vec![1.0], vec![2.0]], &[0, 1], &["x".to_string()])
            .unwrap_err();
        assert!(matches!(err, RfError::LabelOutOfRange { label: 1, n_classes: 1 }));
    }

    #[test]
    fn empty_dataset_error() {
        let config = RandomForestConfig::new(10).unwrap();
        let err = config.fit(&[], &[], &[]).unwrap_err();
        assert!(matches!(err, RfError::EmptyDataset));
    }

    #[test]
    fn label_count_mismatch_error() {
        let config = RandomForestConfig::new(3).unwrap();
        let err = config
            .fit(&[vec![1.0], vec![2.0]], &[0], &["x".to_string()])
            .unwrap_err();
        assert!(matches!(err, RfError::LengthMismatch { expected: 2, got: 1 }));
    }

    #[test]
    fn feature_name_count_mismatch_error() {
        let config = RandomForestConfig::new(3).unwrap();
        let err = config
            .fit(&[vec![1.0, 2.0], vec![2.0, 3.0]], &[0, 1], &["x".to_string()])
            .unwrap_err();
        assert!(matches!(err, RfError::LengthMismatch { expected: 2, got: 1 }));
    }
}
