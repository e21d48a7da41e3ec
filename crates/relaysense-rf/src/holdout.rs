//! Seeded train/test holdout split.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::error::RfError;

/// Holdout split configuration.
///
/// Construct via [`TrainTestSplit::new`], then chain `with_seed` if desired.
/// The split is a single shuffle-and-cut without stratification.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    test_fraction: f64,
    seed: u64,
}

/// Disjoint train and test partitions of a labelled dataset.
///
/// Index vectors refer to rows of the input and are kept in permuted
/// order; the feature and label vectors are parallel to them.
#[derive(Debug, Clone)]
pub struct HoldoutSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub train_features: Vec<Vec<f64>>,
    pub train_labels: Vec<usize>,
    pub test_features: Vec<Vec<f64>>,
    pub test_labels: Vec<usize>,
}

impl TrainTestSplit {
    /// Create a split holding out `test_fraction` of the rows.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidTestFraction`] unless `0.0 < test_fraction < 1.0`.
    pub fn new(test_fraction: f64) -> Result<Self, RfError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(RfError::InvalidTestFraction {
                fraction: test_fraction,
            });
        }
        Ok(Self {
            test_fraction,
            seed: 42,
        })
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn test_fraction(&self) -> f64 {
        self.test_fraction
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Partition sizes for `n_samples` rows: `(n_train, n_test)`.
    ///
    /// The test side is rounded up, the train side takes the rest.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::EmptyDataset`] | `n_samples` is zero |
    /// | [`RfError::EmptyPartition`] | either side would be empty |
    pub fn partition_sizes(&self, n_samples: usize) -> Result<(usize, usize), RfError> {
        if n_samples == 0 {
            return Err(RfError::EmptyDataset);
        }
        let n_test = (self.test_fraction * n_samples as f64).ceil() as usize;
        let n_train = n_samples.saturating_sub(n_test);
        if n_train == 0 || n_test == 0 {
            return Err(RfError::EmptyPartition {
                n_samples,
                n_train,
                n_test,
            });
        }
        Ok((n_train, n_test))
    }

    /// Shuffle row indices with the seed and cut them into `(train, test)`.
    ///
    /// The first `n_test` permuted indices form the test side. The same
    /// seed and `n_samples` always produce the same membership.
    ///
    /// # Errors
    ///
    /// See [`TrainTestSplit::partition_sizes`].
    pub fn split_indices(&self, n_samples: usize) -> Result<(Vec<usize>, Vec<usize>), RfError> {
        let (_, n_test) = self.partition_sizes(n_samples)?;
        let mut order: Vec<usize> = (0..n_samples).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        order.shuffle(&mut rng);
        let train = order.split_off(n_test);
        Ok((train, order))
    }

    /// Split a feature matrix and its labels.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::LengthMismatch`] | `labels.len() != features.len()` |
    /// | [`RfError::EmptyDataset`] | zero rows |
    /// | [`RfError::EmptyPartition`] | either side would be empty |
    #[instrument(skip_all, fields(n_samples = features.len(), test_fraction = self.test_fraction))]
    pub fn split(&self, features: &[Vec<f64>], labels: &[usize]) -> Result<HoldoutSplit, RfError> {
        if labels.len() != features.len() {
            return Err(RfError::LengthMismatch {
                expected: features.len(),
                got: labels.len(),
            });
        }
        let (train_indices, test_indices) = self.split_indices(features.len())?;

        let gather_rows = |idx: &[usize]| -> Vec<Vec<f64>> {
            idx.iter().map(|&i| features[i].clone()).collect()
        };
        let gather_labels =
            |idx: &[usize]| -> Vec<usize> { idx.iter().map(|&i| labels[i]).collect() };

        debug!(
            n_train = train_indices.len(),
            n_test = test_indices.len(),
            "holdout split"
        );

        Ok(HoldoutSplit {
            train_features: gather_rows(train_indices.as_slice()),
            train_labels: gather_labels(train_indices.as_slice()),
            test_features: gather_rows(test_indices.as_slice()),
            test_labels: gather_labels(test_indices.as_slice()),
            train_indices,
            test_indices,
        })
    }
}

impl HoldoutSplit {
    #[must_use]
    pub fn n_train(&self) -> usize {
        self.train_indices.len()
    }

    #[must_use]
    pub fn n_test(&self) -> usize {
        self.test_indices.len()
    }
}
