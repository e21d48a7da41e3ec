use rand::Rng;

use crate::node::{FeatureIndex, Impurity};

/// Criterion for measuring the quality of a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitCriterion {
    /// Gini impurity: 1 - Σ(p_i²)
    #[default]
    Gini,
    /// Information entropy: -Σ(p_i · ln(p_i))
    Entropy,
}

impl SplitCriterion {
    /// Compute the impurity of a node from its class counts.
    ///
    /// Returns zero impurity when `n_samples` is zero.
    #[must_use]
    pub fn impurity(&self, class_counts: &[usize], n_samples: usize) -> Impurity {
        if n_samples == 0 {
            return Impurity::new(0.0);
        }
        let n = n_samples as f64;
        let value = match self {
            SplitCriterion::Gini => {
                let sum_sq: f64 = class_counts
                    .iter()
                    .map(|&c| {
                        let p = c as f64 / n;
                        p * p
                    })
                    .sum();
                1.0 - sum_sq
            }
            SplitCriterion::Entropy => -class_counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / n;
                    p * p.ln()
                })
                .sum::<f64>(),
        };
        Impurity::new(value)
    }
}

/// Best split found for a node, with the partitioned sample indices.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    pub(crate) impurity_decrease: f64,
    pub(crate) left_indices: Vec<usize>,
    pub(crate) right_indices: Vec<usize>,
}

/// Find the best exact split among randomly drawn features.
///
/// Features are drawn without replacement in a seeded order. A feature
/// that is constant over `sample_indices` is skipped without counting
/// toward `max_features`, so drawing continues until `max_features`
/// non-constant features have been scanned or the features run out.
///
/// For each scanned feature the `(value, sample)` pairs are sorted and
/// scanned once with incremental class counts; candidate thresholds are
/// midpoints between consecutive distinct values.
///
/// Returns `None` when no split satisfies `min_samples_leaf`.
///
/// `features` is column-major: `features[feature_idx][sample_idx]`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn find_best_split(
    features: &[Vec<f64>],
    labels: &[usize],
    sample_indices: &[usize],
    n_classes: usize,
    criterion: SplitCriterion,
    max_features: usize,
    min_samples_leaf: usize,
    rng: &mut impl Rng,
) -> Option<SplitResult> {
    let n_features = features.len();
    let n_samples = sample_indices.len();
    if n_samples < 2 || n_features == 0 {
        return None;
    }

    let mut parent_counts = vec![0usize; n_classes];
    for &si in sample_indices {
        parent_counts[labels[si]] += 1;
    }
    let parent_impurity = criterion.impurity(&parent_counts, n_samples).value();

    let mut feature_order: Vec<usize> = (0..n_features).collect();
    let mut n_scanned = 0usize;
    let mut best_decrease = f64::NEG_INFINITY;
    let mut best: Option<(FeatureIndex, f64)> = None;
    let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(n_samples);

    for i in 0..n_features {
        if n_scanned >= max_features {
            break;
        }
        // Lazy Fisher-Yates draw.
        let j = rng.gen_range(i..n_features);
        feature_order.swap(i, j);
        let feat_idx = feature_order[i];
        let column = &features[feat_idx];

        sorted.clear();
        sorted.extend(sample_indices.iter().map(|&si| (column[si], si)));
        sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        if sorted[0].0 == sorted[n_samples - 1].0 {
            continue;
        }
        n_scanned += 1;

        let mut left_counts = vec![0usize; n_classes];
        let mut right_counts = parent_counts.clone();

        for pos in 0..(n_samples - 1) {
            let (value, si) = sorted[pos];
            left_counts[labels[si]] += 1;
            right_counts[labels[si]] -= 1;

            let next_value = sorted[pos + 1].0;
            if value == next_value {
                continue;
            }

            let n_left = pos + 1;
            let n_right = n_samples - n_left;
            if n_left < min_samples_leaf || n_right < min_samples_leaf {
                continue;
            }

            let left_impurity = criterion.impurity(&left_counts, n_left).value();
            let right_impurity = criterion.impurity(&right_counts, n_right).value();
            let decrease = (n_samples as f64) * parent_impurity
                - (n_left as f64) * left_impurity
                - (n_right as f64) * right_impurity;

            if decrease > best_decrease {
                best_decrease = decrease;
                best = Some((FeatureIndex::new(feat_idx), midpoint(value, next_value)));
            }
        }
    }

    let (feature, threshold) = best?;
    let column = &features[feature.index()];
    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = sample_indices
        .iter()
        .partition(|&&si| column[si] <= threshold);

    Some(SplitResult {
        feature,
        threshold,
        impurity_decrease: best_decrease,
        left_indices,
        right_indices,
    })
}

/// Midpoint of two adjacent sorted values, kept strictly below `hi`.
fn midpoint(lo: f64, hi: f64) -> f64 {
    let mid = lo / 2.0 + hi / 2.0;
    if mid >= hi || mid.is_infinite() { lo } else { mid }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{SplitCriterion, find_best_split, midpoint};

    #[test]
    fn gini_binary_balanced() {
        let imp = SplitCriterion::Gini.impurity(&[5, 5], 10);
        assert!((imp.value() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn gini_pure() {
        let imp = SplitCriterion::Gini.impurity(&[0, 7], 7);
        assert!(imp.is_pure());
    }

    #[test]
    fn entropy_binary_balanced() {
        let imp = SplitCriterion::Entropy.impurity(&[5, 5], 10);
        assert!((imp.value() - 2.0_f64.ln()).abs() < 1e-10);
    }

    #[test]
    fn empty_node_has_zero_impurity() {
        assert_eq!(SplitCriterion::Gini.impurity(&[0, 0], 0).value(), 0.0);
    }

    #[test]
    fn separable_feature_found() {
        let features = vec![vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let samples: Vec<usize> = (0..6).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let split = find_best_split(
            &features,
            &labels,
            &samples,
            2,
            SplitCriterion::Gini,
            1,
            1,
            &mut rng,
        )
        .expect("should find a split");

        assert_eq!(split.feature.index(), 0);
        assert!((split.threshold - 6.5).abs() < 1e-12);
        assert_eq!(split.left_indices, vec![0, 1, 2]);
        assert_eq!(split.right_indices, vec![3, 4, 5]);
        // 6 * 0.5 - 0 - 0
        assert!((split.impurity_decrease - 3.0).abs() < 1e-12);
    }

    #[test]
    fn constant_features_do_not_use_up_the_budget() {
        // Only feature 2 is informative; with max_features = 1 it must
        // still be reached because features 0 and 1 are constant.
        let features = vec![
            vec![5.0, 5.0, 5.0, 5.0],
            vec![-1.0, -1.0, -1.0, -1.0],
            vec![0.1, 0.2, 0.8, 0.9],
        ];
        let labels = vec![0, 0, 1, 1];
        let samples: Vec<usize> = (0..4).collect();

        for seed in 0..16 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let split = find_best_split(
                &features,
                &labels,
                &samples,
                2,
                SplitCriterion::Gini,
                1,
                1,
                &mut rng,
            )
            .expect("informative feature must be scanned");
            assert_eq!(split.feature.index(), 2, "seed {seed}");
        }
    }

    #[test]
    fn all_constant_returns_none() {
        let features = vec![vec![5.0; 4], vec![1.0; 4]];
        let labels = vec![0, 0, 1, 1];
        let samples: Vec<usize> = (0..4).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let result = find_best_split(
            &features,
            &labels,
            &samples,
            2,
            SplitCriterion::Gini,
            2,
            1,
            &mut rng,
        );
        assert!(result.is_none());
    }

    #[test]
    fn min_samples_leaf_enforced() {
        let features = vec![vec![1.0, 10.0]];
        let labels = vec![0, 1];
        let samples: Vec<usize> = (0..2).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let result = find_best_split(
            &features,
            &labels,
            &samples,
            2,
            SplitCriterion::Gini,
            1,
            2,
            &mut rng,
        );
        assert!(result.is_none());
    }

    #[test]
    fn midpoint_stays_below_upper_value() {
        let lo = 1.0_f64;
        let hi = f64::from_bits(lo.to_bits() + 1);
        assert!(midpoint(lo, hi) < hi);
        assert!((midpoint(2.0, 4.0) - 3.0).abs() < f64::EPSILON);
    }
}
