//! Feature importance aggregation across trees.

/// A named feature with its forest-level importance and 1-based rank.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFeature {
    pub name: String,
    /// Mean of per-tree MDI importances, renormalized to sum to 1.0.
    pub importance: f64,
    /// 1 = most important. Ties keep column order.
    pub rank: usize,
}

/// Average per-tree importances column-wise and rank them.
///
/// Trees that never split (all-zero vectors) still count in the mean,
/// which only rescales; the result is renormalized when any split exists.
pub(crate) fn aggregate_importances(per_tree: &[Vec<f64>], names: &[String]) -> Vec<RankedFeature> {
    if per_tree.is_empty() {
        return Vec::new();
    }
    let n_trees = per_tree.len() as f64;
    let mut mean: Vec<f64> = (0..names.len())
        .map(|f| per_tree.iter().filter_map(|t| t.get(f)).sum::<f64>() / n_trees)
        .collect();

    let total: f64 = mean.iter().sum();
    if total > 0.0 {
        mean.iter_mut().for_each(|v| *v /= total);
    }

    let mut ranked: Vec<RankedFeature> = names
        .iter()
        .zip(mean)
        .map(|(name, importance)| RankedFeature {
            name: name.clone(),
            importance,
            rank: 0,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    for (i, feature) in ranked.iter_mut().enumerate() {
        feature.rank = i + 1;
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::aggregate_importances;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn averages_and_ranks() {
        let per_tree = vec![vec![1.0, 0.0, 0.0], vec![0.5, 0.5, 0.0]];
        let ranked = aggregate_importances(&per_tree, &names(&["a", "b", "c"]));
        assert_eq!(ranked[0].name, "a");
        assert!((ranked[0].importance - 0.75).abs() < 1e-12);
        assert_eq!(ranked[1].name, "b");
        assert!((ranked[1].importance - 0.25).abs() < 1e-12);
        assert_eq!(ranked.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn stump_trees_leave_zeros() {
        let ranked = aggregate_importances(&[vec![0.0, 0.0]], &names(&["a", "b"]));
        assert!(ranked.iter().all(|r| r.importance == 0.0));
        assert_eq!(ranked[0].name, "a");
    }

    #[test]
    fn no_trees_no_ranking() {
        assert!(aggregate_importances(&[], &names(&["a"])).is_empty());
    }
}
