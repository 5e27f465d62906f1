//! CART (Classification and Regression Tree) builder
//!
//! Exact-greedy classification trees scored by Gini impurity. Leaves store
//! the positive-class fraction of the samples that reach them.

use heartwise_core::{Node, Tree};
use std::cmp::Ordering;

use crate::deterministic::{LcgRng, SplitTieBreaker};

const MIN_IMPURITY_DECREASE: f64 = 1e-12;

/// Training parameters for a single tree
#[derive(Clone, Debug, PartialEq)]
pub struct TreeConfig {
    /// `None` grows until leaves are pure or too small to split
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features examined per split; `None` examines all of them
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

/// Split candidate with impurity decrease and tie-breaker
#[derive(Debug, Clone)]
struct SplitCandidate {
    decrease: f64,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn beats(&self, other: &SplitCandidate) -> bool {
        match self.decrease.total_cmp(&other.decrease) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => self.tie_breaker.compare(&other.tie_breaker) == Ordering::Less,
        }
    }
}

/// Build a classification tree over a (possibly bootstrapped) sample list
pub struct CartBuilder<'a> {
    config: TreeConfig,
    features: &'a [Vec<f64>],
    targets: &'a [u8],
    feature_count: usize,
}

impl<'a> CartBuilder<'a> {
    pub fn new(features: &'a [Vec<f64>], targets: &'a [u8], config: TreeConfig) -> Self {
        let feature_count = features.first().map(Vec::len).unwrap_or_default();
        Self {
            config,
            features,
            targets,
            feature_count,
        }
    }

    /// Build a tree from `samples` (row indices, repeats allowed)
    pub fn build(&self, samples: &[usize], rng: &mut LcgRng) -> Tree {
        let mut nodes = Vec::new();
        self.build_node(samples, 0, &mut nodes, rng);
        Tree::new(nodes)
    }

    /// Recursively build tree nodes, returning the index of the created node
    fn build_node(
        &self,
        indices: &[usize],
        depth: usize,
        nodes: &mut Vec<Node>,
        rng: &mut LcgRng,
    ) -> i32 {
        let current_idx = nodes.len() as i32;
        let positives = self.count_positives(indices);
        let leaf_value = if indices.is_empty() {
            0.0
        } else {
            positives as f64 / indices.len() as f64
        };

        let depth_reached = self.config.max_depth.is_some_and(|max| depth >= max);
        let pure = positives == 0 || positives == indices.len();
        if depth_reached || pure || indices.len() < self.config.min_samples_split {
            nodes.push(Node::leaf(current_idx, leaf_value));
            return current_idx;
        }

        let Some(split) = self.find_best_split(indices, positives, rng) else {
            nodes.push(Node::leaf(current_idx, leaf_value));
            return current_idx;
        };

        let feature_idx = split.tie_breaker.feature_idx;
        let threshold = split.tie_breaker.threshold;
        let (left_indices, right_indices) = self.split_samples(indices, feature_idx, threshold);

        // children are filled in once built
        nodes.push(Node::internal(current_idx, feature_idx as i32, threshold, -1, -1));

        let left = self.build_node(&left_indices, depth + 1, nodes, rng);
        let right = self.build_node(&right_indices, depth + 1, nodes, rng);

        let node = &mut nodes[current_idx as usize];
        node.left = left;
        node.right = right;

        current_idx
    }

    /// Visit features in random order until `max_features` non-constant ones
    /// have been examined, keeping the split with the largest Gini decrease.
    fn find_best_split(
        &self,
        indices: &[usize],
        positives: usize,
        rng: &mut LcgRng,
    ) -> Option<SplitCandidate> {
        let mut order: Vec<usize> = (0..self.feature_count).collect();
        rng.shuffle(&mut order);
        let budget = self
            .config
            .max_features
            .unwrap_or(self.feature_count)
            .clamp(1, self.feature_count.max(1));

        let n = indices.len() as f64;
        let parent_impurity = gini(positives, indices.len());
        let mut best: Option<SplitCandidate> = None;
        let mut examined = 0usize;

        for feature_idx in order {
            if examined >= budget {
                break;
            }

            let mut column: Vec<(f64, u8)> = indices
                .iter()
                .map(|&i| (self.features[i][feature_idx], self.targets[i]))
                .collect();
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let (Some(first), Some(last)) = (column.first(), column.last()) else {
                continue;
            };
            if first.0 == last.0 {
                continue;
            }
            examined += 1;

            let mut left_positives = 0usize;
            for i in 1..column.len() {
                left_positives += usize::from(column[i - 1].1);
                let (prev, value) = (column[i - 1].0, column[i].0);
                if prev == value {
                    continue;
                }

                let left_count = i;
                let right_count = column.len() - i;
                if left_count < self.config.min_samples_leaf
                    || right_count < self.config.min_samples_leaf
                {
                    continue;
                }

                let weighted = (left_count as f64 / n) * gini(left_positives, left_count)
                    + (right_count as f64 / n)
                        * gini(positives - left_positives, right_count);
                let decrease = parent_impurity - weighted;
                if decrease <= MIN_IMPURITY_DECREASE {
                    continue;
                }

                let mut threshold = prev + (value - prev) / 2.0;
                if threshold >= value {
                    threshold = prev;
                }

                let candidate = SplitCandidate {
                    decrease,
                    tie_breaker: SplitTieBreaker::new(feature_idx, threshold),
                };
                if best.as_ref().map_or(true, |current| candidate.beats(current)) {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    fn split_samples(
        &self,
        indices: &[usize],
        feature_idx: usize,
        threshold: f64,
    ) -> (Vec<usize>, Vec<usize>) {
        indices
            .iter()
            .partition(|&&i| self.features[i][feature_idx] <= threshold)
    }

    fn count_positives(&self, indices: &[usize]) -> usize {
        indices.iter().filter(|&&i| self.targets[i] == 1).count()
    }
}

fn gini(positives: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = positives as f64 / total as f64;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_split_separates_classes() {
        let features = vec![vec![1.0, 9.0], vec![2.0, 9.0], vec![3.0, 9.0], vec![4.0, 9.0]];
        let targets = vec![0, 0, 1, 1];
        let builder = CartBuilder::new(&features, &targets, TreeConfig::default());

        let tree = builder.build(&[0, 1, 2, 3], &mut LcgRng::new(1));

        assert_eq!(tree.nodes.len(), 3);
        assert_eq!(tree.nodes[0].feature_idx, 0);
        assert_eq!(tree.nodes[0].threshold, 2.5);
        assert_eq!(tree.evaluate(&[1.5, 9.0]), 0.0);
        assert_eq!(tree.evaluate(&[3.5, 9.0]), 1.0);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_leaf_only_tree() {
        let features = vec![vec![1.0], vec![2.0]];
        let targets = vec![1, 1];
        let builder = CartBuilder::new(&features, &targets, TreeConfig::default());

        let tree = builder.build(&[0, 1], &mut LcgRng::new(1));

        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.nodes[0].leaf, Some(1.0));
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let features: Vec<Vec<f64>> = (0..16).map(|i| vec![i as f64]).collect();
        let targets: Vec<u8> = (0..16).map(|i| (i % 2) as u8).collect();
        let config = TreeConfig {
            max_depth: Some(2),
            ..TreeConfig::default()
        };
        let builder = CartBuilder::new(&features, &targets, config);
        let samples: Vec<usize> = (0..16).collect();

        let tree = builder.build(&samples, &mut LcgRng::new(1));
        assert!(tree.depth() <= 2);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_min_samples_split_stops_small_nodes() {
        let features = vec![vec![1.0], vec![2.0], vec![3.0]];
        let targets = vec![0, 1, 0];
        let config = TreeConfig {
            min_samples_split: 4,
            ..TreeConfig::default()
        };
        let tree = CartBuilder::new(&features, &targets, config).build(&[0, 1, 2], &mut LcgRng::new(1));

        assert_eq!(tree.nodes.len(), 1);
        assert!((tree.nodes[0].leaf.unwrap() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_bootstrap_duplicates_weight_leaves() {
        let features = vec![vec![1.0], vec![2.0]];
        let targets = vec![0, 1];
        let config = TreeConfig {
            max_depth: Some(0),
            ..TreeConfig::default()
        };
        let tree = CartBuilder::new(&features, &targets, config).build(&[1, 1, 1, 0], &mut LcgRng::new(1));

        assert_eq!(tree.nodes[0].leaf, Some(0.75));
    }

    #[test]
    fn test_gini() {
        assert_eq!(gini(0, 10), 0.0);
        assert_eq!(gini(5, 10), 0.5);
        assert_eq!(gini(0, 0), 0.0);
    }
}
