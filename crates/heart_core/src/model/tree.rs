//! Decision tree and random forest scoring

use super::Classifier;
use serde::{Deserialize, Serialize};

/// A single node in a classification tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node ID (position in the tree's node list)
    pub id: i32,

    /// Left child index (-1 for leaf nodes)
    pub left: i32,

    /// Right child index (-1 for leaf nodes)
    pub right: i32,

    /// Feature index to split on (-1 for leaf nodes)
    pub feature_idx: i32,

    /// Split threshold; rows go left when `feature <= threshold`
    pub threshold: f64,

    /// Positive-class fraction of the training rows reaching this leaf
    pub leaf: Option<f64>,
}

impl Node {
    pub fn internal(id: i32, feature_idx: i32, threshold: f64, left: i32, right: i32) -> Self {
        Self {
            id,
            left,
            right,
            feature_idx,
            threshold,
            leaf: None,
        }
    }

    pub fn leaf(id: i32, value: f64) -> Self {
        Self {
            id,
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0.0,
            leaf: Some(value),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature_idx == -1 || self.leaf.is_some()
    }
}

/// A single classification tree (node 0 is the root)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Positive-class probability for one row. Malformed trees score 0.
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;

        loop {
            let Some(node) = self.nodes.get(idx) else {
                return 0.0;
            };

            if node.is_leaf() {
                return node.leaf.unwrap_or(0.0);
            }

            let Some(&value) = features.get(node.feature_idx as usize) else {
                return 0.0;
            };

            let next = if value <= node.threshold {
                node.left
            } else {
                node.right
            };
            if next < 0 {
                return 0.0;
            }
            idx = next as usize;
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(node) if !node.is_leaf() => {
                    1 + walk(nodes, node.left.max(0) as usize)
                        .max(walk(nodes, node.right.max(0) as usize))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    /// Validate tree structure
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        let len = self.nodes.len() as i32;
        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                if node.leaf.is_none() {
                    return Err(format!("leaf node {i} has no leaf value"));
                }
                continue;
            }
            // children always come after their parent, which also rules out cycles
            if node.left <= i as i32 || node.left >= len {
                return Err(format!("node {i} has invalid left child: {}", node.left));
            }
            if node.right <= i as i32 || node.right >= len {
                return Err(format!("node {i} has invalid right child: {}", node.right));
            }
            if node.feature_idx < 0 {
                return Err(format!(
                    "internal node {i} has invalid feature index: {}",
                    node.feature_idx
                ));
            }
        }
        Ok(())
    }
}

/// Bagged ensemble of classification trees; probability is the mean leaf value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub trees: Vec<Tree>,
    pub feature_count: usize,
}

impl RandomForest {
    pub fn probability_row(&self, features: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|tree| tree.evaluate(features)).sum();
        sum / self.trees.len() as f64
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| format!("tree {i}: {e}"))?;
            let out_of_range = tree
                .nodes
                .iter()
                .any(|n| !n.is_leaf() && n.feature_idx as usize >= self.feature_count);
            if out_of_range {
                return Err(format!("tree {i} references a feature beyond {}", self.feature_count));
            }
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    fn feature_count(&self) -> usize {
        self.feature_count
    }

    fn predict(&self, rows: &[Vec<f64>]) -> Vec<u8> {
        rows.iter()
            .map(|row| u8::from(self.probability_row(row) > 0.5))
            .collect()
    }

    fn predict_proba(&self, rows: &[Vec<f64>]) -> Option<Vec<f64>> {
        Some(rows.iter().map(|row| self.probability_row(row)).collect())
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}
