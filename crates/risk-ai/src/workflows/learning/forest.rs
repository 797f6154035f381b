//! Compact random-forest classifier over the fixed engineered feature
//! vector. Trees are grown with bootstrap sampling, per-split random feature
//! subsets and balanced class weights, and serialize with serde so a fitted
//! forest travels inside the training artifact.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// G, F, P, encoded category, encoded type.
pub const FEATURE_COUNT: usize = 5;

/// Features inspected per split, the square root of the feature count.
const FEATURES_PER_SPLIT: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self { trees: 200, max_depth: 15, min_samples_split: 5, min_samples_leaf: 2, seed: 42 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TreeNode {
    Split { feature: usize, threshold: f64, left: usize, right: usize },
    Leaf { class: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    root: usize,
}

impl DecisionTree {
    pub fn predict(&self, features: &[f64; FEATURE_COUNT]) -> usize {
        let mut cursor = self.root;
        loop {
            match self.nodes[cursor] {
                TreeNode::Leaf { class } => return class,
                TreeNode::Split { feature, threshold, left, right } => {
                    cursor = if features[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    class_count: usize,
}

impl RandomForest {
    /// Fits `config.trees` trees on a bootstrap resample each. `labels` are
    /// dense class indices below `class_count`; every class is weighted by
    /// `n / (class_count * n_class)` so rare classes keep their say.
    pub fn fit(
        config: &ForestConfig,
        samples: &[[f64; FEATURE_COUNT]],
        labels: &[usize],
        class_count: usize,
    ) -> Self {
        debug_assert_eq!(samples.len(), labels.len());

        let mut class_totals = vec![0usize; class_count];
        for &label in labels {
            class_totals[label] += 1;
        }
        let sample_weights: Vec<f64> = labels
            .iter()
            .map(|&label| {
                let count = class_totals[label].max(1);
                samples.len() as f64 / (class_count as f64 * count as f64)
            })
            .collect();

        let trees = (0..config.trees)
            .map(|index| {
                let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(index as u64));
                let bootstrap: Vec<usize> =
                    (0..samples.len()).map(|_| rng.gen_range(0..samples.len())).collect();
                let mut builder = TreeBuilder {
                    config,
                    samples,
                    labels,
                    sample_weights: &sample_weights,
                    class_count,
                    nodes: Vec::new(),
                    rng,
                };
                let root = builder.grow(bootstrap, 0);
                DecisionTree { nodes: builder.nodes, root }
            })
            .collect();

        Self { trees, class_count }
    }

    /// Majority vote across the trees; ties resolve to the lowest class
    /// index.
    pub fn predict(&self, features: &[f64; FEATURE_COUNT]) -> usize {
        let mut votes = vec![0usize; self.class_count.max(1)];
        for tree in &self.trees {
            votes[tree.predict(features)] += 1;
        }
        argmax(&votes)
    }

    pub fn accuracy(&self, samples: &[[f64; FEATURE_COUNT]], labels: &[usize]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let correct = samples
            .iter()
            .zip(labels)
            .filter(|(features, &label)| self.predict(features) == label)
            .count();
        correct as f64 / samples.len() as f64
    }

    pub fn class_count(&self) -> usize {
        self.class_count
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

struct TreeBuilder<'a> {
    config: &'a ForestConfig,
    samples: &'a [[f64; FEATURE_COUNT]],
    labels: &'a [usize],
    sample_weights: &'a [f64],
    class_count: usize,
    nodes: Vec<TreeNode>,
    rng: StdRng,
}

impl TreeBuilder<'_> {
    fn grow(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let counts = self.weighted_counts(&indices);
        let impurity = gini(&counts);

        if depth >= self.config.max_depth
            || indices.len() < self.config.min_samples_split
            || impurity == 0.0
        {
            return self.push_leaf(&counts);
        }

        match self.best_split(&indices, impurity) {
            Some((feature, threshold)) => {
                let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                    .into_iter()
                    .partition(|&index| self.samples[index][feature] <= threshold);
                let left = self.grow(left_indices, depth + 1);
                let right = self.grow(right_indices, depth + 1);
                self.nodes.push(TreeNode::Split { feature, threshold, left, right });
                self.nodes.len() - 1
            }
            None => self.push_leaf(&counts),
        }
    }

    fn push_leaf(&mut self, counts: &[f64]) -> usize {
        self.nodes.push(TreeNode::Leaf { class: argmax_f64(counts) });
        self.nodes.len() - 1
    }

    fn weighted_counts(&self, indices: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0_f64; self.class_count];
        for &index in indices {
            counts[self.labels[index]] += self.sample_weights[index];
        }
        counts
    }

    /// Best (feature, threshold) over a random feature subset, judged by the
    /// weighted gini of the children. Splits that would leave either side
    /// below `min_samples_leaf` are discarded.
    fn best_split(&mut self, indices: &[usize], parent_impurity: f64) -> Option<(usize, f64)> {
        let candidates = rand::seq::index::sample(&mut self.rng, FEATURE_COUNT, FEATURES_PER_SPLIT);
        let mut best: Option<(usize, f64, f64)> = None;

        for feature in candidates {
            let mut values: Vec<f64> =
                indices.iter().map(|&index| self.samples[index][feature]).collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            values.dedup();

            for pair in values.windows(2) {
                let threshold = (pair[0] + pair[1]) / 2.0;
                if let Some(impurity) = self.split_impurity(indices, feature, threshold) {
                    let improved = match best {
                        Some((_, _, current)) => impurity < current,
                        None => impurity < parent_impurity,
                    };
                    if improved {
                        best = Some((feature, threshold, impurity));
                    }
                }
            }
        }

        best.map(|(feature, threshold, _)| (feature, threshold))
    }

    fn split_impurity(&self, indices: &[usize], feature: usize, threshold: f64) -> Option<f64> {
        let mut left = vec![0.0_f64; self.class_count];
        let mut right = vec![0.0_f64; self.class_count];
        let mut left_count = 0usize;
        let mut right_count = 0usize;

        for &index in indices {
            let weight = self.sample_weights[index];
            if self.samples[index][feature] <= threshold {
                left[self.labels[index]] += weight;
                left_count += 1;
            } else {
                right[self.labels[index]] += weight;
                right_count += 1;
            }
        }

        if left_count < self.config.min_samples_leaf || right_count < self.config.min_samples_leaf {
            return None;
        }

        let left_weight: f64 = left.iter().sum();
        let right_weight: f64 = right.iter().sum();
        let total = left_weight + right_weight;
        if total == 0.0 {
            return None;
        }

        Some((left_weight / total) * gini(&left) + (right_weight / total) * gini(&right))
    }
}

fn gini(counts: &[f64]) -> f64 {
    let total: f64 = counts.iter().sum();
    if total == 0.0 {
        return 0.0;
    }
    1.0 - counts
        .iter()
        .map(|&count| {
            let share = count / total;
            share * share
        })
        .sum::<f64>()
}

fn argmax(values: &[usize]) -> usize {
    let mut best = 0;
    for (index, &value) in values.iter().enumerate() {
        if value > values[best] {
            best = index;
        }
    }
    best
}

fn argmax_f64(values: &[f64]) -> usize {
    let mut best = 0;
    for (index, &value) in values.iter().enumerate() {
        if value > values[best] {
            best = index;
        }
    }
    best
}
