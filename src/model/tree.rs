//! CART regression tree
//!
//! Splits minimise the weighted variance of the children. Candidate
//! thresholds are midpoints between consecutive distinct values, found with
//! one sorted sweep per feature. Nodes live in a flat arena so a serialized
//! tree nests no deeper than a single node.

use super::dataset::Dataset;
use super::ModelError;
use ndarray::ArrayView1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// `usize::MAX` = no depth limit
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split (None = all)
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: usize::MAX,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    pub config: TreeConfig,
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl RegressionTree {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.nodes.is_empty()
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 1,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    pub fn fit(&mut self, data: &Dataset) -> Result<(), ModelError> {
        if data.is_empty() {
            return Err(ModelError::EmptyDataset);
        }

        self.nodes.clear();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let indices: Vec<usize> = (0..data.n_samples()).collect();
        self.grow(data, indices, 0, &mut rng);
        Ok(())
    }

    /// Pushes the subtree for `indices` and returns its root slot
    fn grow(&mut self, data: &Dataset, indices: Vec<usize>, depth: usize, rng: &mut ChaCha8Rng) -> usize {
        let slot = self.nodes.len();
        let (mean, sse) = mean_and_sse(data, &indices);
        self.nodes.push(Node::Leaf {
            value: mean,
            n_samples: indices.len(),
        });

        if depth >= self.config.max_depth
            || indices.len() < self.config.min_samples_split
            || sse <= 1e-10
        {
            return slot;
        }

        let Some(best) = self.find_best_split(data, &indices, sse, rng) else {
            return slot;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| data.features[[i, best.feature]] <= best.threshold);

        let left = self.grow(data, left_idx, depth + 1, rng);
        let right = self.grow(data, right_idx, depth + 1, rng);
        self.nodes[slot] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        slot
    }

    fn find_best_split(
        &self,
        data: &Dataset,
        indices: &[usize],
        parent_sse: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<BestSplit> {
        let n_features = data.n_features();
        let mut candidates: Vec<usize> = (0..n_features).collect();
        if let Some(max) = self.config.max_features {
            candidates.shuffle(rng);
            candidates.truncate(max.clamp(1, n_features));
        }

        let min_leaf = self.config.min_samples_leaf.max(1);
        let n = indices.len();
        let total_sum: f64 = indices.iter().map(|&i| data.labels[i]).sum();
        let total_sq: f64 = indices.iter().map(|&i| data.labels[i].powi(2)).sum();

        let mut best: Option<BestSplit> = None;
        let mut sorted = indices.to_vec();

        for &feature in &candidates {
            sorted.sort_by(|&a, &b| data.features[[a, feature]].total_cmp(&data.features[[b, feature]]));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for pos in 0..n - 1 {
                let y = data.labels[sorted[pos]];
                left_sum += y;
                left_sq += y * y;

                let here = data.features[[sorted[pos], feature]];
                let next = data.features[[sorted[pos + 1], feature]];
                let n_left = pos + 1;
                let n_right = n - n_left;
                if here == next || n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let score = (left_sq - left_sum * left_sum / n_left as f64)
                    + (right_sq - right_sum * right_sum / n_right as f64);

                if score < parent_sse - 1e-12 && best.as_ref().map_or(true, |b| score < b.score) {
                    best = Some(BestSplit {
                        feature,
                        threshold: (here + next) / 2.0,
                        score,
                    });
                }
            }
        }

        best
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value, .. }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).copied().unwrap_or(f64::NAN);
                    idx = if value <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }
}

fn mean_and_sse(data: &Dataset, indices: &[usize]) -> (f64, f64) {
    let n = indices.len() as f64;
    let mean = indices.iter().map(|&i| data.labels[i]).sum::<f64>() / n;
    let sse = indices
        .iter()
        .map(|&i| (data.labels[i] - mean).powi(2))
        .sum();
    (mean, sse)
}
