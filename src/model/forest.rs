//! Bagged regression trees

use super::dataset::Dataset;
use super::tree::{RegressionTree, TreeConfig};
use super::ModelError;
use ndarray::ArrayView1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    /// `usize::MAX` = no depth limit
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features per split (None = all, as regression forests usually do)
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 300,
            max_depth: usize::MAX,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub config: ForestConfig,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Trees are grown in parallel; tree `i` uses seed `seed + i` for both
    /// its bootstrap sample and its feature sampling, so the result does not
    /// depend on thread scheduling.
    pub fn fit(&mut self, data: &Dataset) -> Result<(), ModelError> {
        if data.is_empty() {
            return Err(ModelError::EmptyDataset);
        }

        let config = &self.config;
        let trees = (0..config.n_trees.max(1))
            .into_par_iter()
            .map(|i| {
                let seed = config.seed.wrapping_add(i as u64);
                let mut tree = RegressionTree::new(TreeConfig {
                    max_depth: config.max_depth,
                    min_samples_split: config.min_samples_split,
                    min_samples_leaf: config.min_samples_leaf,
                    max_features: config.max_features,
                    seed,
                });

                if config.bootstrap {
                    tree.fit(&data.bootstrap_sample(seed))?;
                } else {
                    tree.fit(data)?;
                }
                Ok(tree)
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        log::debug!("Grew {} trees", trees.len());
        self.trees = trees;
        Ok(())
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / self.trees.len() as f64
    }
}
