//! Dense feature matrix and deterministic splits

use crate::cohort::LabeledExample;
use crate::features::{Feature, FeatureSource};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// `n_samples × n_features`
    pub features: Array2<f64>,
    pub labels: Array1<f64>,
    pub feature_names: Vec<Feature>,
}

impl Dataset {
    /// Every row must hold one value per entry of `feature_names`
    pub fn new(rows: Vec<Vec<f64>>, labels: Vec<f64>, feature_names: Vec<Feature>) -> Self {
        let features = Array2::from_shape_fn((rows.len(), feature_names.len()), |(i, j)| rows[i][j]);
        Self::from_arrays(features, Array1::from(labels), feature_names)
    }

    pub fn from_arrays(features: Array2<f64>, labels: Array1<f64>, feature_names: Vec<Feature>) -> Self {
        Self {
            features,
            labels,
            feature_names,
        }
    }

    /// Build the matrix for `features`. Examples lacking any requested
    /// feature are skipped; the skip count is returned alongside.
    pub fn from_examples(examples: &[LabeledExample], features: &[Feature]) -> (Self, usize) {
        let mut rows = Vec::with_capacity(examples.len());
        let mut labels = Vec::with_capacity(examples.len());
        let mut skipped = 0;

        for example in examples {
            match FeatureSource::from(example).row(features) {
                Ok(row) => {
                    rows.push(row);
                    labels.push(example.label);
                }
                Err(missing) => {
                    log::debug!("Skipping {} ({})", example.apartment_name, missing);
                    skipped += 1;
                }
            }
        }

        (Self::new(rows, labels, features.to_vec()), skipped)
    }

    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn subset(&self, indices: &[usize]) -> Self {
        Self::from_arrays(
            self.features.select(Axis(0), indices),
            self.labels.select(Axis(0), indices),
            self.feature_names.clone(),
        )
    }

    /// Shuffled split; `ceil(n * test_ratio)` rows go to the test side
    pub fn train_test_split(&self, test_ratio: f64, seed: u64) -> (Self, Self) {
        let n = self.n_samples();
        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let n_test = ((n as f64) * test_ratio).ceil() as usize;
        let n_test = n_test.min(n.saturating_sub(1));
        let (test_idx, train_idx) = indices.split_at(n_test);

        (self.subset(train_idx), self.subset(test_idx))
    }

    /// Sample `n` rows with replacement
    pub fn bootstrap_sample(&self, seed: u64) -> Self {
        let n = self.n_samples();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let indices: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
        self.subset(&indices)
    }
}
