//! Common interface over every regressor, plus the persisted model enum

use super::dataset::Dataset;
use super::forest::{ForestConfig, RandomForest};
use super::linear::{LinearRegression, Penalty};
use super::tree::{RegressionTree, TreeConfig};
use super::ModelError;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

pub trait Regressor: Send + Sync {
    fn fit(&mut self, data: &Dataset) -> Result<(), ModelError>;

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64;

    fn is_fitted(&self) -> bool;

    /// Short name for logs and experiment tables
    fn name(&self) -> String;

    fn predict(&self, data: &Dataset) -> Array1<f64> {
        data.features.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, data: &Dataset) -> Result<(), ModelError> {
        LinearRegression::fit(self, data)
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        LinearRegression::predict_row(self, row)
    }

    fn is_fitted(&self) -> bool {
        LinearRegression::is_fitted(self)
    }

    fn name(&self) -> String {
        match self.penalty {
            Penalty::None => "linear".to_string(),
            Penalty::Ridge { alpha } => format!("ridge(α={})", alpha),
            Penalty::Lasso { alpha } => format!("lasso(α={})", alpha),
        }
    }
}

impl Regressor for RegressionTree {
    fn fit(&mut self, data: &Dataset) -> Result<(), ModelError> {
        RegressionTree::fit(self, data)
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        RegressionTree::predict_row(self, row)
    }

    fn is_fitted(&self) -> bool {
        RegressionTree::is_fitted(self)
    }

    fn name(&self) -> String {
        match self.config.max_depth {
            usize::MAX => "decision_tree".to_string(),
            depth => format!("decision_tree(depth≤{})", depth),
        }
    }
}

impl Regressor for RandomForest {
    fn fit(&mut self, data: &Dataset) -> Result<(), ModelError> {
        RandomForest::fit(self, data)
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        RandomForest::predict_row(self, row)
    }

    fn is_fitted(&self) -> bool {
        RandomForest::is_fitted(self)
    }

    fn name(&self) -> String {
        format!("random_forest({} trees)", self.config.n_trees)
    }
}

/// Persisted form of any supported regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Model {
    Linear(LinearRegression),
    DecisionTree(RegressionTree),
    RandomForest(RandomForest),
}

impl Model {
    pub fn linear() -> Self {
        Model::Linear(LinearRegression::ols())
    }

    pub fn ridge(alpha: f64) -> Self {
        Model::Linear(LinearRegression::ridge(alpha))
    }

    pub fn lasso(alpha: f64) -> Self {
        Model::Linear(LinearRegression::lasso(alpha))
    }

    pub fn decision_tree(config: TreeConfig) -> Self {
        Model::DecisionTree(RegressionTree::new(config))
    }

    pub fn random_forest(config: ForestConfig) -> Self {
        Model::RandomForest(RandomForest::new(config))
    }

    fn inner(&self) -> &dyn Regressor {
        match self {
            Model::Linear(m) => m,
            Model::DecisionTree(m) => m,
            Model::RandomForest(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Regressor {
        match self {
            Model::Linear(m) => m,
            Model::DecisionTree(m) => m,
            Model::RandomForest(m) => m,
        }
    }
}

impl Regressor for Model {
    fn fit(&mut self, data: &Dataset) -> Result<(), ModelError> {
        self.inner_mut().fit(data)
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.inner().predict_row(row)
    }

    fn is_fitted(&self) -> bool {
        self.inner().is_fitted()
    }

    fn name(&self) -> String {
        self.inner().name()
    }
}
