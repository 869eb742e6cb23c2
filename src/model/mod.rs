//! Regression models and the training pipeline
//!
//! ```text
//! LabeledExample[] ──▶ Dataset::from_examples(features)
//!                  ──▶ train_test_split(ratio, seed)
//!                  ──▶ [StandardScaler] ──▶ Model::fit ──▶ RegressionMetrics
//!                  ──▶ TrainedModel (JSON bundle)
//! ```

pub mod bundle;
pub mod dataset;
pub mod forest;
pub mod linear;
pub mod metrics;
pub mod regressor;
pub mod scaler;
pub mod trainer;
pub mod tree;

pub use bundle::{BundleError, TrainedModel};
pub use dataset::Dataset;
pub use forest::{ForestConfig, RandomForest};
pub use linear::{LinearRegression, Penalty};
pub use metrics::RegressionMetrics;
pub use regressor::{Model, Regressor};
pub use scaler::StandardScaler;
pub use trainer::{ExperimentReport, ExperimentResult, TrainError, Trainer, TrainingRun};
pub use tree::{RegressionTree, TreeConfig};

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    EmptyDataset,
    DimensionMismatch { expected: usize, got: usize },
    InvalidAlpha(f64),
    NotFitted,
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::EmptyDataset => write!(f, "Cannot fit on an empty dataset"),
            ModelError::DimensionMismatch { expected, got } => {
                write!(f, "Dimension mismatch: expected {}, got {}", expected, got)
            }
            ModelError::InvalidAlpha(alpha) => write!(f, "Invalid alpha value: {}", alpha),
            ModelError::NotFitted => write!(f, "Model has not been fitted yet"),
        }
    }
}

impl std::error::Error for ModelError {}
