//! Fit, evaluate, and compare regressors on the labeled training table
//!
//! `train_baseline` is the production path: a random forest on the six
//! baseline features, unscaled. `run_experiments` reproduces the offline
//! comparisons:
//! 1. baseline random forest
//! 2. linear / ridge(α=1000) / lasso(α=100) on scaled inputs vs. the forest
//! 3. baseline features vs. baseline + engineered features (forest)

use super::bundle::TrainedModel;
use super::dataset::Dataset;
use super::forest::ForestConfig;
use super::metrics::RegressionMetrics;
use super::regressor::{Model, Regressor};
use super::scaler::StandardScaler;
use super::ModelError;
use crate::cohort::LabeledExample;
use crate::config::TrainConfig;
use crate::features::{Feature, BASELINE_FEATURES, ENGINEERED_FEATURES};

pub const RIDGE_ALPHA: f64 = 1000.0;
pub const LASSO_ALPHA: f64 = 100.0;

/// A split needs at least one row on each side
const MIN_EXAMPLES: usize = 2;

#[derive(Debug)]
pub enum TrainError {
    NotEnoughExamples { usable: usize, skipped: usize },
    Model(ModelError),
}

impl From<ModelError> for TrainError {
    fn from(err: ModelError) -> Self {
        TrainError::Model(err)
    }
}

impl std::fmt::Display for TrainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrainError::NotEnoughExamples { usable, skipped } => write!(
                f,
                "Not enough labeled examples to train: {} usable, {} skipped for missing features",
                usable, skipped
            ),
            TrainError::Model(e) => write!(f, "Model error: {}", e),
        }
    }
}

impl std::error::Error for TrainError {}

/// One fitted model with its held-out evaluation
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub model: Model,
    pub features: Vec<Feature>,
    pub scaler: Option<StandardScaler>,
    pub metrics: RegressionMetrics,
    pub n_train: usize,
    pub skipped: usize,
}

impl TrainingRun {
    pub fn into_bundle(self) -> TrainedModel {
        TrainedModel::new(self.model, self.features, self.scaler, self.metrics)
    }
}

/// One row of an experiment table
#[derive(Debug, Clone)]
pub struct ExperimentResult {
    pub model_name: String,
    pub feature_set: &'static str,
    pub scaled: bool,
    pub metrics: RegressionMetrics,
}

impl ExperimentResult {
    fn from_run(run: &TrainingRun, feature_set: &'static str) -> Self {
        Self {
            model_name: run.model.name(),
            feature_set,
            scaled: run.scaler.is_some(),
            metrics: run.metrics,
        }
    }
}

#[derive(Debug)]
pub struct ExperimentReport {
    pub baseline: ExperimentResult,
    pub model_comparison: Vec<ExperimentResult>,
    pub feature_comparison: Vec<ExperimentResult>,
    /// Lowest-MAE model from the model comparison
    pub best: Option<TrainingRun>,
}

impl ExperimentReport {
    pub fn log_tables(&self) {
        log::info!("🧪 Baseline");
        log_rows(std::slice::from_ref(&self.baseline));
        log::info!("🧪 Model comparison");
        log_rows(&self.model_comparison);
        log::info!("🧪 Feature-set comparison");
        log_rows(&self.feature_comparison);
        if let Some(best) = &self.best {
            log::info!("🏆 Best model: {} (MAE {:.2})", best.model.name(), best.metrics.mae);
        }
    }
}

fn log_rows(rows: &[ExperimentResult]) {
    log::info!(
        "   {:<28} {:<11} {:>6} {:>12} {:>12} {:>8} {:>6}",
        "model", "features", "scaled", "MAE", "RMSE", "R²", "n"
    );
    for row in rows {
        log::info!(
            "   {:<28} {:<11} {:>6} {:>12.2} {:>12.2} {:>8.4} {:>6}",
            row.model_name,
            row.feature_set,
            if row.scaled { "yes" } else { "no" },
            row.metrics.mae,
            row.metrics.rmse,
            row.metrics.r2,
            row.metrics.n_samples
        );
    }
}

pub struct Trainer {
    config: TrainConfig,
}

impl Trainer {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn forest_config(&self) -> ForestConfig {
        ForestConfig {
            n_trees: self.config.forest_trees,
            max_depth: self.config.forest_max_depth,
            seed: self.config.seed,
            ..Default::default()
        }
    }

    /// Build the matrix, split, optionally scale, fit on train, score on test
    pub fn train(
        &self,
        examples: &[LabeledExample],
        features: &[Feature],
        mut model: Model,
        scale: bool,
    ) -> Result<TrainingRun, TrainError> {
        let (data, skipped) = Dataset::from_examples(examples, features);
        if skipped > 0 {
            log::warn!("⚠️  Skipped {} examples with missing features", skipped);
        }
        if data.n_samples() < MIN_EXAMPLES {
            return Err(TrainError::NotEnoughExamples {
                usable: data.n_samples(),
                skipped,
            });
        }

        let (train, test) = data.train_test_split(self.config.test_ratio, self.config.seed);

        let (scaler, train, test) = if scale {
            let scaler = StandardScaler::fit(&train)?;
            let train = scaler.transform(&train)?;
            let test = scaler.transform(&test)?;
            (Some(scaler), train, test)
        } else {
            (None, train, test)
        };

        log::info!(
            "🔧 Fitting {} on {} rows ({} held out)",
            model.name(),
            train.n_samples(),
            test.n_samples()
        );
        model.fit(&train)?;

        let predictions = model.predict(&test);
        let metrics = RegressionMetrics::calculate(&test.labels, &predictions);

        Ok(TrainingRun {
            model,
            features: features.to_vec(),
            scaler,
            metrics,
            n_train: train.n_samples(),
            skipped,
        })
    }

    pub fn train_baseline(&self, examples: &[LabeledExample]) -> Result<TrainingRun, TrainError> {
        self.train(
            examples,
            &BASELINE_FEATURES,
            Model::random_forest(self.forest_config()),
            false,
        )
    }

    pub fn run_experiments(&self, examples: &[LabeledExample]) -> Result<ExperimentReport, TrainError> {
        let baseline_run = self.train_baseline(examples)?;
        let baseline = ExperimentResult::from_run(&baseline_run, "baseline");

        let candidates = [
            (Model::linear(), true),
            (Model::ridge(RIDGE_ALPHA), true),
            (Model::lasso(LASSO_ALPHA), true),
        ];

        let mut model_comparison = Vec::new();
        let mut runs = Vec::new();
        for (model, scale) in candidates {
            let name = model.name();
            match self.train(examples, &BASELINE_FEATURES, model, scale) {
                Ok(run) => {
                    model_comparison.push(ExperimentResult::from_run(&run, "baseline"));
                    runs.push(run);
                }
                // One degenerate candidate should not sink the comparison
                Err(TrainError::Model(e)) => log::warn!("⚠️  {} failed: {}", name, e),
                Err(e) => return Err(e),
            }
        }
        model_comparison.push(baseline.clone());
        runs.push(baseline_run);

        let best = runs
            .into_iter()
            .filter(|run| run.metrics.mae.is_finite())
            .min_by(|a, b| a.metrics.mae.total_cmp(&b.metrics.mae));

        let engineered_run = self.train(
            examples,
            &ENGINEERED_FEATURES,
            Model::random_forest(self.forest_config()),
            false,
        )?;
        let feature_comparison = vec![
            baseline.clone(),
            ExperimentResult::from_run(&engineered_run, "engineered"),
        ];

        Ok(ExperimentReport {
            baseline,
            model_comparison,
            feature_comparison,
            best,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn examples(n: usize) -> Vec<LabeledExample> {
        (0..n)
            .map(|i| {
                let price = 40000.0 + 750.0 * i as f64;
                let area = 59.0 + (i % 3) as f64 * 12.5;
                LabeledExample {
                    apartment_name: format!("단지{}", i % 4),
                    size_bucket: 55,
                    anchor_date: NaiveDate::from_ymd_opt(2010 + (i % 8) as i32, 1 + (i % 12) as u32, 1)
                        .unwrap(),
                    current_price: price,
                    building_year: Some(1995 + (i % 10) as i32),
                    age_at_deal: 8 + (i % 13) as i32,
                    exclusive_area: area,
                    floor: Some(1 + (i % 20) as i32),
                    deal_year: Some(2010 + (i % 8) as i32),
                    deal_month: Some(1 + (i % 12) as u32),
                    label: price * 1.35 + area * 100.0,
                }
            })
            .collect()
    }

    fn trainer() -> Trainer {
        Trainer::new(TrainConfig {
            forest_trees: 10,
            ..Default::default()
        })
    }

    #[test]
    fn test_baseline_run_is_reproducible() {
        let data = examples(80);
        let a = trainer().train_baseline(&data).unwrap();
        let b = trainer().train_baseline(&data).unwrap();

        assert_eq!(a.features, BASELINE_FEATURES.to_vec());
        assert!(a.scaler.is_none());
        assert_eq!(a.metrics, b.metrics);
        assert_eq!(a.metrics.n_samples, 16);
        assert_eq!(a.n_train, 64);
        assert!(a.metrics.r2 > 0.8, "r2 = {}", a.metrics.r2);
    }

    #[test]
    fn test_scaled_linear_fits_linear_label() {
        let run = trainer()
            .train(&examples(60), &BASELINE_FEATURES, Model::linear(), true)
            .unwrap();

        let scaler = run.scaler.as_ref().unwrap();
        assert_eq!(scaler.mean.len(), 6);
        assert!(run.metrics.mae < 1e-3, "mae = {}", run.metrics.mae);
    }

    #[test]
    fn test_constant_feature_keeps_linear_candidate() {
        let data: Vec<_> = examples(60)
            .into_iter()
            .map(|mut e| {
                e.deal_month = Some(3);
                e
            })
            .collect();

        let run = trainer()
            .train(&data, &BASELINE_FEATURES, Model::linear(), true)
            .unwrap();
        assert!(run.metrics.mae < 1e-3, "mae = {}", run.metrics.mae);

        let report = trainer().run_experiments(&data).unwrap();
        assert_eq!(report.model_comparison.len(), 4);
        assert!(report
            .model_comparison
            .iter()
            .any(|row| row.model_name == "linear" && row.metrics.mae.is_finite()));
    }

    #[test]
    fn test_too_few_examples() {
        match trainer().train_baseline(&examples(1)) {
            Err(TrainError::NotEnoughExamples { usable, skipped }) => {
                assert_eq!(usable, 1);
                assert_eq!(skipped, 0);
            }
            other => panic!("expected NotEnoughExamples, got {:?}", other.map(|r| r.metrics)),
        }
    }

    #[test]
    fn test_experiments_cover_every_table() {
        let report = trainer().run_experiments(&examples(80)).unwrap();

        assert_eq!(report.model_comparison.len(), 4);
        assert!(report.model_comparison[3].model_name.starts_with("random_forest"));
        assert!(report.model_comparison[0].scaled);
        assert!(!report.model_comparison[3].scaled);
        assert_eq!(report.feature_comparison[1].feature_set, "engineered");

        let best = report.best.unwrap();
        let lowest = report
            .model_comparison
            .iter()
            .map(|r| r.metrics.mae)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(best.metrics.mae, lowest);
    }
}
