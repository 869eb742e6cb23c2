//! Persisted model bundle
//!
//! Written once by `train_model`, read once at server start. The bundle is
//! self-describing: the ordered feature list and the fitted scaler travel
//! with the regressor, so serving builds exactly the inputs training saw.

use super::metrics::RegressionMetrics;
use super::regressor::{Model, Regressor};
use super::scaler::StandardScaler;
use super::ModelError;
use crate::features::{Feature, FeatureSource, MissingFeature};
use chrono::{DateTime, Utc};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug)]
pub enum BundleError {
    Io(std::io::Error),
    Serialization(serde_json::Error),
    NotFound(String),
    Invalid(String),
}

impl From<std::io::Error> for BundleError {
    fn from(err: std::io::Error) -> Self {
        BundleError::Io(err)
    }
}

impl From<serde_json::Error> for BundleError {
    fn from(err: serde_json::Error) -> Self {
        BundleError::Serialization(err)
    }
}

impl std::fmt::Display for BundleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BundleError::Io(e) => write!(f, "IO error: {}", e),
            BundleError::Serialization(e) => write!(f, "Serialization error: {}", e),
            BundleError::NotFound(path) => write!(f, "Model bundle not found: {}", path),
            BundleError::Invalid(msg) => write!(f, "Invalid model bundle: {}", msg),
        }
    }
}

impl std::error::Error for BundleError {}

#[derive(Debug, Clone, PartialEq)]
pub enum PredictError {
    MissingFeature(Feature),
    Model(ModelError),
}

impl From<MissingFeature> for PredictError {
    fn from(err: MissingFeature) -> Self {
        PredictError::MissingFeature(err.0)
    }
}

impl From<ModelError> for PredictError {
    fn from(err: ModelError) -> Self {
        PredictError::Model(err)
    }
}

impl std::fmt::Display for PredictError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictError::MissingFeature(feature) => write!(f, "Missing feature: {}", feature),
            PredictError::Model(e) => write!(f, "Model error: {}", e),
        }
    }
}

impl std::error::Error for PredictError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub model: Model,
    /// Exact model input order
    pub features: Vec<Feature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<StandardScaler>,
    /// Held-out evaluation from training time
    pub report: RegressionMetrics,
    pub trained_at: DateTime<Utc>,
}

impl TrainedModel {
    pub fn new(
        model: Model,
        features: Vec<Feature>,
        scaler: Option<StandardScaler>,
        report: RegressionMetrics,
    ) -> Self {
        Self {
            model,
            features,
            scaler,
            report,
            trained_at: Utc::now(),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), BundleError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string(self)?;
        fs::write(path, json)?;

        log::info!("💾 Saved {} to {}", self.model.name(), path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BundleError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BundleError::NotFound(path.display().to_string()));
        }

        let json = fs::read_to_string(path)?;
        let bundle: TrainedModel = serde_json::from_str(&json)?;
        bundle.validate()?;

        log::info!(
            "📦 Loaded {} trained at {} (features: {})",
            bundle.model.name(),
            bundle.trained_at.format("%Y-%m-%d %H:%M:%S"),
            bundle
                .features
                .iter()
                .map(|f| f.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(bundle)
    }

    fn validate(&self) -> Result<(), BundleError> {
        if self.features.is_empty() {
            return Err(BundleError::Invalid("empty feature list".to_string()));
        }
        if !self.model.is_fitted() {
            return Err(BundleError::Invalid("model is not fitted".to_string()));
        }
        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != self.features.len() {
                return Err(BundleError::Invalid(format!(
                    "scaler width {} does not match {} features",
                    scaler.mean.len(),
                    self.features.len()
                )));
            }
        }
        Ok(())
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<f64, ModelError> {
        match &self.scaler {
            Some(scaler) => Ok(self.model.predict_row(scaler.transform_row(row)?.view())),
            None => Ok(self.model.predict_row(row)),
        }
    }

    pub fn predict(&self, source: &FeatureSource) -> Result<f64, PredictError> {
        let row = Array1::from(source.row(&self.features)?);
        Ok(self.predict_row(row.view())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::BASELINE_FEATURES;
    use crate::model::Dataset;
    use ndarray::array;
    use tempfile::tempdir;

    fn fitted_bundle(scaled: bool) -> TrainedModel {
        let features: Vec<Vec<f64>> = (0..30)
            .map(|i| {
                vec![
                    1000.0 * i as f64,
                    84.0 + (i % 2) as f64,
                    10.0 + (i % 3) as f64,
                    (i % 7) as f64,
                    2010.0 + (i % 5) as f64,
                    1.0 + (i % 11) as f64,
                ]
            })
            .collect();
        let labels = features.iter().map(|r| r[0] * 1.5).collect();
        let data = Dataset::new(features, labels, BASELINE_FEATURES.to_vec());

        let scaler = scaled.then(|| StandardScaler::fit(&data).unwrap());
        let train = match &scaler {
            Some(s) => s.transform(&data).unwrap(),
            None => data,
        };
        let mut model = Model::linear();
        model.fit(&train).unwrap();

        TrainedModel::new(
            model,
            BASELINE_FEATURES.to_vec(),
            scaler,
            RegressionMetrics::calculate(&array![1.0], &array![1.0]),
        )
    }

    fn source() -> FeatureSource {
        FeatureSource {
            current_price: Some(10000.0),
            exclusive_area: Some(84.0),
            age_at_deal: Some(10),
            floor: Some(3),
            deal_year: Some(2015),
            deal_month: Some(3),
        }
    }

    #[test]
    fn test_save_load_predicts_identically() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ml").join("model.json");

        let bundle = fitted_bundle(true);
        bundle.save(&path).unwrap();
        let loaded = TrainedModel::load(&path).unwrap();

        assert_eq!(loaded.features, bundle.features);
        assert_eq!(loaded.trained_at, bundle.trained_at);
        assert_eq!(loaded.scaler.as_ref().map(|s| s.mean.len()), Some(6));

        let before = bundle.predict(&source()).unwrap();
        let after = loaded.predict(&source()).unwrap();
        assert!((before - after).abs() < 1e-6);
        assert!((after - 15000.0).abs() < 1e-3);
    }

    #[test]
    fn test_predict_reports_missing_feature() {
        let bundle = fitted_bundle(false);
        let mut src = source();
        src.deal_month = None;

        assert_eq!(
            bundle.predict(&src),
            Err(PredictError::MissingFeature(Feature::DealMonth))
        );
    }

    #[test]
    fn test_load_rejects_missing_and_unfitted() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        assert!(matches!(TrainedModel::load(&missing), Err(BundleError::NotFound(_))));

        let unfitted = TrainedModel::new(
            Model::linear(),
            BASELINE_FEATURES.to_vec(),
            None,
            RegressionMetrics::calculate(&array![1.0], &array![1.0]),
        );
        let path = dir.path().join("unfitted.json");
        unfitted.save(&path).unwrap();
        assert!(matches!(TrainedModel::load(&path), Err(BundleError::Invalid(_))));
    }
}
