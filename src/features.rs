//! Feature extraction shared by training and serving
//!
//! Both the trainer (from `LabeledExample`) and the serving layer (from a raw
//! `Transaction`) go through `FeatureSource`, so `age_at_deal` and the
//! engineered groups are derived the same way on both sides.

use crate::cohort::bucket::{age_group, floor_group, season};
use crate::cohort::LabeledExample;
use crate::dataset::Transaction;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    CurrentPrice,
    ExclusiveArea,
    AgeAtDeal,
    Floor,
    DealYear,
    DealMonth,
    /// current_price / exclusive_area
    PricePerArea,
    AgeGroup,
    FloorGroup,
    Season,
}

/// Model input order for the baseline model
pub const BASELINE_FEATURES: [Feature; 6] = [
    Feature::CurrentPrice,
    Feature::ExclusiveArea,
    Feature::AgeAtDeal,
    Feature::Floor,
    Feature::DealYear,
    Feature::DealMonth,
];

/// Baseline plus the engineered groups
pub const ENGINEERED_FEATURES: [Feature; 10] = [
    Feature::CurrentPrice,
    Feature::ExclusiveArea,
    Feature::AgeAtDeal,
    Feature::Floor,
    Feature::DealYear,
    Feature::DealMonth,
    Feature::PricePerArea,
    Feature::AgeGroup,
    Feature::FloorGroup,
    Feature::Season,
];

impl Feature {
    pub fn name(&self) -> &'static str {
        match self {
            Feature::CurrentPrice => "current_price",
            Feature::ExclusiveArea => "exclusive_area",
            Feature::AgeAtDeal => "age_at_deal",
            Feature::Floor => "floor",
            Feature::DealYear => "deal_year",
            Feature::DealMonth => "deal_month",
            Feature::PricePerArea => "price_per_area",
            Feature::AgeGroup => "age_group",
            Feature::FloorGroup => "floor_group",
            Feature::Season => "season",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A required model input was absent on the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingFeature(pub Feature);

impl fmt::Display for MissingFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Missing feature: {}", self.0)
    }
}

impl std::error::Error for MissingFeature {}

/// The raw fields every feature is derived from
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeatureSource {
    pub current_price: Option<f64>,
    pub exclusive_area: Option<f64>,
    pub age_at_deal: Option<i32>,
    pub floor: Option<i32>,
    pub deal_year: Option<i32>,
    pub deal_month: Option<u32>,
}

impl From<&Transaction> for FeatureSource {
    fn from(tx: &Transaction) -> Self {
        Self {
            current_price: tx.price,
            exclusive_area: tx.exclusive_area,
            age_at_deal: tx.age_at_deal(),
            floor: tx.floor,
            deal_year: tx.deal_year,
            deal_month: tx.deal_month,
        }
    }
}

impl From<&LabeledExample> for FeatureSource {
    fn from(example: &LabeledExample) -> Self {
        Self {
            current_price: Some(example.current_price),
            exclusive_area: Some(example.exclusive_area),
            age_at_deal: Some(example.age_at_deal),
            floor: example.floor,
            deal_year: example.deal_year,
            deal_month: example.deal_month,
        }
    }
}

impl FeatureSource {
    pub fn value(&self, feature: Feature) -> Option<f64> {
        match feature {
            Feature::CurrentPrice => self.current_price,
            Feature::ExclusiveArea => self.exclusive_area,
            Feature::AgeAtDeal => self.age_at_deal.map(f64::from),
            Feature::Floor => self.floor.map(f64::from),
            Feature::DealYear => self.deal_year.map(f64::from),
            Feature::DealMonth => self.deal_month.map(f64::from),
            Feature::PricePerArea => match (self.current_price, self.exclusive_area) {
                (Some(price), Some(area)) if area > 0.0 => Some(price / area),
                _ => None,
            },
            Feature::AgeGroup => self.age_at_deal.and_then(age_group).map(f64::from),
            Feature::FloorGroup => self.floor.and_then(floor_group).map(f64::from),
            Feature::Season => self.deal_month.and_then(season).map(f64::from),
        }
    }

    /// Values in `features` order; the first absent one is reported
    pub fn row(&self, features: &[Feature]) -> Result<Vec<f64>, MissingFeature> {
        features
            .iter()
            .map(|f| self.value(*f).ok_or(MissingFeature(*f)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx() -> Transaction {
        Transaction {
            apartment_name: "상도더샵".to_string(),
            exclusive_area: Some(84.0),
            deal_year: Some(2023),
            deal_month: Some(7),
            price: Some(126000.0),
            building_year: Some(2007),
            floor: Some(12),
            ..Default::default()
        }
    }

    #[test]
    fn test_baseline_row_order() {
        let row = FeatureSource::from(&tx()).row(&BASELINE_FEATURES).unwrap();
        assert_eq!(row, vec![126000.0, 84.0, 16.0, 12.0, 2023.0, 7.0]);
    }

    #[test]
    fn test_engineered_values() {
        let source = FeatureSource::from(&tx());
        assert_eq!(source.value(Feature::PricePerArea), Some(1500.0));
        assert_eq!(source.value(Feature::AgeGroup), Some(2.0));
        assert_eq!(source.value(Feature::FloorGroup), Some(1.0));
        assert_eq!(source.value(Feature::Season), Some(2.0));
    }

    #[test]
    fn test_missing_feature_is_named() {
        let mut deal = tx();
        deal.floor = None;
        let err = FeatureSource::from(&deal).row(&BASELINE_FEATURES).unwrap_err();
        assert_eq!(err, MissingFeature(Feature::Floor));
        assert_eq!(err.0.name(), "floor");

        deal.building_year = None;
        let err = FeatureSource::from(&deal).row(&BASELINE_FEATURES).unwrap_err();
        assert_eq!(err.0, Feature::AgeAtDeal);
    }

    #[test]
    fn test_feature_names_serialize_as_column_names() {
        let json = serde_json::to_string(&BASELINE_FEATURES).unwrap();
        assert_eq!(
            json,
            r#"["current_price","exclusive_area","age_at_deal","floor","deal_year","deal_month"]"#
        );
    }
}
