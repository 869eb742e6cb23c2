//! Training-set construction
//!
//! Turns the raw transaction table into labeled examples: every deal is
//! paired with the average price its own cohort (same complex, same 5㎡ size
//! bucket) traded at roughly five years later.

pub mod bucket;
pub mod builder;
pub mod calendar;
pub mod report;

pub use builder::{CohortKey, CohortLabelBuilder, LabelError, LabelOutcome, LabeledExample};
pub use report::{DropReason, DropReport};

use crate::dataset::csv_store::{read_records, write_json, write_records};
use crate::dataset::DatasetError;
use std::path::Path;

/// Write the training table and its drop report side by side
pub fn save_outcome(
    outcome: &LabelOutcome,
    training_path: impl AsRef<Path>,
    report_path: impl AsRef<Path>,
) -> Result<(), DatasetError> {
    write_records(training_path.as_ref(), &outcome.examples)?;
    write_json(report_path.as_ref(), &outcome.report)?;
    log::info!(
        "💾 Saved {} labeled examples to {}",
        outcome.examples.len(),
        training_path.as_ref().display()
    );
    Ok(())
}

pub fn load_training_set(path: impl AsRef<Path>) -> Result<Vec<LabeledExample>, DatasetError> {
    read_records(path.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Transaction;
    use tempfile::tempdir;

    #[test]
    fn test_training_csv_columns_and_reload() {
        let deals = vec![
            Transaction {
                apartment_name: "상도래미안".to_string(),
                exclusive_area: Some(59.9),
                deal_year: Some(2016),
                deal_month: Some(3),
                deal_day: Some(2),
                price: Some(52000.0),
                building_year: Some(2004),
                floor: None,
                ..Default::default()
            }
            .with_assembled_date(),
            Transaction {
                apartment_name: "상도래미안".to_string(),
                exclusive_area: Some(59.5),
                deal_year: Some(2021),
                deal_month: Some(1),
                deal_day: Some(20),
                price: Some(91000.0),
                building_year: Some(2004),
                floor: Some(3),
                ..Default::default()
            }
            .with_assembled_date(),
        ];
        let outcome = CohortLabelBuilder::new().build(&deals).unwrap();

        let dir = tempdir().unwrap();
        let training = dir.path().join("training.csv");
        let report = dir.path().join("drops.json");
        save_outcome(&outcome, &training, &report).unwrap();

        let text = std::fs::read_to_string(&training).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(
            header,
            "aptNm,area_bucket,dealDate,dealAmount_now,buildYear,age_at_deal,excluUseAr,floor,dealYear,dealMonth,price_5y"
        );

        let reloaded = load_training_set(&training).unwrap();
        assert_eq!(reloaded, outcome.examples);
        assert_eq!(reloaded[0].floor, None);

        let report_json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
        assert_eq!(report_json["kept"], 1);
        assert_eq!(report_json["dropped"]["no_future_match"], 1);
    }
}
