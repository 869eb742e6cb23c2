//! Drop histogram for the label builder

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// No parseable deal date: can be neither anchor nor future member
    UnparseableDate,
    MissingApartmentName,
    /// No area means no size bucket, hence no cohort
    MissingArea,
    /// Nothing in the cohort falls inside the five-year window
    NoFutureMatch,
    MissingCurrentPrice,
    /// Window was non-empty but none of its members had a price
    MissingLabel,
    MissingAge,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::UnparseableDate => "unparseable_date",
            DropReason::MissingApartmentName => "missing_apartment_name",
            DropReason::MissingArea => "missing_area",
            DropReason::NoFutureMatch => "no_future_match",
            DropReason::MissingCurrentPrice => "missing_current_price",
            DropReason::MissingLabel => "missing_label",
            DropReason::MissingAge => "missing_age",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DropReport {
    pub total_input: usize,
    pub kept: usize,
    pub cohorts: usize,
    pub dropped: BTreeMap<DropReason, usize>,
}

impl DropReport {
    pub fn record(&mut self, reason: DropReason) {
        *self.dropped.entry(reason).or_insert(0) += 1;
    }

    pub fn merge(&mut self, reasons: &[DropReason]) {
        for reason in reasons {
            self.record(*reason);
        }
    }

    pub fn count(&self, reason: DropReason) -> usize {
        self.dropped.get(&reason).copied().unwrap_or(0)
    }

    pub fn total_dropped(&self) -> usize {
        self.dropped.values().sum()
    }

    pub fn log_summary(&self) {
        log::info!("📊 Label build summary:");
        log::info!("   ├─ Input deals: {}", self.total_input);
        log::info!("   ├─ Cohorts: {}", self.cohorts);
        log::info!("   ├─ Labeled examples: {}", self.kept);
        log::info!("   └─ Dropped: {}", self.total_dropped());
        for (reason, count) in &self.dropped {
            log::info!("      • {}: {}", reason.as_str(), count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_counts() {
        let mut report = DropReport::default();
        report.record(DropReason::NoFutureMatch);
        report.merge(&[DropReason::NoFutureMatch, DropReason::MissingAge]);

        assert_eq!(report.count(DropReason::NoFutureMatch), 2);
        assert_eq!(report.count(DropReason::MissingAge), 1);
        assert_eq!(report.count(DropReason::MissingArea), 0);
        assert_eq!(report.total_dropped(), 3);
    }

    #[test]
    fn test_serializes_reason_keys_in_snake_case() {
        let mut report = DropReport::default();
        report.record(DropReason::MissingCurrentPrice);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["dropped"]["missing_current_price"], 1);
    }
}
