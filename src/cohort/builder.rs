//! Cohort label builder: windowed temporal self-join
//!
//! ```text
//! deals ──▶ exclude undated / unnamed / area-less
//!        ──▶ BTreeMap<(aptNm, size_bucket), members>   (input order kept)
//!        ──▶ stable sort by date per cohort
//!        ──▶ per anchor: members in [d+5y-6mo, d+5y+6mo] ──▶ mean price
//!        ──▶ required-field filter ──▶ (examples, DropReport)
//! ```
//!
//! Cohorts are independent, so they are labeled on the rayon pool. Cohorts are
//! visited in key order and results concatenated in that order, so the output
//! does not depend on scheduling.

use super::calendar::label_window;
use super::report::{DropReason, DropReport};
use crate::dataset::Transaction;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Anchor transaction enriched with its five-year-forward label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledExample {
    #[serde(rename = "aptNm")]
    pub apartment_name: String,
    #[serde(rename = "area_bucket")]
    pub size_bucket: i64,
    #[serde(rename = "dealDate")]
    pub anchor_date: NaiveDate,
    #[serde(rename = "dealAmount_now")]
    pub current_price: f64,
    #[serde(rename = "buildYear")]
    pub building_year: Option<i32>,
    pub age_at_deal: i32,
    #[serde(rename = "excluUseAr")]
    pub exclusive_area: f64,
    pub floor: Option<i32>,
    #[serde(rename = "dealYear")]
    pub deal_year: Option<i32>,
    #[serde(rename = "dealMonth")]
    pub deal_month: Option<u32>,
    /// Mean price of the cohort's deals inside the label window
    #[serde(rename = "price_5y")]
    pub label: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CohortKey {
    pub apartment_name: String,
    pub size_bucket: i64,
}

#[derive(Debug)]
pub enum LabelError {
    /// Input had rows but none could join any cohort
    NoUsableDeals { total: usize },
}

impl std::fmt::Display for LabelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelError::NoUsableDeals { total } => write!(
                f,
                "None of the {} input deals has a parseable date, name, and area",
                total
            ),
        }
    }
}

impl std::error::Error for LabelError {}

#[derive(Debug, Clone)]
pub struct LabelOutcome {
    pub examples: Vec<LabeledExample>,
    pub report: DropReport,
}

#[derive(Debug, Clone, Copy)]
struct CohortMember<'a> {
    date: NaiveDate,
    deal: &'a Transaction,
}

#[derive(Default)]
struct CohortResult {
    examples: Vec<LabeledExample>,
    drops: Vec<DropReason>,
}

pub struct CohortLabelBuilder {
    parallel: bool,
}

impl Default for CohortLabelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CohortLabelBuilder {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    /// Label cohorts on the calling thread only
    pub fn sequential() -> Self {
        Self { parallel: false }
    }

    pub fn build(&self, deals: &[Transaction]) -> Result<LabelOutcome, LabelError> {
        let mut report = DropReport {
            total_input: deals.len(),
            ..Default::default()
        };

        let cohorts = partition_cohorts(deals, &mut report);

        if cohorts.is_empty() && !deals.is_empty() {
            return Err(LabelError::NoUsableDeals { total: deals.len() });
        }
        report.cohorts = cohorts.len();

        let cohorts: Vec<(CohortKey, Vec<CohortMember<'_>>)> = cohorts.into_iter().collect();

        let results: Vec<CohortResult> = if self.parallel {
            cohorts
                .par_iter()
                .map(|(key, members)| label_cohort(key, members))
                .collect()
        } else {
            cohorts
                .iter()
                .map(|(key, members)| label_cohort(key, members))
                .collect()
        };

        let mut examples = Vec::new();
        for result in results {
            examples.extend(result.examples);
            report.merge(&result.drops);
        }
        report.kept = examples.len();

        log::debug!(
            "Labeled {} of {} deals across {} cohorts",
            report.kept,
            report.total_input,
            report.cohorts
        );

        Ok(LabelOutcome { examples, report })
    }
}

/// Group usable deals by (name, bucket); members sorted by date, ties in input order
fn partition_cohorts<'a>(
    deals: &'a [Transaction],
    report: &mut DropReport,
) -> BTreeMap<CohortKey, Vec<CohortMember<'a>>> {
    let mut cohorts: BTreeMap<CohortKey, Vec<CohortMember<'a>>> = BTreeMap::new();

    for deal in deals {
        let Some(date) = deal.deal_date else {
            report.record(DropReason::UnparseableDate);
            continue;
        };
        if !deal.has_name() {
            report.record(DropReason::MissingApartmentName);
            continue;
        }
        let Some(size_bucket) = deal.size_bucket() else {
            report.record(DropReason::MissingArea);
            continue;
        };

        let key = CohortKey {
            apartment_name: deal.apartment_name.clone(),
            size_bucket,
        };
        cohorts.entry(key).or_default().push(CohortMember { date, deal });
    }

    for members in cohorts.values_mut() {
        // sort_by_key is stable
        members.sort_by_key(|m| m.date);
    }

    cohorts
}

fn label_cohort(key: &CohortKey, members: &[CohortMember<'_>]) -> CohortResult {
    let mut result = CohortResult::default();

    for anchor in members {
        match label_anchor(key, anchor, members) {
            Ok(example) => result.examples.push(example),
            Err(reason) => result.drops.push(reason),
        }
    }

    result
}

fn label_anchor(
    key: &CohortKey,
    anchor: &CohortMember<'_>,
    members: &[CohortMember<'_>],
) -> Result<LabeledExample, DropReason> {
    let window = label_window(anchor.date).ok_or(DropReason::NoFutureMatch)?;

    // Members are date-sorted, so the window is a contiguous slice
    let lo = members.partition_point(|m| m.date < window.start);
    let hi = members.partition_point(|m| m.date <= window.end);
    if lo >= hi {
        return Err(DropReason::NoFutureMatch);
    }

    let label = mean_price(&members[lo..hi]);
    let deal = anchor.deal;

    let current_price = deal.price.ok_or(DropReason::MissingCurrentPrice)?;
    let label = label.ok_or(DropReason::MissingLabel)?;
    let exclusive_area = deal.exclusive_area.ok_or(DropReason::MissingArea)?;
    let age_at_deal = deal.age_at_deal().ok_or(DropReason::MissingAge)?;

    Ok(LabeledExample {
        apartment_name: key.apartment_name.clone(),
        size_bucket: key.size_bucket,
        anchor_date: anchor.date,
        current_price,
        building_year: deal.building_year,
        age_at_deal,
        exclusive_area,
        floor: deal.floor,
        deal_year: deal.deal_year,
        deal_month: deal.deal_month,
        label,
    })
}

/// Plain mean over members that carry a price
fn mean_price(members: &[CohortMember<'_>]) -> Option<f64> {
    let prices: Vec<f64> = members.iter().filter_map(|m| m.deal.price).collect();
    if prices.is_empty() {
        return None;
    }
    Some(prices.iter().sum::<f64>() / prices.len() as f64)
}
