//! Search, predict, and history over an immutable `ServingContext`
//!
//! Predict and history resolve a name query differently on purpose:
//! - predict takes the single most recent matching deal
//! - history pins the most frequent matching name, then works on that complex
//!
//! Name matching is a case-sensitive substring test for both; only search
//! folds case.

use super::context::ServingContext;
use super::{ServeError, APARTMENT_NOT_FOUND, NO_DEALS_IN_RANGE};
use crate::cohort::calendar::lookback_start;
use crate::dataset::Transaction;
use crate::features::FeatureSource;
use crate::model::bundle::PredictError;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const DEFAULT_HISTORY_YEARS: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApartmentSummary {
    #[serde(rename = "aptNm")]
    pub apartment_name: String,
    #[serde(rename = "umdNm")]
    pub dong_name: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePrediction {
    #[serde(rename = "aptNm")]
    pub apartment_name: String,
    #[serde(rename = "umdNm")]
    pub dong_name: Option<String>,
    pub latest_deal_date: NaiveDate,
    pub latest_deal_price: f64,
    pub predicted_price_5y: f64,
    pub expected_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub price: f64,
    #[serde(rename = "excluUseAr")]
    pub exclusive_area: f64,
    pub floor: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryLine {
    pub area_bucket: f64,
    pub points: Vec<HistoryPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPrediction {
    pub latest_deal_date: NaiveDate,
    pub latest_deal_price: f64,
    pub predicted_price_5y: f64,
    pub expected_change: f64,
    #[serde(rename = "latest_excluUseAr")]
    pub latest_exclusive_area: Option<f64>,
    pub latest_area_bucket: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceHistory {
    #[serde(rename = "aptNm")]
    pub apartment_name: String,
    #[serde(rename = "umdNm")]
    pub dong_name: Option<String>,
    pub history_years: i64,
    pub lines: Vec<HistoryLine>,
    pub prediction: Option<HistoryPrediction>,
}

/// Case-insensitive substring search; blank query → no results
pub fn search(ctx: &ServingContext, query: &str) -> Vec<ApartmentSummary> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let names: BTreeSet<&str> = ctx
        .deals
        .iter()
        .filter(|tx| tx.has_name() && tx.apartment_name.to_lowercase().contains(&needle))
        .map(|tx| tx.apartment_name.as_str())
        .collect();

    names
        .into_iter()
        .map(|name| ApartmentSummary {
            apartment_name: name.to_string(),
            dong_name: ctx.dong.clone(),
            location: ctx.location.clone(),
        })
        .collect()
}

fn matching<'a>(ctx: &'a ServingContext, query: &'a str) -> impl Iterator<Item = &'a Transaction> + 'a {
    ctx.deals
        .iter()
        .filter(move |tx| tx.has_name() && tx.apartment_name.contains(query))
}

/// Most recent dated deal; ties go to the later one in snapshot order
fn latest<'a>(deals: impl Iterator<Item = &'a Transaction>) -> Option<(&'a Transaction, NaiveDate)> {
    deals
        .filter_map(|tx| tx.deal_date.map(|d| (tx, d)))
        .fold(None, |best, (tx, date)| match best {
            Some((_, best_date)) if date < best_date => best,
            _ => Some((tx, date)),
        })
}

struct Forecast {
    latest_price: f64,
    predicted: f64,
    change: f64,
}

fn forecast(ctx: &ServingContext, deal: &Transaction) -> Result<Forecast, ServeError> {
    let predicted = ctx.model.predict(&FeatureSource::from(deal)).map_err(|e| match e {
        PredictError::MissingFeature(feature) => ServeError::MissingFeature(feature),
        PredictError::Model(e) => ServeError::Internal(e.to_string()),
    })?;

    let latest_price = deal
        .price
        .ok_or_else(|| ServeError::Internal("latest deal has no price".to_string()))?;

    Ok(Forecast {
        latest_price,
        predicted,
        change: (predicted - latest_price) / latest_price,
    })
}

fn required_name(query: &str) -> Result<&str, ServeError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ServeError::InvalidRequest("aptNm is required".to_string()));
    }
    Ok(query)
}

pub fn predict(ctx: &ServingContext, query: &str) -> Result<PricePrediction, ServeError> {
    let query = required_name(query)?;
    let (deal, date) =
        latest(matching(ctx, query)).ok_or(ServeError::NotFound(APARTMENT_NOT_FOUND))?;

    let forecast = forecast(ctx, deal)?;

    Ok(PricePrediction {
        apartment_name: deal.apartment_name.clone(),
        dong_name: deal.dong_name.clone(),
        latest_deal_date: date,
        latest_deal_price: forecast.latest_price,
        predicted_price_5y: forecast.predicted,
        expected_change: forecast.change,
    })
}

/// Most frequent matching name; ties go to the name seen first
fn most_frequent_name<'a>(ctx: &'a ServingContext, query: &'a str) -> Option<&'a str> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, tx) in matching(ctx, query).enumerate() {
        let entry = counts
            .entry(tx.apartment_name.as_str())
            .or_insert((0, position));
        entry.0 += 1;
    }

    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(name, _)| name)
}

pub fn history(
    ctx: &ServingContext,
    query: &str,
    years: i64,
    today: NaiveDate,
) -> Result<PriceHistory, ServeError> {
    let query = required_name(query)?;
    if years < 0 {
        return Err(ServeError::InvalidRequest("years must be non-negative".to_string()));
    }

    let name = most_frequent_name(ctx, query).ok_or(ServeError::NotFound(APARTMENT_NOT_FOUND))?;
    let start = lookback_start(today, years)
        .ok_or_else(|| ServeError::InvalidRequest(format!("years out of range: {}", years)))?;

    let in_range: Vec<&Transaction> = ctx
        .deals
        .iter()
        .filter(|tx| tx.apartment_name == name)
        .filter(|tx| tx.deal_date.is_some_and(|d| d >= start))
        .collect();

    if in_range.is_empty() {
        return Err(ServeError::NotFound(NO_DEALS_IN_RANGE));
    }

    let mut buckets: BTreeMap<i64, Vec<HistoryPoint>> = BTreeMap::new();
    for tx in &in_range {
        let (Some(date), Some(price), Some(area), Some(bucket)) =
            (tx.deal_date, tx.price, tx.exclusive_area, tx.size_bucket())
        else {
            continue;
        };
        buckets.entry(bucket).or_default().push(HistoryPoint {
            date,
            price,
            exclusive_area: area,
            floor: tx.floor,
        });
    }

    let lines = buckets
        .into_iter()
        .map(|(bucket, mut points)| {
            points.sort_by_key(|p| p.date);
            HistoryLine {
                area_bucket: bucket as f64,
                points,
            }
        })
        .collect();

    let prediction = latest(in_range.iter().copied()).and_then(|(deal, date)| {
        match forecast(ctx, deal) {
            Ok(f) => Some(HistoryPrediction {
                latest_deal_date: date,
                latest_deal_price: f.latest_price,
                predicted_price_5y: f.predicted,
                expected_change: f.change,
                latest_exclusive_area: deal.exclusive_area,
                latest_area_bucket: deal.size_bucket().map(|b| b as f64),
            }),
            Err(e) => {
                log::warn!("⚠️  History prediction for {} failed: {}", name, e);
                None
            }
        }
    });

    Ok(PriceHistory {
        apartment_name: name.to_string(),
        dong_name: in_range[0].dong_name.clone(),
        history_years: years,
        lines,
        prediction,
    })
}
