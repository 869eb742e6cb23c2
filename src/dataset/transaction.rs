//! Raw apartment trade record as fetched from the RTMS API
//!
//! Column names follow the source payload (`aptNm`, `excluUseAr`, ...) so raw
//! CSV snapshots stay readable by other tooling. Every field except the name is
//! optional: the upstream records are sparse.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use crate::cohort::bucket::size_bucket;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "aptNm", default)]
    pub apartment_name: String,

    #[serde(rename = "aptSeq", default, deserialize_with = "opt_string")]
    pub apt_seq: Option<String>,

    #[serde(rename = "excluUseAr", default, deserialize_with = "opt_f64")]
    pub exclusive_area: Option<f64>,

    #[serde(rename = "dealYear", default, deserialize_with = "opt_i32")]
    pub deal_year: Option<i32>,

    #[serde(rename = "dealMonth", default, deserialize_with = "opt_u32")]
    pub deal_month: Option<u32>,

    #[serde(rename = "dealDay", default, deserialize_with = "opt_u32")]
    pub deal_day: Option<u32>,

    /// 만원 units
    #[serde(rename = "dealAmount", default, deserialize_with = "opt_f64")]
    pub price: Option<f64>,

    #[serde(rename = "buildYear", default, deserialize_with = "opt_i32")]
    pub building_year: Option<i32>,

    #[serde(rename = "umdNm", default, deserialize_with = "opt_string")]
    pub dong_name: Option<String>,

    #[serde(rename = "sggCd", default, deserialize_with = "opt_string")]
    pub sigungu_code: Option<String>,

    #[serde(default, deserialize_with = "opt_i32")]
    pub floor: Option<i32>,

    #[serde(rename = "dealDate", default, deserialize_with = "opt_date")]
    pub deal_date: Option<NaiveDate>,
}

impl Transaction {
    /// Derived cohort bucket, absent when the area is unknown
    pub fn size_bucket(&self) -> Option<i64> {
        self.exclusive_area.and_then(size_bucket)
    }

    /// `deal_year - building_year` when both are known
    pub fn age_at_deal(&self) -> Option<i32> {
        match (self.deal_year, self.building_year) {
            (Some(deal), Some(built)) => Some(deal - built),
            _ => None,
        }
    }

    /// Assemble `deal_date` from year/month/day. Invalid combinations
    /// (e.g. 2023-02-30) leave the date absent.
    pub fn with_assembled_date(mut self) -> Self {
        self.deal_date = match (self.deal_year, self.deal_month, self.deal_day) {
            (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y, m, d),
            _ => None,
        };
        self
    }

    /// Fill year/month from `deal_date` when the split columns are missing
    pub fn with_split_date_fields(mut self) -> Self {
        if let Some(date) = self.deal_date {
            self.deal_year.get_or_insert(date.year());
            self.deal_month.get_or_insert(date.month());
            self.deal_day.get_or_insert(date.day());
        }
        self
    }

    pub fn has_name(&self) -> bool {
        !self.apartment_name.trim().is_empty()
    }
}

/// Parse a numeric cell: tolerates thousands separators ("82,500"),
/// surrounding whitespace, and rejects NaN/inf.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integer cells may have been written as floats ("2015.0") by other tools
pub fn parse_integer(raw: &str) -> Option<i64> {
    parse_number(raw)
        .filter(|v| v.fract() == 0.0)
        .map(|v| v as i64)
}

/// Accepts `YYYY-MM-DD` optionally followed by a time component
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.as_deref().and_then(parse_number))
}

fn opt_i32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw
        .as_deref()
        .and_then(parse_integer)
        .and_then(|v| i32::try_from(v).ok()))
}

fn opt_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw
        .as_deref()
        .and_then(parse_integer)
        .and_then(|v| u32::try_from(v).ok()))
}

fn opt_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.as_deref().and_then(parse_date))
}
