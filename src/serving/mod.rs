//! Serving layer
//!
//! `ServingContext` is built once at startup (model bundle + raw deals for
//! one 법정동) and shared read-only behind an `Arc`. The query functions are
//! pure over that context; `api` only adapts them to HTTP.

pub mod api;
pub mod context;
pub mod query;

pub use api::{router, ApiError};
pub use context::ServingContext;
pub use query::{
    history, predict, search, ApartmentSummary, HistoryLine, HistoryPoint, HistoryPrediction,
    PriceHistory, PricePrediction, DEFAULT_HISTORY_YEARS,
};

use crate::features::Feature;

#[derive(Debug, Clone, PartialEq)]
pub enum ServeError {
    /// Missing or malformed request field (400)
    InvalidRequest(String),
    /// Stable error code: `apartment_not_found` or `no_deals_in_range` (404)
    NotFound(&'static str),
    /// Model input absent on the resolved deal (500)
    MissingFeature(Feature),
    Internal(String),
}

pub const APARTMENT_NOT_FOUND: &str = "apartment_not_found";
pub const NO_DEALS_IN_RANGE: &str = "no_deals_in_range";

impl std::fmt::Display for ServeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServeError::InvalidRequest(msg) => write!(f, "{}", msg),
            ServeError::NotFound(code) => write!(f, "{}", code),
            ServeError::MissingFeature(feature) => write!(f, "missing feature: {}", feature),
            ServeError::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ServeError {}

#[derive(Debug)]
pub enum StartupError {
    Bundle(crate::model::BundleError),
    Dataset(crate::dataset::DatasetError),
}

impl From<crate::model::BundleError> for StartupError {
    fn from(err: crate::model::BundleError) -> Self {
        StartupError::Bundle(err)
    }
}

impl From<crate::dataset::DatasetError> for StartupError {
    fn from(err: crate::dataset::DatasetError) -> Self {
        StartupError::Dataset(err)
    }
}

impl std::fmt::Display for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartupError::Bundle(e) => write!(f, "Failed to load model: {}", e),
            StartupError::Dataset(e) => write!(f, "Failed to load deals: {}", e),
        }
    }
}

impl std::error::Error for StartupError {}
