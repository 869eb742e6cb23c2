//! HTTP adapter over the query functions
//!
//! GET  /health            - liveness
//! POST /search-apartments - `{query}`
//! POST /predict-price     - `{aptNm}`
//! POST /price-history     - `{aptNm, years?}`

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::context::ServingContext;
use super::query::{self, DEFAULT_HISTORY_YEARS};
use super::ServeError;

pub fn router(ctx: Arc<ServingContext>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/search-apartments", post(search_apartments))
        .route("/predict-price", post(predict_price))
        .route("/price-history", post(price_history))
        .with_state(ctx)
}

/// `ServeError` rendered as a JSON error body
#[derive(Debug)]
pub struct ApiError(pub ServeError);

impl From<ServeError> for ApiError {
    fn from(err: ServeError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            ServeError::InvalidRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ServeError::NotFound(code) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": code }))).into_response()
            }
            ServeError::MissingFeature(feature) => {
                log::error!("❌ Prediction failed: feature {} is missing", feature);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "missing_feature",
                        "missing": feature.name(),
                        "message": format!("required feature {} is missing for the latest deal", feature),
                    })),
                )
                    .into_response()
            }
            ServeError::Internal(message) => {
                log::error!("❌ Request failed: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "server_error", "message": message })),
                )
                    .into_response()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    query: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PredictRequest {
    #[serde(rename = "aptNm")]
    apartment_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryRequest {
    #[serde(rename = "aptNm")]
    apartment_name: Option<String>,
    /// Integer or numeric string
    years: Option<Value>,
}

fn required(body: Result<Option<String>, JsonRejection>, message: &str) -> Result<String, ApiError> {
    match body {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(ServeError::InvalidRequest(message.to_string()).into()),
        Err(rejection) => {
            log::debug!("Rejected body: {}", rejection);
            Err(ServeError::InvalidRequest(message.to_string()).into())
        }
    }
}

fn parse_years(raw: Option<Value>) -> Result<i64, ApiError> {
    let invalid = || ApiError(ServeError::InvalidRequest("years must be an integer".to_string()));
    match raw {
        None | Some(Value::Null) => Ok(DEFAULT_HISTORY_YEARS),
        Some(Value::Number(n)) => n.as_i64().ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

async fn health() -> Response {
    (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
}

async fn search_apartments(
    State(ctx): State<Arc<ServingContext>>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let query = required(body.map(|Json(req)| req.query), "query is required")?;
    let apartments = query::search(&ctx, &query);

    log::debug!("🔎 search {:?} → {} apartment(s)", query, apartments.len());
    Ok((StatusCode::OK, Json(json!({ "apartments": apartments }))).into_response())
}

async fn predict_price(
    State(ctx): State<Arc<ServingContext>>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let name = required(body.map(|Json(req)| req.apartment_name), "aptNm is required")?;
    let prediction = query::predict(&ctx, &name)?;

    log::info!(
        "📈 {} {} → {:.0} ({:+.1}%)",
        prediction.apartment_name,
        prediction.latest_deal_price,
        prediction.predicted_price_5y,
        prediction.expected_change * 100.0
    );
    Ok((StatusCode::OK, Json(prediction)).into_response())
}

async fn price_history(
    State(ctx): State<Arc<ServingContext>>,
    body: Result<Json<HistoryRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let (name, years) = match body {
        Ok(Json(req)) => (Ok(req.apartment_name), req.years),
        Err(rejection) => (Err(rejection), None),
    };
    let name = required(name, "aptNm is required")?;
    let years = parse_years(years)?;

    let today = chrono::Local::now().date_naive();
    let history = query::history(&ctx, &name, years, today)?;

    Ok((StatusCode::OK, Json(history)).into_response())
}
