//! Forecast Server Binary - search, 5-year prediction, and price history
//!
//! Loads the model bundle and the raw deals once at startup and serves them
//! read-only. Startup fails if either artifact is missing.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin forecast_server -- --backend csv
//! ```
//!
//! ## Environment Variables
//!
//! - ESTATE_MODEL_PATH - Model bundle (default: ml/model.json)
//! - ESTATE_RAW_PATH - Raw CSV (default: data/sangdo_raw.csv)
//! - ESTATE_DB_PATH - Raw SQLite when --backend sqlite (default: data/sangdo_raw.db)
//! - RTMS_DONG - Served 법정동 (default: 상도동)
//! - SERVER_LOCATION - Address label in search results (default: 서울 동작구 상도동)
//! - SERVER_HOST / SERVER_PORT - Bind address (default: 0.0.0.0:5000)
//! - RUST_LOG - Logging level (optional, default: info)

use estate_forecast::config::{BackendType, DataPaths, ServerConfig};
use estate_forecast::serving::{router, ServingContext};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let backend = BackendType::parse_from_args();
    let paths = DataPaths::from_env();
    let config = ServerConfig::from_env();

    log::info!("🚀 Starting forecast server");
    log::info!("   Model: {}", paths.model);
    log::info!("   Deals: {} ({})", paths.raw_for(backend), backend.as_str());

    let ctx = Arc::new(ServingContext::load(&paths, backend, &config)?);
    let app = router(ctx);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    log::info!("🌐 Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
