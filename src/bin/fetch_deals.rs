//! Raw Fetcher Binary - RTMS apartment trades → raw dataset
//!
//! Pulls every month of the configured year range for one 시군구, keeps the
//! configured 법정동, and persists the rows.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin fetch_deals -- --backend csv
//! cargo run --release --bin fetch_deals -- --backend sqlite
//! ```
//!
//! ## Environment Variables
//!
//! - RTMS_SERVICE_KEY - data.go.kr service key (required)
//! - RTMS_BASE_URL - Endpoint override (default: RTMS apartment-trade endpoint)
//! - RTMS_LAWD_CD - 5-digit 시군구 code (default: 11590)
//! - RTMS_DONG - 법정동 to keep (default: 상도동)
//! - RTMS_ROWS_PER_PAGE - Page size (default: 1000)
//! - FETCH_START_YEAR / FETCH_END_YEAR - Inclusive year range (default: 2020-2025)
//! - FETCH_TIMEOUT_SECS - Per-request timeout (default: 10)
//! - FETCH_MAX_RETRIES - Retries per page (default: 3)
//! - ESTATE_RAW_PATH - CSV output (default: data/sangdo_raw.csv)
//! - ESTATE_DB_PATH - SQLite output when --backend sqlite (default: data/sangdo_raw.db)
//! - RUST_LOG - Logging level (optional, default: info)

use estate_forecast::config::{BackendType, DataPaths, FetchConfig};
use estate_forecast::dataset::open_writer;
use estate_forecast::fetcher::{month_keys, MonthlyFetcher};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let backend = BackendType::parse_from_args();
    let config = FetchConfig::from_env()?;
    let paths = DataPaths::from_env();
    let months = month_keys(config.start_year, config.end_year);

    log::info!("🚀 Starting RTMS fetch");
    log::info!("   Region: {} / {}", config.lawd_cd, config.dong);
    log::info!(
        "   Months: {} ({} → {})",
        months.len(),
        months.first().map(String::as_str).unwrap_or("-"),
        months.last().map(String::as_str).unwrap_or("-")
    );
    log::info!("   Output: {} ({})", paths.raw_for(backend), backend.as_str());

    let mut writer = open_writer(backend, &paths)?;
    log::info!("📊 Backend: {}", writer.backend_type());
    let fetcher = MonthlyFetcher::from_config(&config)?;
    let summary = fetcher.fetch_range(&months, writer.as_mut()).await?;

    log::info!("✅ Fetch complete");
    log::info!("   ├─ Months: {}", summary.months);
    log::info!("   ├─ Pages: {}", summary.pages);
    log::info!("   ├─ Rows fetched: {}", summary.fetched);
    log::info!("   └─ Rows kept ({}): {}", config.dong, summary.kept);

    Ok(())
}
