//! Cohort Label Builder Binary - raw dataset → labeled training table
//!
//! Labels every deal with the mean price of its (apartment, size bucket)
//! cohort five years later, ± six months. Anchors without a usable label are
//! dropped and counted by reason in the drop report.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin build_training_set -- --backend csv
//! ```
//!
//! ## Environment Variables
//!
//! - ESTATE_RAW_PATH - Raw CSV input (default: data/sangdo_raw.csv)
//! - ESTATE_DB_PATH - Raw SQLite input when --backend sqlite (default: data/sangdo_raw.db)
//! - ESTATE_TRAINING_PATH - Training CSV output (default: data/sangdo_training.csv)
//! - ESTATE_DROP_REPORT_PATH - Drop report output (default: data/sangdo_drop_report.json)
//! - RUST_LOG - Logging level (optional, default: info)

use estate_forecast::cohort::{save_outcome, CohortLabelBuilder};
use estate_forecast::config::{BackendType, DataPaths};
use estate_forecast::dataset::load_deals;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let backend = BackendType::parse_from_args();
    let paths = DataPaths::from_env();

    log::info!("🚀 Building training set");
    log::info!("   Input: {} ({})", paths.raw_for(backend), backend.as_str());
    log::info!("   Output: {}", paths.training_csv);

    let deals = load_deals(backend, &paths)?;
    let outcome = CohortLabelBuilder::new().build(&deals)?;

    outcome.report.log_summary();
    save_outcome(&outcome, &paths.training_csv, &paths.drop_report)?;

    log::info!("📝 Drop report: {}", paths.drop_report);
    Ok(())
}
