//! Trainer Binary - labeled training table → model bundle
//!
//! Default mode fits the baseline random forest on the six baseline features
//! and persists it. `--experiments` runs the model and feature-set
//! comparisons and logs the tables; add `--persist-best` to save the
//! lowest-MAE model from the comparison instead of the baseline.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin train_model
//! cargo run --release --bin train_model -- --experiments
//! cargo run --release --bin train_model -- --experiments --persist-best
//! ```
//!
//! ## Environment Variables
//!
//! - ESTATE_TRAINING_PATH - Training CSV input (default: data/sangdo_training.csv)
//! - ESTATE_MODEL_PATH - Model bundle output (default: ml/model.json)
//! - TRAIN_TEST_RATIO - Held-out fraction (default: 0.2)
//! - TRAIN_SEED - Split and forest seed (default: 42)
//! - FOREST_TREES - Random forest size (default: 300)
//! - FOREST_MAX_DEPTH - Random forest depth cap (default: unbounded)
//! - RUST_LOG - Logging level (optional, default: info)

use estate_forecast::cohort::load_training_set;
use estate_forecast::config::{DataPaths, TrainConfig};
use estate_forecast::model::{Regressor, Trainer};
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let args: Vec<String> = env::args().collect();
    let experiments = args.iter().any(|a| a == "--experiments");
    let persist_best = args.iter().any(|a| a == "--persist-best");

    let paths = DataPaths::from_env();
    let config = TrainConfig::from_env()?;

    log::info!("🚀 Training from {}", paths.training_csv);
    log::info!(
        "   Split: {:.0}% held out, seed {}",
        config.test_ratio * 100.0,
        config.seed
    );

    let examples = load_training_set(&paths.training_csv)?;
    log::info!("📥 Loaded {} labeled examples", examples.len());

    let trainer = Trainer::new(config);

    let run = if experiments {
        let report = trainer.run_experiments(&examples)?;
        report.log_tables();

        match (persist_best, report.best) {
            (true, Some(best)) => best,
            (true, None) => {
                log::warn!("⚠️  No finite-MAE model in the comparison, keeping the baseline");
                trainer.train_baseline(&examples)?
            }
            (false, _) => {
                log::info!("ℹ️  Experiments only, model bundle left untouched (use --persist-best)");
                return Ok(());
            }
        }
    } else {
        trainer.train_baseline(&examples)?
    };

    run.metrics.log(&run.model.name());
    run.into_bundle().save(&paths.model)?;

    log::info!("✅ Model saved to {}", paths.model);
    Ok(())
}
