//! Five-year apartment price forecasting for one 법정동
//!
//! ```text
//! fetch_deals ──▶ raw CSV / SQLite ──▶ build_training_set ──▶ training CSV
//!                        │                                         │
//!                        │                                    train_model
//!                        ▼                                         ▼
//!                 forecast_server ◀───────────────────────── model bundle
//! ```

pub mod cohort;
pub mod config;
pub mod dataset;
pub mod features;
pub mod fetcher;
pub mod model;
pub mod serving;
