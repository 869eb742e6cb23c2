//! Raw and labeled dataset persistence
//!
//! The raw transaction table can live in CSV (default) or SQLite; the
//! training table and drop report are always CSV/JSON next to it.
//!
//! ```text
//! fetch_deals ──▶ DealWriterBackend (CSV | SQLite)
//!                          │
//!                          ▼
//!                   load_deals() ──▶ CohortLabelBuilder / ServingContext
//! ```

pub mod backend;
pub mod csv_store;
pub mod sqlite_store;
pub mod transaction;

pub use backend::{load_deals, open_writer, CsvDealWriter, DealWriterBackend, SqliteDealWriter};
pub use sqlite_store::SqliteDealStore;
pub use transaction::Transaction;

#[derive(Debug)]
pub enum DatasetError {
    Io(std::io::Error),
    Csv(csv::Error),
    Database(rusqlite::Error),
    Serialization(serde_json::Error),
    NotFound(String),
}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        DatasetError::Io(err)
    }
}

impl From<csv::Error> for DatasetError {
    fn from(err: csv::Error) -> Self {
        DatasetError::Csv(err)
    }
}

impl From<rusqlite::Error> for DatasetError {
    fn from(err: rusqlite::Error) -> Self {
        DatasetError::Database(err)
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(err: serde_json::Error) -> Self {
        DatasetError::Serialization(err)
    }
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::Io(e) => write!(f, "IO error: {}", e),
            DatasetError::Csv(e) => write!(f, "CSV error: {}", e),
            DatasetError::Database(e) => write!(f, "Database error: {}", e),
            DatasetError::Serialization(e) => write!(f, "Serialization error: {}", e),
            DatasetError::NotFound(path) => write!(f, "Dataset not found: {}", path),
        }
    }
}

impl std::error::Error for DatasetError {}
