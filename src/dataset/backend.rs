//! Writer backend trait for raw deal snapshots
//!
//! The fetcher streams monthly batches into a backend; `flush` makes the
//! snapshot durable. Loading goes through `load_deals` so every consumer sees
//! the same ordering regardless of storage.

use super::csv_store::{read_records, write_records};
use super::sqlite_store::SqliteDealStore;
use super::transaction::Transaction;
use super::DatasetError;
use crate::config::{BackendType, DataPaths};
use async_trait::async_trait;
use std::path::PathBuf;

#[async_trait]
pub trait DealWriterBackend: Send {
    /// Append a batch of normalized deals
    async fn write_deals(&mut self, deals: &[Transaction]) -> Result<(), DatasetError>;

    /// Persist everything written so far
    async fn flush(&mut self) -> Result<(), DatasetError>;

    /// Backend type for logging
    fn backend_type(&self) -> &'static str;
}

/// CSV backend: buffers in memory, rewrites the whole file on flush
pub struct CsvDealWriter {
    path: PathBuf,
    buffer: Vec<Transaction>,
}

impl CsvDealWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        log::info!("📝 Writing raw deals to: {}", path.display());
        Self {
            path,
            buffer: Vec::new(),
        }
    }
}

#[async_trait]
impl DealWriterBackend for CsvDealWriter {
    async fn write_deals(&mut self, deals: &[Transaction]) -> Result<(), DatasetError> {
        self.buffer.extend_from_slice(deals);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), DatasetError> {
        write_records(&self.path, &self.buffer)
    }

    fn backend_type(&self) -> &'static str {
        "CSV"
    }
}

/// SQLite backend: each batch is one insert transaction
pub struct SqliteDealWriter {
    store: SqliteDealStore,
}

impl SqliteDealWriter {
    /// Opens the store and clears any previous snapshot
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self, DatasetError> {
        let store = SqliteDealStore::open(db_path.into())?;
        store.clear()?;
        Ok(Self { store })
    }
}

#[async_trait]
impl DealWriterBackend for SqliteDealWriter {
    async fn write_deals(&mut self, deals: &[Transaction]) -> Result<(), DatasetError> {
        self.store.insert_deals(deals)?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), DatasetError> {
        // Batches are committed on write
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "SQLite"
    }
}

pub fn open_writer(
    backend: BackendType,
    paths: &DataPaths,
) -> Result<Box<dyn DealWriterBackend>, DatasetError> {
    let writer: Box<dyn DealWriterBackend> = match backend {
        BackendType::Csv => Box::new(CsvDealWriter::new(&paths.raw_csv)),
        BackendType::Sqlite => Box::new(SqliteDealWriter::new(&paths.raw_db)?),
    };
    Ok(writer)
}

/// Load the raw snapshot from the selected backend, in fetch order
pub fn load_deals(backend: BackendType, paths: &DataPaths) -> Result<Vec<Transaction>, DatasetError> {
    let deals = match backend {
        BackendType::Csv => read_records::<Transaction>(&paths.raw_csv)?,
        BackendType::Sqlite => SqliteDealStore::open_existing(&paths.raw_db)?.load_all()?,
    };

    log::info!(
        "📥 Loaded {} raw deals ({})",
        deals.len(),
        paths.raw_for(backend)
    );
    Ok(deals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_paths(dir: &std::path::Path) -> DataPaths {
        DataPaths {
            raw_csv: dir.join("raw.csv").display().to_string(),
            raw_db: dir.join("raw.db").display().to_string(),
            training_csv: dir.join("training.csv").display().to_string(),
            drop_report: dir.join("drops.json").display().to_string(),
            model: dir.join("model.json").display().to_string(),
        }
    }

    fn deal(name: &str, month: u32) -> Transaction {
        Transaction {
            apartment_name: name.to_string(),
            exclusive_area: Some(84.0),
            deal_year: Some(2022),
            deal_month: Some(month),
            deal_day: Some(10),
            price: Some(110000.0),
            ..Default::default()
        }
        .with_assembled_date()
    }

    #[tokio::test]
    async fn test_csv_backend_write_and_load() {
        let dir = tempdir().unwrap();
        let paths = test_paths(dir.path());

        let mut writer = open_writer(BackendType::Csv, &paths).unwrap();
        writer.write_deals(&[deal("상도파크", 1)]).await.unwrap();
        writer.write_deals(&[deal("상도파크", 2), deal("상도센트럴", 2)]).await.unwrap();
        writer.flush().await.unwrap();
        assert_eq!(writer.backend_type(), "CSV");

        let loaded = load_deals(BackendType::Csv, &paths).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[2].apartment_name, "상도센트럴");
    }

    #[tokio::test]
    async fn test_sqlite_backend_replaces_previous_snapshot() {
        let dir = tempdir().unwrap();
        let paths = test_paths(dir.path());

        {
            let mut writer = open_writer(BackendType::Sqlite, &paths).unwrap();
            writer.write_deals(&[deal("old", 1)]).await.unwrap();
            writer.flush().await.unwrap();
        }

        let mut writer = open_writer(BackendType::Sqlite, &paths).unwrap();
        writer.write_deals(&[deal("new", 5)]).await.unwrap();
        writer.flush().await.unwrap();
        assert_eq!(writer.backend_type(), "SQLite");

        let loaded = load_deals(BackendType::Sqlite, &paths).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].apartment_name, "new");
    }
}
