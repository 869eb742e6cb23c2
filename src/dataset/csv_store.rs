//! CSV tables (raw deals, training examples)

use super::DatasetError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::path::Path;

/// Read every row of a CSV file with headers.
///
/// A row that fails to deserialize aborts the load: a partially readable
/// snapshot is treated as corrupt rather than silently truncated.
pub fn read_records<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>, DatasetError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DatasetError::NotFound(path.display().to_string()));
    }

    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

    let mut records = Vec::new();
    for result in reader.deserialize() {
        records.push(result?);
    }

    log::debug!("Read {} rows from {}", records.len(), path.display());
    Ok(records)
}

/// Write rows with a header line, creating parent directories as needed
pub fn write_records<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> Result<(), DatasetError> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;

    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    log::debug!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

/// Pretty JSON side artifact (drop report)
pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), DatasetError> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;

    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn ensure_parent_dir(path: &Path) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Transaction;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    #[test]
    fn test_write_then_read_transactions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("raw.csv");

        let deals = vec![
            Transaction {
                apartment_name: "상도파크자이".to_string(),
                exclusive_area: Some(84.97),
                price: Some(125000.0),
                floor: Some(12),
                deal_date: NaiveDate::from_ymd_opt(2020, 2, 15),
                ..Default::default()
            },
            Transaction {
                apartment_name: "상도센트럴".to_string(),
                ..Default::default()
            },
        ];

        write_records(&path, &deals).unwrap();
        let loaded: Vec<Transaction> = read_records(&path).unwrap();

        assert_eq!(loaded, deals);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let result: Result<Vec<Transaction>, _> = read_records(dir.path().join("absent.csv"));

        assert!(matches!(result, Err(DatasetError::NotFound(_))));
    }
}
