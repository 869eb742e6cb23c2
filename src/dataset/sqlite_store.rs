//! SQLite store for raw deals
//!
//! Single `deals` table mirroring the CSV columns; `id` preserves fetch order
//! so loads come back in the same order the fetcher wrote them.

use super::transaction::{parse_date, Transaction};
use super::DatasetError;
use rusqlite::{params, Connection};
use std::path::Path;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS deals (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        apt_nm TEXT NOT NULL,
        apt_seq TEXT,
        exclu_use_ar REAL,
        deal_year INTEGER,
        deal_month INTEGER,
        deal_day INTEGER,
        deal_amount REAL,
        build_year INTEGER,
        umd_nm TEXT,
        sgg_cd TEXT,
        floor INTEGER,
        deal_date TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_deals_apt_nm ON deals(apt_nm);
";

pub struct SqliteDealStore {
    conn: Connection,
}

impl SqliteDealStore {
    /// Open (or create) the database and apply the schema (idempotent)
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let db_path = db_path.as_ref();
        super::csv_store::ensure_parent_dir(db_path)?;

        let conn = Connection::open(db_path)?;
        let journal_mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.execute_batch(SCHEMA)?;
        log::debug!("SQLite journal_mode={}", journal_mode);

        log::info!("✅ SQLite deal store ready: {}", db_path.display());
        Ok(Self { conn })
    }

    /// Open an existing database without creating it
    pub fn open_existing(db_path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let db_path = db_path.as_ref();
        if !db_path.exists() {
            return Err(DatasetError::NotFound(db_path.display().to_string()));
        }
        Self::open(db_path)
    }

    /// Insert all deals in one transaction
    pub fn insert_deals(&mut self, deals: &[Transaction]) -> Result<usize, DatasetError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO deals (apt_nm, apt_seq, exclu_use_ar, deal_year, deal_month, deal_day,
                                    deal_amount, build_year, umd_nm, sgg_cd, floor, deal_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;

            for deal in deals {
                stmt.execute(params![
                    deal.apartment_name,
                    deal.apt_seq,
                    deal.exclusive_area,
                    deal.deal_year,
                    deal.deal_month,
                    deal.deal_day,
                    deal.price,
                    deal.building_year,
                    deal.dong_name,
                    deal.sigungu_code,
                    deal.floor,
                    deal.deal_date.map(|d| d.format("%Y-%m-%d").to_string()),
                ])?;
            }
        }
        tx.commit()?;

        log::debug!("📝 Inserted {} deals", deals.len());
        Ok(deals.len())
    }

    /// Drop every stored deal (a fetch run replaces the snapshot)
    pub fn clear(&self) -> Result<(), DatasetError> {
        self.conn.execute("DELETE FROM deals", [])?;
        Ok(())
    }

    pub fn load_all(&self) -> Result<Vec<Transaction>, DatasetError> {
        let mut stmt = self.conn.prepare(
            "SELECT apt_nm, apt_seq, exclu_use_ar, deal_year, deal_month, deal_day,
                    deal_amount, build_year, umd_nm, sgg_cd, floor, deal_date
             FROM deals
             ORDER BY id ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            let deal_date: Option<String> = row.get(11)?;
            Ok(Transaction {
                apartment_name: row.get(0)?,
                apt_seq: row.get(1)?,
                exclusive_area: row.get(2)?,
                deal_year: row.get(3)?,
                deal_month: row.get(4)?,
                deal_day: row.get(5)?,
                price: row.get(6)?,
                building_year: row.get(7)?,
                dong_name: row.get(8)?,
                sigungu_code: row.get(9)?,
                floor: row.get(10)?,
                deal_date: deal_date.as_deref().and_then(parse_date),
            })
        })?;

        let mut deals = Vec::new();
        for row in rows {
            deals.push(row?);
        }
        Ok(deals)
    }

    pub fn count(&self) -> Result<i64, DatasetError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM deals", [], |row| row.get(0))?;
        Ok(count)
    }
}
