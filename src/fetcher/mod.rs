//! Raw fetcher: RTMS apartment trades → raw dataset
//!
//! ```text
//! for each YYYYMM in [start_year-01, end_year-12]:
//!     page 1..N (until totalCount rows seen)  ── retry w/ backoff per page
//!       └─ parse XML ─▶ normalize ─▶ keep configured dong
//!     DealWriterBackend::write_deals(month rows)
//! DealWriterBackend::flush()
//! ```

pub mod backoff;
pub mod client;
pub mod xml;

pub use backoff::ExponentialBackoff;
pub use client::RtmsClient;
pub use xml::{parse_page, TradePage};

use crate::config::FetchConfig;
use crate::dataset::{DatasetError, DealWriterBackend, Transaction};
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug)]
pub enum FetchError {
    Http(reqwest::Error),
    Status(u16),
    Xml(String),
    /// Non-success `resultCode` or gateway error envelope
    Api { code: String, message: String },
    RetriesExhausted {
        deal_ym: String,
        page_no: u32,
        last: Box<FetchError>,
    },
    Dataset(DatasetError),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Http(err)
    }
}

impl From<DatasetError> for FetchError {
    fn from(err: DatasetError) -> Self {
        FetchError::Dataset(err)
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Http(e) => write!(f, "HTTP error: {}", e),
            FetchError::Status(code) => write!(f, "RTMS API returned HTTP {}", code),
            FetchError::Xml(msg) => write!(f, "Malformed RTMS payload: {}", msg),
            FetchError::Api { code, message } => {
                write!(f, "RTMS API error {}: {}", code, message)
            }
            FetchError::RetriesExhausted {
                deal_ym,
                page_no,
                last,
            } => write!(
                f,
                "Giving up on {} page {} after retries: {}",
                deal_ym, page_no, last
            ),
            FetchError::Dataset(e) => write!(f, "Dataset error: {}", e),
        }
    }
}

impl std::error::Error for FetchError {}

/// One page of one month of trades
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, deal_ym: &str, page_no: u32) -> Result<TradePage, FetchError>;

    fn rows_per_page(&self) -> u32;
}

/// `YYYYMM` keys for every month of the inclusive year range
pub fn month_keys(start_year: i32, end_year: i32) -> Vec<String> {
    (start_year..=end_year)
        .flat_map(|year| (1..=12).map(move |month| format!("{}{:02}", year, month)))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchSummary {
    pub months: usize,
    pub pages: usize,
    /// Rows returned by the API for the whole 시군구
    pub fetched: usize,
    /// Rows kept after the dong filter
    pub kept: usize,
}

pub struct MonthlyFetcher<S: PageSource> {
    source: S,
    dong: String,
    max_retries: u32,
    initial_delay: Duration,
    max_delay: Duration,
}

impl<S: PageSource> MonthlyFetcher<S> {
    pub fn new(source: S, dong: impl Into<String>, max_retries: u32) -> Self {
        Self {
            source,
            dong: dong.into(),
            max_retries,
            initial_delay: backoff::DEFAULT_INITIAL_DELAY,
            max_delay: backoff::DEFAULT_MAX_DELAY,
        }
    }

    pub fn with_delays(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_delay = initial;
        self.max_delay = max;
        self
    }

    async fn fetch_page_with_retry(&self, deal_ym: &str, page_no: u32) -> Result<TradePage, FetchError> {
        let mut backoff = ExponentialBackoff::new(self.initial_delay, self.max_delay, self.max_retries);

        loop {
            match self.source.fetch_page(deal_ym, page_no).await {
                Ok(page) => return Ok(page),
                Err(e) => {
                    log::warn!("⚠️  {} page {} failed: {}", deal_ym, page_no, e);
                    if backoff.sleep().await.is_err() {
                        return Err(FetchError::RetriesExhausted {
                            deal_ym: deal_ym.to_string(),
                            page_no,
                            last: Box::new(e),
                        });
                    }
                }
            }
        }
    }

    /// Every row of one month, all pages, before the dong filter
    pub async fn fetch_month(&self, deal_ym: &str) -> Result<(Vec<Transaction>, usize), FetchError> {
        let mut rows = Vec::new();
        let mut pages = 0;
        let mut page_no = 1;

        loop {
            let page = self.fetch_page_with_retry(deal_ym, page_no).await?;
            pages += 1;
            let received = page.items.len();
            rows.extend(page.items);

            // A short page is the last one even if totalCount disagrees
            let short_page = received < self.source.rows_per_page() as usize;
            if received == 0 || short_page || rows.len() >= page.total_count {
                break;
            }
            page_no += 1;
        }

        Ok((rows, pages))
    }

    /// Keep only the configured 법정동
    pub fn filter_dong(&self, rows: Vec<Transaction>) -> Vec<Transaction> {
        rows.into_iter()
            .filter(|tx| tx.dong_name.as_deref() == Some(self.dong.as_str()))
            .collect()
    }

    pub async fn fetch_range(
        &self,
        months: &[String],
        writer: &mut dyn DealWriterBackend,
    ) -> Result<FetchSummary, FetchError> {
        let mut summary = FetchSummary::default();

        for deal_ym in months {
            let (rows, pages) = self.fetch_month(deal_ym).await?;
            let fetched = rows.len();
            let kept = self.filter_dong(rows);

            log::info!(
                "📥 {}: {} rows in {} page(s), {} in {}",
                deal_ym,
                fetched,
                pages,
                kept.len(),
                self.dong
            );

            writer.write_deals(&kept).await?;
            summary.months += 1;
            summary.pages += pages;
            summary.fetched += fetched;
            summary.kept += kept.len();
        }

        writer.flush().await?;
        Ok(summary)
    }
}

impl MonthlyFetcher<RtmsClient> {
    pub fn from_config(config: &FetchConfig) -> Result<Self, FetchError> {
        Ok(Self::new(RtmsClient::new(config)?, config.dong.clone(), config.max_retries))
    }
}
