//! HTTP client for the RTMS apartment-trade endpoint

use super::xml::{parse_page, TradePage};
use super::{FetchError, PageSource};
use crate::config::FetchConfig;
use async_trait::async_trait;
use std::time::Duration;

/// Used only when `Content-Type` declares no charset; a declared one wins
const FALLBACK_CHARSET: &str = "euc-kr";

pub struct RtmsClient {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
    lawd_cd: String,
    rows_per_page: u32,
}

impl RtmsClient {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            service_key: config.service_key.clone(),
            lawd_cd: config.lawd_cd.clone(),
            rows_per_page: config.rows_per_page,
        })
    }
}

#[async_trait]
impl PageSource for RtmsClient {
    async fn fetch_page(&self, deal_ym: &str, page_no: u32) -> Result<TradePage, FetchError> {
        let page_no = page_no.to_string();
        let rows = self.rows_per_page.to_string();

        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("LAWD_CD", self.lawd_cd.as_str()),
                ("DEAL_YMD", deal_ym),
                ("serviceKey", self.service_key.as_str()),
                ("pageNo", page_no.as_str()),
                ("numOfRows", rows.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body = response.text_with_charset(FALLBACK_CHARSET).await?;
        parse_page(&body)
    }

    fn rows_per_page(&self) -> u32 {
        self.rows_per_page
    }
}
