// In crates/api-client/src/okx.rs

use std::time::Duration;

use app_config::OkxSettings;
use async_trait::async_trait;
use core_types::Bar;
use reqwest::Client;

use crate::types::{BarRequest, OkxResponse, normalize, parse_candle};
use crate::{Error, MarketDataProvider, Result};

/// OKX caps `history-candles` pages at 100 rows.
const PAGE_LIMIT: usize = 100;

/// Hard stop for a runaway pagination loop.
const MAX_PAGES: usize = 500;

/// Historical candle client for the OKX public REST API. No authentication.
#[derive(Debug, Clone)]
pub struct OkxClient {
    http_client: Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl OkxClient {
    /// Constructs a new OkxClient from OkxSettings.
    pub fn new(settings: &OkxSettings) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;
        Ok(Self {
            http_client,
            base_url: settings.rest_base_url.trim_end_matches('/').to_string(),
            max_retries: settings.max_retries,
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
        })
    }

    /// Fetches every confirmed candle in the request range, oldest first.
    ///
    /// OKX returns candles newest first; `after` pages backwards from the end
    /// of the range until the start is reached or the history runs out.
    pub async fn get_history_candles(&self, request: &BarRequest) -> Result<Vec<Bar>> {
        let start_ms = request.start.timestamp_millis();
        // `after` is exclusive.
        let mut after = request.end.timestamp_millis() + 1;
        let mut bars = Vec::new();

        for page in 0..MAX_PAGES {
            let rows = self.fetch_page_with_retry(request, after).await?;
            let Some(oldest) = rows.iter().filter_map(|r| r.first()?.parse::<i64>().ok()).min() else {
                break;
            };

            for row in &rows {
                if let Some(bar) = parse_candle(row)? {
                    bars.push(bar);
                }
            }
            tracing::debug!(page, rows = rows.len(), oldest, "Fetched OKX candle page.");

            if oldest <= start_ms || oldest >= after || rows.len() < PAGE_LIMIT {
                break;
            }
            after = oldest;
        }

        let bars = normalize(bars, request);
        tracing::info!(pair = %request.pair, timeframe = %request.timeframe, bars = bars.len(), "Fetched OKX history.");
        Ok(bars)
    }

    async fn fetch_page_with_retry(&self, request: &BarRequest, after: i64) -> Result<Vec<Vec<String>>> {
        let mut attempt = 0;
        loop {
            match self.fetch_page(request, after).await {
                Ok(rows) => return Ok(rows),
                Err(e) if attempt < self.max_retries && is_transient(&e) => {
                    attempt += 1;
                    tracing::warn!(error = %e, attempt, "OKX request failed, retrying.");
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// `GET /api/v5/market/history-candles`
    async fn fetch_page(&self, request: &BarRequest, after: i64) -> Result<Vec<Vec<String>>> {
        let url = format!("{}/api/v5/market/history-candles", self.base_url);
        let response_body = self
            .http_client
            .get(&url)
            .query(&[
                ("instId", request.pair.as_str().to_string()),
                ("bar", request.timeframe.okx_bar().to_string()),
                ("after", after.to_string()),
                ("limit", PAGE_LIMIT.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_response(&response_body)
    }
}

/// Unwraps the OKX envelope, turning a non-zero `code` into `ApiError`.
pub fn parse_response(body: &str) -> Result<Vec<Vec<String>>> {
    let response: OkxResponse = serde_json::from_str(body)?;
    if response.code != "0" {
        return Err(Error::ApiError {
            code: response.code.parse().unwrap_or(-1),
            msg: response.msg,
        });
    }
    Ok(response.data)
}

// Rate limits (50011) and network hiccups are worth another try; bad input is not.
fn is_transient(err: &Error) -> bool {
    match err {
        Error::RequestFailed(e) => e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error() || s.as_u16() == 429),
        Error::ApiError { code, .. } => *code == 50011,
        _ => false,
    }
}

#[async_trait]
impl MarketDataProvider for OkxClient {
    fn name(&self) -> &'static str {
        "okx"
    }

    async fn fetch_bars(&self, request: &BarRequest) -> core_types::Result<Vec<Bar>> {
        Ok(self.get_history_candles(request).await?)
    }
}
