//! HTTP client for CometBFT RPC and the Cosmos LCD, backed by `reqwest`.
//!
//! Transient failures (connect errors, timeouts, HTTP 5xx/429) are retried
//! with exponential backoff.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use tacindex_core::error::IndexerError;
use tacindex_core::types::{BlockSummary, RawTx};

use crate::fetcher::{block_from_json, latest_height_from_json, txs_from_json, CosmosRpcClient};

/// Configuration for `HttpCosmosClient`.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub request_timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub initial_backoff: Duration,
    /// Upper bound for a single retry delay.
    pub max_backoff: Duration,
    /// Page size for LCD transaction searches.
    pub tx_page_limit: u32,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_retries: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            tx_page_limit: 100,
        }
    }
}

/// A failed request, tagged with whether retrying makes sense.
#[derive(Debug)]
struct RequestError {
    retryable: bool,
    message: String,
}

impl RequestError {
    fn transient(message: String) -> Self {
        Self { retryable: true, message }
    }

    fn fatal(message: String) -> Self {
        Self { retryable: false, message }
    }
}

/// Client for a TAC node: CometBFT RPC (`rpc_url`, port 26657) for headers
/// and the LCD REST API (`api_url`, port 1317) for transactions.
pub struct HttpCosmosClient {
    rpc_url: String,
    api_url: String,
    http: reqwest::Client,
    config: HttpClientConfig,
}

impl HttpCosmosClient {
    pub fn new(
        rpc_url: impl Into<String>,
        api_url: impl Into<String>,
        config: HttpClientConfig,
    ) -> Result<Self, IndexerError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| IndexerError::Rpc(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            rpc_url: rpc_url.into().trim_end_matches('/').to_string(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            http,
            config,
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn get_once(&self, url: &str, query: &[(&str, String)]) -> Result<Value, RequestError> {
        let resp = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() || e.is_request() {
                    RequestError::transient(e.to_string())
                } else {
                    RequestError::fatal(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = format!("HTTP {}: {body}", status.as_u16());
            // CometBFT answers JSON-RPC errors with 500 and a JSON body
            if let Ok(v) = serde_json::from_str::<Value>(&body) {
                if v.get("error").is_some() {
                    return Ok(v);
                }
            }
            return Err(if status.is_server_error() || status.as_u16() == 429 {
                RequestError::transient(message)
            } else {
                RequestError::fatal(message)
            });
        }

        resp.json::<Value>()
            .await
            .map_err(|e| RequestError::fatal(format!("invalid JSON body: {e}")))
    }

    /// GET `url` and parse the body as JSON, retrying transient failures.
    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, IndexerError> {
        let mut attempt = 0u32;
        loop {
            match self.get_once(url, query).await {
                Ok(v) => return Ok(v),
                Err(e) if e.retryable && attempt < self.config.max_retries => {
                    let delay = backoff_delay(&self.config, attempt);
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e.message,
                        url,
                        "retrying request"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if e.retryable {
                        tracing::error!(attempt, error = %e.message, url, "max retries exceeded");
                    }
                    return Err(IndexerError::Rpc(format!("{url}: {}", e.message)));
                }
            }
        }
    }
}

fn backoff_delay(config: &HttpClientConfig, attempt: u32) -> Duration {
    config
        .initial_backoff
        .saturating_mul(1 << attempt.min(10))
        .min(config.max_backoff)
}

/// Whether a tx search is complete after a page of `page_len` results.
///
/// With a reported `total` the search ends once `collected` reaches it;
/// without one, a short page is the last.
fn tx_pages_done(collected: usize, page_len: usize, total: Option<u64>, limit: u32) -> bool {
    if page_len == 0 {
        return true;
    }
    match total {
        Some(total) => collected as u64 >= total,
        None => page_len < limit as usize,
    }
}

/// Returns `true` for the CometBFT error raised when asking for a height
/// above the current tip.
fn is_future_height_error(err: &Value) -> bool {
    let data = err["data"].as_str().unwrap_or_default();
    data.contains("must be less than or equal to the current blockchain height")
}

#[async_trait]
impl CosmosRpcClient for HttpCosmosClient {
    async fn latest_height(&self) -> Result<u64, IndexerError> {
        let v = self.get_json(&format!("{}/status", self.rpc_url), &[]).await?;
        latest_height_from_json(&v)
            .ok_or_else(|| IndexerError::Rpc("status response without latest_block_height".into()))
    }

    async fn block(&self, height: u64) -> Result<Option<BlockSummary>, IndexerError> {
        let v = self
            .get_json(
                &format!("{}/block", self.rpc_url),
                &[("height", height.to_string())],
            )
            .await?;

        if let Some(err) = v.get("error") {
            if is_future_height_error(err) {
                return Ok(None);
            }
            return Err(IndexerError::Rpc(format!("block {height}: {err}")));
        }

        block_from_json(&v).map(Some).ok_or_else(|| IndexerError::Decode {
            height,
            reason: "malformed block response".into(),
        })
    }

    async fn block_txs(&self, height: u64) -> Result<Vec<RawTx>, IndexerError> {
        let url = format!("{}/cosmos/tx/v1beta1/txs", self.api_url);
        let limit = self.config.tx_page_limit.max(1);
        let mut all = Vec::new();
        let mut page = 1u64;

        loop {
            let v = self
                .get_json(
                    &url,
                    &[
                        ("query", format!("tx.height={height}")),
                        ("page", page.to_string()),
                        ("limit", limit.to_string()),
                    ],
                )
                .await?;

            let (txs, total) = txs_from_json(v).map_err(|e| match e {
                IndexerError::Decode { reason, .. } => IndexerError::Decode { height, reason },
                other => other,
            })?;
            let fetched = txs.len();
            all.extend(txs);

            if tx_pages_done(all.len(), fetched, total, limit) {
                break;
            }
            page += 1;
        }

        tracing::debug!(height, txs = all.len(), "fetched block transactions");
        Ok(all)
    }
}
