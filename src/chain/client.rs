use std::time::Duration;

use crate::chain::record::{BlocksPage, Record};
use crate::error::FetchError;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use tracing::trace;

/// Where block records come from.
///
/// Both calls are single attempts: retrying is the caller's business.
pub trait BlockSource {
    /// All blocks mined near the given millisecond timestamp.
    fn blocks_for_period(&self, timestamp_ms: u64) -> Result<Vec<Record>, FetchError>;

    /// All blocks at the given height, including alternate-chain ones.
    fn blocks_at_height(&self, height: u64) -> Result<Vec<Record>, FetchError>;
}

/// Blocking HTTP client for the public block explorer API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    /// Builds a client for `base_url` (no trailing slash needed).
    ///
    /// # Parameters
    /// - `base_url`: Scheme and host of the API, e.g. `https://blockchain.info`.
    /// - `timeout`: Per-request timeout covering connect and body read.
    ///
    /// # Returns
    /// The client, or the `reqwest` error if the TLS backend cannot be initialised.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http: Client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        return Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        });
    }

    fn get_page(&self, path: &str) -> Result<Vec<Record>, FetchError> {
        let url: String = format!("{}{}", self.base_url, path);
        trace!(%url, "GET");

        let response: Response = self.http.get(&url).query(&[("format", "json")]).send()?;
        let status: StatusCode = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body: String = response.text()?;
        let page: BlocksPage = serde_json::from_str(&body)?;
        return Ok(page.blocks);
    }
}

impl BlockSource for ApiClient {
    fn blocks_for_period(&self, timestamp_ms: u64) -> Result<Vec<Record>, FetchError> {
        return self.get_page(&format!("/blocks/{}", timestamp_ms));
    }

    fn blocks_at_height(&self, height: u64) -> Result<Vec<Record>, FetchError> {
        return self.get_page(&format!("/block-height/{}", height));
    }
}
