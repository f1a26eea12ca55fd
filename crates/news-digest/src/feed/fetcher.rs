//! Feed fetcher.
//!
//! One GET per run, no retries. A non-2xx answer is an error just like a
//! network failure so that a run never continues with an error page.

use bytes::Bytes;
use reqwest::Client;

use crate::config::FeedConfig;
use crate::error::FetchError;

/// Downloads the configured feed.
pub struct FeedFetcher {
    client: Client,
    url: String,
}

impl FeedFetcher {
    /// Build a fetcher with the configured User-Agent and timeout.
    pub fn new(config: &FeedConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    /// Fetch the raw feed bytes.
    pub async fn fetch(&self) -> Result<Bytes, FetchError> {
        tracing::debug!(url = %self.url, "Fetching feed");

        let request_err = |source| FetchError::Request {
            url: self.url.clone(),
            source,
        };

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(request_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status,
            });
        }

        let bytes = response.bytes().await.map_err(request_err)?;
        tracing::debug!(bytes = bytes.len(), "Fetched feed");
        Ok(bytes)
    }
}
