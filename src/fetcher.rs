use crate::types::{FetchConfig, FetchErrorReason, IngestError, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

/// Seam between the pipeline and the network, so tests can serve canned
/// payloads instead of hitting source sites.
#[async_trait]
pub trait FetchContent: Send + Sync {
    async fn fetch_feed(&self, feed_url: &str) -> Result<String>;
    async fn fetch_page(&self, page_url: &str) -> Result<String>;
}

/// HTTP retrieval of raw feed and page payloads. One client, identifying
/// user-agent, bounded timeout. No retries and no state between calls;
/// the pipeline decides what a failure means.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .map_err(|e| IngestError::Configuration(format!("http client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn user_agent(&self) -> &str {
        &self.config.user_agent
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Fetch {
                url: url.to_string(),
                reason: FetchErrorReason::HttpStatus(status.as_u16()),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(url, e))?;

        info!("Fetched {} ({} bytes)", url, body.len());
        Ok(body)
    }
}

#[async_trait]
impl FetchContent for Fetcher {
    async fn fetch_feed(&self, feed_url: &str) -> Result<String> {
        self.fetch(feed_url).await
    }

    async fn fetch_page(&self, page_url: &str) -> Result<String> {
        self.fetch(page_url).await
    }
}

fn classify_transport_error(url: &str, error: reqwest::Error) -> IngestError {
    let reason = if error.is_timeout() {
        FetchErrorReason::Timeout
    } else {
        FetchErrorReason::Network
    };
    IngestError::Fetch {
        url: url.to_string(),
        reason,
    }
}
