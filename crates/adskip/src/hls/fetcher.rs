// Playlist Fetcher: retrieves raw playlist bodies over HTTP with a hard timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use tracing::{debug, trace};
use url::Url;

use crate::config::{AdSkipConfig, PLAYLIST_MIME_TYPE};
use crate::error::{AdSkipError, Result};

#[async_trait]
pub trait PlaylistFetcher: Send + Sync {
    /// Fetch the playlist body at `url`.
    ///
    /// Implementations must fail on non-success status codes.
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpPlaylistFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpPlaylistFetcher {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn from_config(config: &AdSkipConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.apple.mpegurl, application/x-mpegurl, */*"),
        );
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;
        Ok(Self::new(client, config.fetch_timeout()))
    }

    async fn fetch_inner(&self, url: Url) -> Result<String> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AdSkipError::http_status(status, url.as_str()));
        }
        if let Some(content_type) = response.headers().get(reqwest::header::CONTENT_TYPE) {
            trace!(
                url = %url,
                content_type = ?content_type,
                expected = PLAYLIST_MIME_TYPE,
                "Playlist response received"
            );
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl PlaylistFetcher for HttpPlaylistFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url)
            .map_err(|e| AdSkipError::invalid_playlist(url, format!("invalid URL: {e}")))?;

        // Dropping the request future on timeout aborts the transfer.
        match tokio::time::timeout(self.timeout, self.fetch_inner(parsed)).await {
            Ok(result) => result,
            Err(_) => {
                debug!(
                    url,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Playlist fetch timed out"
                );
                Err(AdSkipError::Timeout {
                    url: url.to_string(),
                    after: self.timeout,
                })
            }
        }
    }
}
