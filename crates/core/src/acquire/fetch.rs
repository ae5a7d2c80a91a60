//! HTTP access for page scraping and direct media re-downloads.

use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::config::AcquireConfig;
use super::types::AcquireError;

/// Fetches pages and files over HTTP.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Body of `url` as text.
    async fn fetch_text(&self, url: &str) -> Result<String, AcquireError>;

    /// Streams `url` into `dest`, returning the number of bytes written.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, AcquireError>;
}

/// [`HttpFetcher`] backed by reqwest.
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(config: &AcquireConfig) -> Result<Self, AcquireError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(config.user_agent.clone())
            .cookie_store(true)
            .build()?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, AcquireError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AcquireError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, AcquireError> {
        let text = self.get(url).await?.text().await?;
        debug!(url, bytes = text.len(), "fetched page");
        Ok(text)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, AcquireError> {
        let mut response = self.get(url).await?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(url, dest = %dest.display(), bytes = written, "downloaded file");
        Ok(written)
    }
}
