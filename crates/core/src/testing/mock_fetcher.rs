//! Mock HTTP fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::acquire::{AcquireError, HttpFetcher};

#[derive(Debug, Default)]
struct MockFetcherState {
    pages: HashMap<String, String>,
    downloads: HashMap<String, Vec<u8>>,
    requests: Vec<String>,
}

/// Mock implementation of the HttpFetcher trait.
///
/// Unknown URLs answer with a 404 status error.
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    state: Arc<RwLock<MockFetcherState>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Body returned by `fetch_text` for `url`.
    pub async fn set_page(&self, url: impl Into<String>, body: impl Into<String>) {
        self.state
            .write()
            .await
            .pages
            .insert(url.into(), body.into());
    }

    /// Bytes written by `download` for `url`.
    pub async fn set_download(&self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.state
            .write()
            .await
            .downloads
            .insert(url.into(), bytes.into());
    }

    /// Every URL requested so far, in order.
    pub async fn requests(&self) -> Vec<String> {
        self.state.read().await.requests.clone()
    }

    fn missing(url: &str) -> AcquireError {
        AcquireError::Status {
            status: 404,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl HttpFetcher for MockFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, AcquireError> {
        let mut state = self.state.write().await;
        state.requests.push(url.to_string());
        state
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| Self::missing(url))
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, AcquireError> {
        let bytes = {
            let mut state = self.state.write().await;
            state.requests.push(url.to_string());
            state.downloads.get(url).cloned()
        };
        let bytes = bytes.ok_or_else(|| Self::missing(url))?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;
        Ok(bytes.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_pages_downloads_and_misses() {
        let dir = TempDir::new().unwrap();
        let fetcher = MockFetcher::new();
        fetcher.set_page("https://x/p", "<html>").await;
        fetcher.set_download("https://x/a.mp4", b"video".to_vec()).await;

        assert_eq!(fetcher.fetch_text("https://x/p").await.unwrap(), "<html>");
        let dest = dir.path().join("sub/a.mp4");
        assert_eq!(fetcher.download("https://x/a.mp4", &dest).await.unwrap(), 5);
        assert_eq!(std::fs::read(&dest).unwrap(), b"video");

        let err = fetcher.fetch_text("https://x/none").await.unwrap_err();
        assert!(matches!(err, AcquireError::Status { status: 404, .. }));
        assert_eq!(
            fetcher.requests().await,
            vec!["https://x/p", "https://x/a.mp4", "https://x/none"]
        );
    }
}
