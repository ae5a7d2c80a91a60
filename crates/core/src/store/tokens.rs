//! Registry of per-item action tokens.

use chrono::Utc;
use tracing::debug;

use super::ephemeral::{EphemeralStore, EvictionPolicy};
use super::types::{ItemToken, SourceRef};
use crate::metrics;

/// Tokens bound to single deliverables.
///
/// Tokens are reusable unless the store was built single-use, in which case
/// the first [`TokenStore::resolve`] consumes them.
#[derive(Debug)]
pub struct TokenStore {
    tokens: EphemeralStore<ItemToken>,
    single_use: bool,
}

impl TokenStore {
    pub fn new(policy: EvictionPolicy, single_use: bool) -> Self {
        Self {
            tokens: EphemeralStore::new(policy),
            single_use,
        }
    }

    /// Creates a token for `source` and returns its key.
    pub async fn issue(&self, source: SourceRef, chat_id: i64, caption: Option<String>) -> String {
        let (token, evicted) = self
            .tokens
            .insert_with(|_| ItemToken {
                source,
                chat_id,
                caption,
                created_at: Utc::now(),
            })
            .await;
        for e in &evicted {
            metrics::STORE_EVICTIONS
                .with_label_values(&["tokens", e.reason.as_str()])
                .inc();
        }
        debug!(token = %token, evicted = evicted.len(), "item token issued");
        token
    }

    /// Looks a token up, consuming it when tokens are single-use.
    pub async fn resolve(&self, token: &str) -> Option<ItemToken> {
        if self.single_use {
            let item = self.tokens.get(token).await?;
            self.tokens.remove(token).await;
            Some(item)
        } else {
            self.tokens.get(token).await
        }
    }

    pub async fn sweep(&self) -> usize {
        let evicted = self.tokens.sweep().await;
        for e in &evicted {
            metrics::STORE_EVICTIONS
                .with_label_values(&["tokens", e.reason.as_str()])
                .inc();
        }
        evicted.len()
    }

    pub async fn len(&self) -> usize {
        self.tokens.len().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn direct() -> SourceRef {
        SourceRef::Direct("https://cdn/x.mp4".to_string())
    }

    #[tokio::test]
    async fn test_reusable_by_default() {
        let store = TokenStore::new(EvictionPolicy::unbounded(), false);
        let token = store.issue(direct(), 3, Some("cap".into())).await;

        let first = store.resolve(&token).await.unwrap();
        assert_eq!(first.source, direct());
        assert_eq!(first.chat_id, 3);
        assert!(store.resolve(&token).await.is_some());
        assert!(store.resolve("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_single_use() {
        let store = TokenStore::new(EvictionPolicy::unbounded(), true);
        let token = store.issue(direct(), 3, None).await;
        assert!(store.resolve(&token).await.is_some());
        assert!(store.resolve(&token).await.is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_policy_applies() {
        let store = TokenStore::new(EvictionPolicy::unbounded().with_capacity(1), false);
        let first = store.issue(direct(), 1, None).await;
        let second = store.issue(direct(), 1, None).await;
        assert!(store.resolve(&first).await.is_none());
        assert!(store.resolve(&second).await.is_some());

        let expiring = TokenStore::new(EvictionPolicy::unbounded().with_ttl(Duration::ZERO), false);
        let token = expiring.issue(direct(), 1, None).await;
        assert!(expiring.resolve(&token).await.is_none());
        assert_eq!(expiring.sweep().await, 1);
    }
}
