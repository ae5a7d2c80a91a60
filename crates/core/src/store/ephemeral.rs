//! Generic in-memory registry with random keys and pluggable eviction.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// When entries leave a store without being removed explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Most entries kept; inserting past it evicts the oldest.
    pub capacity: Option<usize>,
    /// Age after which an entry is treated as gone.
    pub ttl: Option<Duration>,
}

impl EvictionPolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    fn is_expired(&self, inserted_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let Some(ttl) = self.ttl else {
            return false;
        };
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now.signed_duration_since(inserted_at) >= ttl,
            Err(_) => false,
        }
    }
}

/// Why an entry was evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    Capacity,
    Expired,
}

impl EvictionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Capacity => "capacity",
            Self::Expired => "ttl",
        }
    }
}

/// An entry that left the store through its policy.
#[derive(Debug, Clone)]
pub struct Evicted<V> {
    pub key: String,
    pub value: V,
    pub reason: EvictionReason,
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    inserted_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, Entry<V>>,
    /// Keys in insertion order, oldest first.
    order: VecDeque<String>,
}

impl<V> Inner<V> {
    fn take(&mut self, key: &str) -> Option<Entry<V>> {
        let entry = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        Some(entry)
    }
}

/// Random 32-hex-digit key.
pub fn generate_key() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Thread-safe key/value store whose keys are generated on insert.
///
/// Expired entries are invisible to readers even before a sweep removes
/// them.
#[derive(Debug)]
pub struct EphemeralStore<V> {
    policy: EvictionPolicy,
    inner: RwLock<Inner<V>>,
}

impl<V: Clone> EphemeralStore<V> {
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            policy,
            inner: RwLock::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Inserts a value built from its freshly generated key.
    ///
    /// Returns the key and whatever the capacity limit pushed out.
    pub async fn insert_with<F>(&self, build: F) -> (String, Vec<Evicted<V>>)
    where
        F: FnOnce(&str) -> V,
    {
        let mut inner = self.inner.write().await;

        let mut key = generate_key();
        while inner.entries.contains_key(&key) {
            key = generate_key();
        }

        let mut evicted = Vec::new();
        if let Some(capacity) = self.policy.capacity {
            while inner.entries.len() >= capacity.max(1) {
                let Some(oldest) = inner.order.pop_front() else {
                    break;
                };
                if let Some(entry) = inner.entries.remove(&oldest) {
                    evicted.push(Evicted {
                        key: oldest,
                        value: entry.value,
                        reason: EvictionReason::Capacity,
                    });
                }
            }
        }

        let value = build(&key);
        inner.entries.insert(
            key.clone(),
            Entry {
                value,
                inserted_at: Utc::now(),
            },
        );
        inner.order.push_back(key.clone());
        (key, evicted)
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let inner = self.inner.read().await;
        let entry = inner.entries.get(key)?;
        if self.policy.is_expired(entry.inserted_at, Utc::now()) {
            return None;
        }
        Some(entry.value.clone())
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    /// Applies `f` to a live entry, returning its result.
    pub async fn update<R, F>(&self, key: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut V) -> R,
    {
        let mut inner = self.inner.write().await;
        let entry = inner.entries.get_mut(key)?;
        if self.policy.is_expired(entry.inserted_at, Utc::now()) {
            return None;
        }
        Some(f(&mut entry.value))
    }

    pub async fn remove(&self, key: &str) -> Option<V> {
        self.inner.write().await.take(key).map(|e| e.value)
    }

    /// Removes every entry older than the TTL as of `now`.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Vec<Evicted<V>> {
        if self.policy.ttl.is_none() {
            return Vec::new();
        }
        let mut inner = self.inner.write().await;
        let expired: Vec<String> = inner
            .order
            .iter()
            .filter(|key| {
                inner
                    .entries
                    .get(*key)
                    .is_some_and(|e| self.policy.is_expired(e.inserted_at, now))
            })
            .cloned()
            .collect();

        expired
            .into_iter()
            .filter_map(|key| {
                inner.take(&key).map(|entry| Evicted {
                    key,
                    value: entry.value,
                    reason: EvictionReason::Expired,
                })
            })
            .collect()
    }

    pub async fn sweep(&self) -> Vec<Evicted<V>> {
        self.sweep_at(Utc::now()).await
    }

    /// Number of stored entries, expired ones included until swept.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
