//! Configuration for the job and token stores.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ephemeral::EvictionPolicy;

/// Limits applied to the in-memory stores.
///
/// Every limit is off by default, so entries live until the process exits.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Most jobs kept at once; the oldest is evicted on overflow.
    #[serde(default)]
    pub max_jobs: Option<usize>,
    /// Most item tokens kept at once.
    #[serde(default)]
    pub max_tokens: Option<usize>,
    #[serde(default)]
    pub job_ttl_secs: Option<u64>,
    #[serde(default)]
    pub token_ttl_secs: Option<u64>,
    /// Remove an item token the first time it is used.
    #[serde(default)]
    pub single_use_tokens: bool,
    /// How often the background sweeper runs.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_jobs: None,
            max_tokens: None,
            job_ttl_secs: None,
            token_ttl_secs: None,
            single_use_tokens: false,
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl StoreConfig {
    pub fn job_policy(&self) -> EvictionPolicy {
        EvictionPolicy {
            capacity: self.max_jobs,
            ttl: self.job_ttl_secs.map(Duration::from_secs),
        }
    }

    pub fn token_policy(&self) -> EvictionPolicy {
        EvictionPolicy {
            capacity: self.max_tokens,
            ttl: self.token_ttl_secs.map(Duration::from_secs),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_keep_everything() {
        let config = StoreConfig::default();
        assert_eq!(config.job_policy(), EvictionPolicy::unbounded());
        assert_eq!(config.token_policy(), EvictionPolicy::unbounded());
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_policies_from_toml() {
        let config: StoreConfig = toml::from_str(
            r#"
max_jobs = 100
job_ttl_secs = 3600
token_ttl_secs = 600
single_use_tokens = true
sweep_interval_secs = 0
"#,
        )
        .unwrap();

        assert_eq!(config.job_policy().capacity, Some(100));
        assert_eq!(config.job_policy().ttl, Some(Duration::from_secs(3600)));
        assert_eq!(config.token_policy().capacity, None);
        assert!(config.single_use_tokens);
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
    }
}
