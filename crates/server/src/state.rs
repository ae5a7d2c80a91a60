use std::sync::Arc;
use mediafetch_core::{Config, JobStore, SanitizedConfig, TokenStore};

/// Shared state of the health/metrics surface
pub struct AppState {
    config: Config,
    jobs: Arc<JobStore>,
    tokens: Arc<TokenStore>,
}

impl AppState {
    pub fn new(config: Config, jobs: Arc<JobStore>, tokens: Arc<TokenStore>) -> Self {
        Self {
            config,
            jobs,
            tokens,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn jobs(&self) -> &JobStore {
        &self.jobs
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }
}
