//! Registry of jobs keyed by opaque id.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::ephemeral::{EphemeralStore, Evicted, EvictionPolicy};
use super::types::{Job, JobState};
use crate::acquire::files::remove_dir_quietly;
use crate::metrics;

/// Jobs in flight.
///
/// Evicted jobs are marked [`JobState::Expired`] and their directories
/// removed.
#[derive(Debug)]
pub struct JobStore {
    download_root: PathBuf,
    jobs: EphemeralStore<Job>,
}

impl JobStore {
    pub fn new(download_root: impl Into<PathBuf>, policy: EvictionPolicy) -> Self {
        Self {
            download_root: download_root.into(),
            jobs: EphemeralStore::new(policy),
        }
    }

    pub fn download_root(&self) -> &Path {
        &self.download_root
    }

    /// Registers a pending job for `url`.
    pub async fn create(&self, chat_id: i64, url: &str) -> Job {
        let root = self.download_root.clone();
        let (id, evicted) = self
            .jobs
            .insert_with(|id| Job::new(id, chat_id, url, &root))
            .await;
        self.retire(evicted).await;

        metrics::JOBS_CREATED.inc();
        debug!(job_id = %id, chat_id, url, "job created");
        match self.jobs.get(&id).await {
            Some(job) => job,
            None => Job::new(&id, chat_id, url, &root),
        }
    }

    pub async fn get(&self, id: &str) -> Option<Job> {
        self.jobs.get(id).await
    }

    /// Mutates a live job; `None` when it is gone.
    pub async fn update<R, F>(&self, id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut Job) -> R,
    {
        self.jobs.update(id, f).await
    }

    pub async fn set_state(&self, id: &str, state: JobState) -> bool {
        self.update(id, |job| job.state = state).await.is_some()
    }

    pub async fn remove(&self, id: &str) -> Option<Job> {
        self.jobs.remove(id).await
    }

    /// Evicts expired jobs, returning them marked [`JobState::Expired`].
    pub async fn sweep(&self) -> Vec<Job> {
        let evicted = self.jobs.sweep().await;
        self.retire(evicted).await
    }

    pub async fn len(&self) -> usize {
        self.jobs.len().await
    }

    async fn retire(&self, evicted: Vec<Evicted<Job>>) -> Vec<Job> {
        let mut retired = Vec::with_capacity(evicted.len());
        for Evicted {
            key,
            mut value,
            reason,
        } in evicted
        {
            metrics::STORE_EVICTIONS
                .with_label_values(&["jobs", reason.as_str()])
                .inc();
            info!(job_id = %key, reason = reason.as_str(), state = value.state.as_str(), "job evicted");
            remove_dir_quietly(&value.dir).await;
            value.state = JobState::Expired;
            retired.push(value);
        }
        retired
    }
}
