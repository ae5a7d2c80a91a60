//! Job and item-token records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use crate::acquire::files::SidecarMeta;
use crate::index::Index;

/// Lifecycle of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Waiting for the user to pick a mode.
    Pending,
    Acquiring,
    Acquired,
    /// Files indexed and browsable.
    Indexed,
    Completed,
    /// Evicted by the store policy.
    Expired,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Acquiring => "acquiring",
            Self::Acquired => "acquired",
            Self::Indexed => "indexed",
            Self::Completed => "completed",
            Self::Expired => "expired",
        }
    }
}

/// One user-submitted link and everything learned about it.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: String,
    pub chat_id: i64,
    pub url: String,
    pub state: JobState,
    /// Exclusive working directory of the job.
    pub dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<Index>,
    #[serde(skip)]
    pub meta: SidecarMeta,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(id: &str, chat_id: i64, url: impl Into<String>, download_root: &std::path::Path) -> Self {
        Self {
            id: id.to_string(),
            chat_id,
            url: url.into(),
            state: JobState::Pending,
            dir: download_root.join(id),
            index: None,
            meta: SidecarMeta::default(),
            created_at: Utc::now(),
        }
    }
}

/// Best-known origin of a single deliverable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "url", rename_all = "snake_case")]
pub enum SourceRef {
    /// Direct media URL recovered from a sidecar; downloaded as-is.
    Direct(String),
    /// Page URL; the acquisition chain runs against it again.
    Page(String),
}

impl SourceRef {
    pub fn url(&self) -> &str {
        match self {
            Self::Direct(url) | Self::Page(url) => url,
        }
    }
}

/// State behind a per-item action button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemToken {
    pub source: SourceRef,
    pub chat_id: i64,
    /// Caption of the original delivery, reused for re-sends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_new_job_is_pending_in_its_own_dir() {
        let job = Job::new("abc", 7, "https://x/p", Path::new("/dl"));
        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.dir, PathBuf::from("/dl/abc"));
        assert!(job.index.is_none());
        assert!(job.meta.is_empty());
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_value(SourceRef::Direct("https://x/a.mp4".into())).unwrap();
        assert_eq!(json["type"], "direct");
        assert_eq!(json["url"], "https://x/a.mp4");
        assert_eq!(
            serde_json::to_value(JobState::Indexed).unwrap(),
            serde_json::json!("indexed")
        );
        assert_eq!(SourceRef::Page("p".into()).url(), "p");
    }
}
