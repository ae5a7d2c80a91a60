//! Types for the acquisition pipeline.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// One tier of the extraction chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    GalleryDl,
    GalleryDlModule,
    YtDlp,
    YtDlpModule,
    PageScrape,
}

impl Tool {
    /// Name reported to the user when this tier produced the final result.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GalleryDl => "gallery-dl",
            Self::GalleryDlModule => "gallery-dl(py)",
            Self::YtDlp => "yt-dlp",
            Self::YtDlpModule => "yt-dlp(py)",
            Self::PageScrape => "page-scrape",
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Classified result of one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Exit 0.
    Success,
    /// Timed out after writing sendable files; promoted to success.
    Partial,
    /// The binary is missing.
    ToolNotFound,
    /// Timed out with nothing usable on disk.
    TimedOut,
    /// The diagnostic names the URL as unsupported.
    Unsupported,
    /// Any other failure, with its exit code.
    Failed(i32),
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::Partial)
    }

    /// Label used in metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Partial => "partial",
            Self::ToolNotFound => "not_found",
            Self::TimedOut => "timeout",
            Self::Unsupported => "unsupported",
            Self::Failed(_) => "failed",
        }
    }
}

/// Record of a tier that ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub tool: Tool,
    pub outcome: AttemptOutcome,
    /// Stderr (or stdout when stderr was empty) of the attempt.
    pub diagnostic: String,
}

/// What a successful acquisition produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquired {
    /// Sendable files under the target directory, in walk order.
    Files(Vec<PathBuf>),
    /// Direct media links found by the page-scrape tier.
    Links(Vec<String>),
}

/// Result of [`AcquisitionPipeline::acquire`](super::AcquisitionPipeline::acquire).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquireResult {
    pub success: bool,
    pub acquired: Acquired,
    /// Tier that produced the result, or the last tier that ran on failure.
    pub tool: Option<Tool>,
    /// Tail of the last tool's diagnostic when every tier failed.
    pub error: Option<String>,
    /// Every tier that ran, in order.
    pub attempts: Vec<Attempt>,
}

impl AcquireResult {
    /// Local files, empty for link results.
    pub fn files(&self) -> &[PathBuf] {
        match &self.acquired {
            Acquired::Files(files) => files,
            Acquired::Links(_) => &[],
        }
    }

    /// Scraped links, empty for file results.
    pub fn links(&self) -> &[String] {
        match &self.acquired {
            Acquired::Links(links) => links,
            Acquired::Files(_) => &[],
        }
    }

    pub fn was_partial(&self) -> bool {
        self.attempts
            .last()
            .is_some_and(|a| a.outcome == AttemptOutcome::Partial)
    }

    pub fn tool_name(&self) -> &'static str {
        self.tool.map(|t| t.name()).unwrap_or("unknown")
    }
}

/// Errors from page fetches and direct downloads.
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
