//! Configuration for the acquisition pipeline.

use serde::{Deserialize, Serialize};

/// Extraction tools, timeouts and scrape limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquireConfig {
    /// Primary extraction tool binary.
    #[serde(default = "default_gallery_dl_bin")]
    pub gallery_dl_bin: String,

    /// Python module name of the primary tool.
    #[serde(default = "default_gallery_dl_module")]
    pub gallery_dl_module: String,

    /// Secondary extraction tool binary.
    #[serde(default = "default_ytdlp_bin")]
    pub ytdlp_bin: String,

    /// Python module name of the secondary tool.
    #[serde(default = "default_ytdlp_module")]
    pub ytdlp_module: String,

    /// Interpreter used for module invocations.
    #[serde(default = "default_python_bin")]
    pub python_bin: String,

    /// Timeout of the primary tool (and its module variant).
    #[serde(default = "default_tool_timeout")]
    pub primary_timeout_secs: u64,

    /// Timeout of the secondary tool (and its module variant).
    #[serde(default = "default_tool_timeout")]
    pub secondary_timeout_secs: u64,

    /// Maximum title length in the secondary tool's filename template.
    #[serde(default = "default_title_max_len")]
    pub title_max_len: usize,

    /// Characters of diagnostic text kept when every tier fails.
    #[serde(default = "default_error_tail_chars")]
    pub error_tail_chars: usize,

    /// Maximum number of scraped links delivered.
    #[serde(default = "default_scrape_link_cap")]
    pub scrape_link_cap: usize,

    /// Timeout for page fetches and direct downloads.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// User agent sent with page fetches.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_gallery_dl_bin() -> String {
    "gallery-dl".to_string()
}

fn default_gallery_dl_module() -> String {
    "gallery_dl".to_string()
}

fn default_ytdlp_bin() -> String {
    "yt-dlp".to_string()
}

fn default_ytdlp_module() -> String {
    "yt_dlp".to_string()
}

fn default_python_bin() -> String {
    "python3".to_string()
}

fn default_tool_timeout() -> u64 {
    600
}

fn default_title_max_len() -> usize {
    80
}

fn default_error_tail_chars() -> usize {
    1200
}

fn default_scrape_link_cap() -> usize {
    8
}

fn default_http_timeout() -> u64 {
    300
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            gallery_dl_bin: default_gallery_dl_bin(),
            gallery_dl_module: default_gallery_dl_module(),
            ytdlp_bin: default_ytdlp_bin(),
            ytdlp_module: default_ytdlp_module(),
            python_bin: default_python_bin(),
            primary_timeout_secs: default_tool_timeout(),
            secondary_timeout_secs: default_tool_timeout(),
            title_max_len: default_title_max_len(),
            error_tail_chars: default_error_tail_chars(),
            scrape_link_cap: default_scrape_link_cap(),
            http_timeout_secs: default_http_timeout(),
            user_agent: default_user_agent(),
        }
    }
}
