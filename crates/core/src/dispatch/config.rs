//! Configuration for the interactive dispatcher.

use serde::{Deserialize, Serialize};

/// Interactive menu settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Entries per page in group and post lists.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    8
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}
