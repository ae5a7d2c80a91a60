//! Configuration for media delivery.

use serde::{Deserialize, Serialize};

/// Size limits and caption rules for delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Output bound of compress mode and ceiling of escalated re-encodes.
    #[serde(default = "default_compress_target")]
    pub compress_target_bytes: u64,

    /// Fraction of the rejected file's size targeted when escalating.
    #[serde(default = "default_escalation_ratio")]
    pub escalation_ratio: f64,

    /// Most files delivered per job in direct mode.
    #[serde(default = "default_max_files_per_job")]
    pub max_files_per_job: usize,

    /// Captions longer than this many characters are cut.
    #[serde(default = "default_caption_limit")]
    pub caption_limit: usize,

    /// Characters kept when a caption is cut, before the ellipsis.
    #[serde(default = "default_caption_cut")]
    pub caption_cut: usize,
}

fn default_compress_target() -> u64 {
    48 * 1024 * 1024
}

fn default_escalation_ratio() -> f64 {
    0.8
}

fn default_max_files_per_job() -> usize {
    10
}

fn default_caption_limit() -> usize {
    1000
}

fn default_caption_cut() -> usize {
    980
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            compress_target_bytes: default_compress_target(),
            escalation_ratio: default_escalation_ratio(),
            max_files_per_job: default_max_files_per_job(),
            caption_limit: default_caption_limit(),
            caption_cut: default_caption_cut(),
        }
    }
}

impl DeliveryConfig {
    /// Size targeted when re-encoding a file of `size_bytes` that the
    /// transport rejected.
    pub fn escalation_target(&self, size_bytes: u64) -> u64 {
        let scaled = (size_bytes as f64 * self.escalation_ratio) as u64;
        scaled.min(self.compress_target_bytes).max(1)
    }
}
