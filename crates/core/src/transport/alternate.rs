//! Secondary delivery through an external user-account client.
//!
//! The script receives `chat_id file caption [duration] [thumb]` and reads
//! the credential triple from its environment. Exit 0 means delivered.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::traits::TransportError;
use crate::config::CredentialsConfig;
use crate::runner::{CommandRunner, CommandSpec, ExitOutcome};

/// Configuration for the alternate transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternateConfig {
    /// Whether the fallback may be used at all. Credentials are still required.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Interpreter or binary to run.
    #[serde(default = "default_program")]
    pub program: String,

    /// Script passed as the first argument, if any.
    #[serde(default = "default_script")]
    pub script: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_program() -> String {
    "python3".to_string()
}

fn default_script() -> Option<String> {
    Some("telethon_send.py".to_string())
}

fn default_timeout() -> u64 {
    900
}

impl Default for AlternateConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            program: default_program(),
            script: default_script(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Sends large files through the alternate client.
pub struct AlternateSender {
    config: AlternateConfig,
    credentials: CredentialsConfig,
    runner: Arc<dyn CommandRunner>,
}

impl AlternateSender {
    /// Returns `None` when the feature is disabled or the credential triple
    /// is incomplete.
    pub fn from_config(
        config: &AlternateConfig,
        credentials: &CredentialsConfig,
        runner: Arc<dyn CommandRunner>,
    ) -> Option<Self> {
        if !config.enabled || !credentials.is_complete() {
            return None;
        }
        Some(Self {
            config: config.clone(),
            credentials: credentials.clone(),
            runner,
        })
    }

    fn build_spec(
        &self,
        chat_id: i64,
        file: &Path,
        caption: &str,
        duration_secs: Option<u32>,
        thumbnail: Option<&Path>,
    ) -> CommandSpec {
        let mut spec = CommandSpec::new(
            self.config.program.clone(),
            Duration::from_secs(self.config.timeout_secs),
        );
        if let Some(ref script) = self.config.script {
            spec = spec.arg(script.clone());
        }
        spec = spec
            .arg(chat_id.to_string())
            .arg(file.to_string_lossy())
            .arg(caption);

        // The thumbnail is positional, so a duration placeholder precedes it.
        match (duration_secs, thumbnail) {
            (Some(d), Some(t)) => spec = spec.arg(d.to_string()).arg(t.to_string_lossy()),
            (Some(d), None) => spec = spec.arg(d.to_string()),
            (None, Some(t)) => spec = spec.arg("0").arg(t.to_string_lossy()),
            (None, None) => {}
        }

        for (key, value) in self.credentials.env_pairs() {
            spec = spec.with_env(key, value);
        }
        spec
    }

    pub async fn send(
        &self,
        chat_id: i64,
        file: &Path,
        caption: &str,
        duration_secs: Option<u32>,
        thumbnail: Option<&Path>,
    ) -> Result<(), TransportError> {
        let spec = self.build_spec(chat_id, file, caption, duration_secs, thumbnail);
        info!(chat_id, file = %file.display(), "sending through alternate transport");

        let output = self.runner.run(spec).await;
        match output.outcome() {
            ExitOutcome::Success => Ok(()),
            outcome => {
                warn!(
                    chat_id,
                    exit_code = output.exit_code,
                    "alternate transport failed"
                );
                let reason = output.diagnostic().trim().to_string();
                Err(match outcome {
                    ExitOutcome::TimedOut => TransportError::Network(format!(
                        "alternate transport timed out after {}s",
                        self.config.timeout_secs
                    )),
                    _ => TransportError::Rejected(format!(
                        "alternate transport exited with {}: {}",
                        output.exit_code, reason
                    )),
                })
            }
        }
    }
}
