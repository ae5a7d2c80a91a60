//! Trait definitions for the command runner.

use async_trait::async_trait;

use super::types::{CommandOutput, CommandSpec};

/// Executes external processes.
///
/// Implementations always resolve: spawn failures, missing binaries and
/// timeouts are folded into [`CommandOutput::exit_code`] rather than returned
/// as errors.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs the command to completion or until its timeout fires.
    async fn run(&self, spec: CommandSpec) -> CommandOutput;
}
