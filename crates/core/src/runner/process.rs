//! Tokio based process runner.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::traits::CommandRunner;
use super::types::{CommandOutput, CommandSpec};

/// How long to wait for the output pipes to close after the process is gone.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Runs commands as child processes of this one.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: CommandSpec) -> CommandOutput {
        let start = Instant::now();

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref cwd) = spec.cwd {
            command.current_dir(cwd);
        }
        for (key, value) in &spec.env {
            command.env(key, value);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(program = %spec.program, "binary not found");
                return CommandOutput::not_found(&spec.program);
            }
            Err(e) => {
                warn!(program = %spec.program, error = %e, "failed to spawn process");
                return CommandOutput::spawn_failed(&spec.program, e.to_string());
            }
        };

        let stdout_task = child.stdout.take().map(|s| tokio::spawn(read_stream(s)));
        let stderr_task = child.stderr.take().map(|s| tokio::spawn(read_stream(s)));

        let exit_code = match timeout(spec.timeout, child.wait()).await {
            Ok(Ok(status)) => Some(status.code().unwrap_or(-1)),
            Ok(Err(e)) => {
                warn!(program = %spec.program, error = %e, "failed to wait for process");
                Some(-1)
            }
            Err(_) => {
                warn!(
                    program = %spec.program,
                    timeout_secs = spec.timeout.as_secs(),
                    "process timed out, killing"
                );
                let _ = child.kill().await;
                None
            }
        };

        let stdout = drain(stdout_task).await;
        let stderr = drain(stderr_task).await;

        let output = match exit_code {
            Some(code) => CommandOutput {
                stdout,
                ..CommandOutput::failure(spec.program, code, stderr)
            },
            None => CommandOutput::timed_out(spec.program, stdout, stderr),
        };

        debug!(
            program = %output.program,
            exit_code = output.exit_code,
            duration_ms = start.elapsed().as_millis() as u64,
            "process finished"
        );

        output
    }
}

async fn read_stream<R: AsyncRead + Unpin>(mut reader: R) -> String {
    let mut buf = Vec::new();
    let _ = reader.read_to_end(&mut buf).await;
    String::from_utf8_lossy(&buf).into_owned()
}

async fn drain(task: Option<JoinHandle<String>>) -> String {
    let Some(mut handle) = task else {
        return String::new();
    };
    match timeout(DRAIN_GRACE, &mut handle).await {
        Ok(Ok(text)) => text,
        Ok(Err(_)) => String::new(),
        Err(_) => {
            // A grandchild still holds the pipe open.
            handle.abort();
            String::new()
        }
    }
}
