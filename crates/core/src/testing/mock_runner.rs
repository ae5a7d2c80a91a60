//! Mock command runner for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::runner::{
    CommandOutput, CommandRunner, CommandSpec, Termination, EXIT_NOT_FOUND, EXIT_TIMEOUT,
};

/// A scripted response for one invocation.
#[derive(Debug, Clone, Default)]
pub struct MockResponse {
    pub exit_code: i32,
    pub termination: Termination,
    pub stdout: String,
    pub stderr: String,
    /// Files written before the response is returned.
    pub files: Vec<(PathBuf, Vec<u8>)>,
    /// When set, a file of this many bytes is written at the last argument.
    pub output_file_len: Option<usize>,
}

impl MockResponse {
    /// Exit code 0 with no output.
    pub fn success() -> Self {
        Self::default()
    }

    /// Non-zero exit with the given stderr.
    pub fn exit(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: code,
            stderr: stderr.into(),
            ..Default::default()
        }
    }

    /// Binary missing.
    pub fn not_found() -> Self {
        Self {
            termination: Termination::NotFound,
            ..Self::exit(EXIT_NOT_FOUND, "command not found")
        }
    }

    /// Killed after the timeout.
    pub fn timeout() -> Self {
        Self {
            termination: Termination::TimedOut,
            ..Self::exit(EXIT_TIMEOUT, "")
        }
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    /// Writes `contents` at `path` when this response is played.
    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.files.push((path.into(), contents.into()));
        self
    }

    /// Writes `len` bytes at the command's last argument (its output path).
    pub fn with_output_file(mut self, len: usize) -> Self {
        self.output_file_len = Some(len);
        self
    }
}

#[derive(Debug, Default)]
struct MockRunnerState {
    queued: HashMap<String, VecDeque<MockResponse>>,
    defaults: HashMap<String, MockResponse>,
    calls: Vec<CommandSpec>,
}

/// Mock implementation of the CommandRunner trait.
///
/// Responses are keyed by program name, or by `"<program> -m <module>"` for
/// module invocations such as `python3 -m yt_dlp`. Queued responses are
/// played in order; once a key's queue is empty its default applies, and
/// keys with neither behave like a missing binary.
///
/// # Example
///
/// ```rust,ignore
/// let runner = MockRunner::new();
/// runner.on("gallery-dl", MockResponse::not_found()).await;
/// runner.on("python3 -m gallery_dl", MockResponse::success()).await;
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockRunner {
    state: Arc<RwLock<MockRunnerState>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key a spec is matched under.
    pub fn command_key(spec: &CommandSpec) -> String {
        match spec.args.as_slice() {
            [flag, module, ..] if flag == "-m" => format!("{} -m {}", spec.program, module),
            _ => spec.program.clone(),
        }
    }

    /// Queue a response for the next matching invocation.
    pub async fn on(&self, key: impl Into<String>, response: MockResponse) {
        self.state
            .write()
            .await
            .queued
            .entry(key.into())
            .or_default()
            .push_back(response);
    }

    /// Response used whenever the queue for `key` is empty.
    pub async fn set_default(&self, key: impl Into<String>, response: MockResponse) {
        self.state
            .write()
            .await
            .defaults
            .insert(key.into(), response);
    }

    /// Every spec run so far, in order.
    pub async fn calls(&self) -> Vec<CommandSpec> {
        self.state.read().await.calls.clone()
    }

    /// Keys of every spec run so far, in order.
    pub async fn called_keys(&self) -> Vec<String> {
        self.state
            .read()
            .await
            .calls
            .iter()
            .map(Self::command_key)
            .collect()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, spec: CommandSpec) -> CommandOutput {
        let key = Self::command_key(&spec);

        let response = {
            let mut state = self.state.write().await;
            state.calls.push(spec.clone());
            let queued = state.queued.get_mut(&key).and_then(VecDeque::pop_front);
            queued.or_else(|| state.defaults.get(&key).cloned())
        };

        let Some(response) = response else {
            return CommandOutput::not_found(&spec.program);
        };

        for (path, contents) in &response.files {
            if let Some(parent) = path.parent() {
                let _ = tokio::fs::create_dir_all(parent).await;
            }
            let _ = tokio::fs::write(path, contents).await;
        }
        if let (Some(len), Some(last)) = (response.output_file_len, spec.args.last()) {
            let _ = tokio::fs::write(last, vec![0u8; len]).await;
        }

        CommandOutput {
            program: spec.program,
            exit_code: response.exit_code,
            termination: response.termination,
            stdout: response.stdout,
            stderr: response.stderr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn spec(program: &str, args: &[&str]) -> CommandSpec {
        CommandSpec::new(program, Duration::from_secs(1)).args(args.iter().copied())
    }

    #[tokio::test]
    async fn test_queued_then_default_then_missing() {
        let runner = MockRunner::new();
        runner.on("tool", MockResponse::exit(2, "first")).await;
        runner.set_default("tool", MockResponse::success()).await;

        assert_eq!(runner.run(spec("tool", &[])).await.exit_code, 2);
        assert_eq!(runner.run(spec("tool", &[])).await.exit_code, 0);
        assert_eq!(runner.run(spec("tool", &[])).await.exit_code, 0);
        assert_eq!(
            runner.run(spec("other", &[])).await.exit_code,
            EXIT_NOT_FOUND
        );
        assert_eq!(runner.calls().await.len(), 4);
    }

    #[tokio::test]
    async fn test_module_invocations_have_their_own_key() {
        let runner = MockRunner::new();
        runner.on("python3 -m yt_dlp", MockResponse::success()).await;

        let out = runner.run(spec("python3", &["-m", "yt_dlp", "url"])).await;
        assert!(out.is_success());
        let out = runner.run(spec("python3", &["-m", "gallery_dl", "url"])).await;
        assert_eq!(out.exit_code, EXIT_NOT_FOUND);

        assert_eq!(
            runner.called_keys().await,
            vec!["python3 -m yt_dlp", "python3 -m gallery_dl"]
        );
    }

    #[tokio::test]
    async fn test_file_side_effects() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("nested/a.jpg");
        let output = dir.path().join("out.mp4");

        let runner = MockRunner::new();
        runner
            .on(
                "tool",
                MockResponse::success()
                    .with_file(&target, b"img".to_vec())
                    .with_output_file(10),
            )
            .await;

        runner
            .run(spec("tool", &["-i", "x", output.to_str().unwrap()]))
            .await;

        assert_eq!(std::fs::read(&target).unwrap(), b"img");
        assert_eq!(std::fs::metadata(&output).unwrap().len(), 10);
    }
}
