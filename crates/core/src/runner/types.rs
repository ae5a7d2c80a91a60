//! Types for the command runner.

use std::path::PathBuf;
use std::time::Duration;

/// Exit code reported when a command exceeded its timeout and was killed.
pub const EXIT_TIMEOUT: i32 = 124;

/// Exit code reported when the program could not be spawned for a reason
/// other than a missing binary.
pub const EXIT_SPAWN_FAILED: i32 = 126;

/// Exit code reported when the program binary does not exist.
pub const EXIT_NOT_FOUND: i32 = 127;

/// A single external process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program to execute (looked up on `PATH` when not absolute).
    pub program: String,
    /// Arguments, passed verbatim.
    pub args: Vec<String>,
    /// Hard limit on wall-clock time.
    pub timeout: Duration,
    /// Working directory, inherited when `None`.
    pub cwd: Option<PathBuf>,
    /// Extra environment variables layered on the inherited environment.
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Creates a spec with no arguments and the given timeout.
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout,
            cwd: None,
            env: Vec::new(),
        }
    }

    /// Appends a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the working directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Adds an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Human readable command line, used in logs.
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// How a command ended, as observed by the runner.
///
/// Recorded separately from the exit code: tools are free to exit with any
/// status, including the numbers reported for the runner's own conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Termination {
    /// The process ran and exited on its own.
    #[default]
    Exited,
    /// The timeout fired and the process was killed.
    TimedOut,
    /// The binary does not exist.
    NotFound,
    /// The process could not be started.
    SpawnFailed,
}

/// Classified result of a finished command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Exit code 0.
    Success,
    /// The timeout fired and the process was killed.
    TimedOut,
    /// The binary does not exist.
    NotFound,
    /// Any other non-zero exit (or spawn failure).
    Failed(i32),
}

/// Output captured from one command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// The program that ran.
    pub program: String,
    /// Exit code, or one of the distinguished codes in this module.
    pub exit_code: i32,
    /// How the process ended.
    pub termination: Termination,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

impl CommandOutput {
    /// Builds a successful output with the given stdout.
    pub fn success(program: impl Into<String>, stdout: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            exit_code: 0,
            termination: Termination::Exited,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Builds a failed output with the given exit code and stderr.
    pub fn failure(program: impl Into<String>, exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            exit_code,
            termination: Termination::Exited,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Builds the output reported for a missing binary.
    pub fn not_found(program: impl Into<String>) -> Self {
        let program = program.into();
        let stderr = format!("{}: command not found", program);
        Self {
            termination: Termination::NotFound,
            ..Self::failure(program, EXIT_NOT_FOUND, stderr)
        }
    }

    /// Builds the output reported when the process could not be started.
    pub fn spawn_failed(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            termination: Termination::SpawnFailed,
            ..Self::failure(program, EXIT_SPAWN_FAILED, reason)
        }
    }

    /// Builds the output reported for a timed out process.
    pub fn timed_out(program: impl Into<String>, stdout: String, stderr: String) -> Self {
        Self {
            program: program.into(),
            exit_code: EXIT_TIMEOUT,
            termination: Termination::TimedOut,
            stdout,
            stderr,
        }
    }

    /// Classifies the result by how the process ended, then by exit code.
    pub fn outcome(&self) -> ExitOutcome {
        match self.termination {
            Termination::TimedOut => ExitOutcome::TimedOut,
            Termination::NotFound => ExitOutcome::NotFound,
            Termination::SpawnFailed => ExitOutcome::Failed(self.exit_code),
            Termination::Exited if self.exit_code == 0 => ExitOutcome::Success,
            Termination::Exited => ExitOutcome::Failed(self.exit_code),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome() == ExitOutcome::Success
    }

    /// Best diagnostic text: stderr, or stdout when stderr is empty.
    pub fn diagnostic(&self) -> &str {
        if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}
