//! Command runner for external tools.
//!
//! Every extraction tool, the transcoder and the alternate transport are
//! invoked through [`CommandRunner`]. The runner never fails: a missing
//! binary, a spawn error or a timeout is recorded as a [`Termination`] next to
//! a distinguished exit code so callers can decide which fallback applies.

mod process;
mod traits;
mod types;

pub use process::ProcessRunner;
pub use traits::CommandRunner;
pub use types::{
    CommandOutput, CommandSpec, ExitOutcome, Termination, EXIT_NOT_FOUND, EXIT_SPAWN_FAILED,
    EXIT_TIMEOUT,
};
