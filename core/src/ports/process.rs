//! Process port (interface).

use std::time::Duration;

use crate::domain::{CommandResult, CommandSpec};
use crate::error::Result;

/// Port for launching external tools.
///
/// The system adapter spawns real OS processes; tests inject a fake that
/// records invocations and returns scripted results.
pub trait ProcessPort: Send + Sync {
    /// Handle type for detached background processes.
    type Child: BackgroundProcess;

    /// Run a command to completion.
    ///
    /// If `capture` is true, stdout/stderr are buffered and returned;
    /// otherwise they stream to this process's own stdio. A non-zero exit is
    /// not an error at this level.
    fn run(
        &self,
        command: &CommandSpec,
        capture: bool,
    ) -> impl std::future::Future<Output = Result<CommandResult>> + Send;

    /// Spawn a command as a detached background process.
    fn spawn_background(&self, command: &CommandSpec) -> Result<Self::Child>;

    /// Attach to a process started by an earlier invocation.
    ///
    /// Returns `None` unless a process with that pid is alive and is still
    /// running `expected`. A pid the OS has handed to another program must
    /// never come back as a handle, since handles get signalled.
    fn attach(&self, pid: u32, expected: &CommandSpec) -> Option<Self::Child>;
}

/// A background process that can be terminated gracefully or forcefully.
pub trait BackgroundProcess: Send {
    /// OS process id, if still known.
    fn pid(&self) -> Option<u32>;

    /// Request graceful termination (SIGTERM).
    fn terminate(&mut self) -> Result<()>;

    /// Wait up to `grace` for the process to exit.
    ///
    /// Returns `Ok(true)` if it exited, `Ok(false)` if it is still running.
    fn wait_for_exit(
        &mut self,
        grace: Duration,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Force-kill the process (SIGKILL) and reap it.
    fn kill(&mut self) -> impl std::future::Future<Output = Result<()>> + Send;
}
