//! Command runner - executes one external invocation per call.

use tracing::{debug, error};

use crate::domain::{CommandResult, CommandSpec, RunOptions};
use crate::error::{Error, Result};
use crate::ports::ProcessPort;

/// Runs commands through a [`ProcessPort`] and enforces exit-status policy.
///
/// Calls are strictly sequential: each `run` awaits its child before
/// returning.
pub struct CommandRunner<P: ProcessPort> {
    process: P,
}

impl<P: ProcessPort> CommandRunner<P> {
    pub fn new(process: P) -> Self {
        Self { process }
    }

    /// Runs `command` according to `options`.
    ///
    /// With `must_succeed`, a non-zero (or signal) exit becomes
    /// [`Error::CommandFailed`]; otherwise it is left in the returned result.
    pub async fn run(&self, command: &CommandSpec, options: RunOptions) -> Result<CommandResult> {
        debug!(command = %command, capture = options.capture, "Running command");

        let result = self.process.run(command, options.capture).await?;

        if options.must_succeed && !result.success() {
            let exit_code = result.exit_code.unwrap_or(1);
            error!(command = %command, exit_code, "Command failed");
            return Err(Error::CommandFailed {
                command: command.to_string(),
                exit_code,
            });
        }

        if !result.success() {
            debug!(command = %command, exit_code = ?result.exit_code, "Command exited non-zero");
        }

        Ok(result)
    }

    /// Spawns `command` as a detached background process.
    pub fn spawn_background(&self, command: &CommandSpec) -> Result<P::Child> {
        debug!(command = %command, "Spawning background command");
        self.process.spawn_background(command)
    }

    /// Attaches to a live process started by an earlier invocation of
    /// `expected`.
    pub fn attach(&self, pid: u32, expected: &CommandSpec) -> Option<P::Child> {
        self.process.attach(pid, expected)
    }
}
