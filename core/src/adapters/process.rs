//! System process adapter built on `tokio::process`.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::domain::{CommandResult, CommandSpec};
use crate::error::{Error, Result};
use crate::ports::{BackgroundProcess, ProcessPort};

/// How often an attached process is checked while waiting for it to exit.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Launches real OS processes in the current directory.
#[derive(Debug, Default)]
pub struct SystemProcess;

impl SystemProcess {
    pub fn new() -> Self {
        Self
    }

    fn command(&self, spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(spec.program());
        cmd.args(spec.get_args());
        cmd
    }
}

impl ProcessPort for SystemProcess {
    type Child = SystemChild;

    async fn run(&self, command: &CommandSpec, capture: bool) -> Result<CommandResult> {
        let mut cmd = self.command(command);

        if capture {
            let output = cmd
                .stdin(Stdio::null())
                .output()
                .await
                .map_err(|e| spawn_error(command, e))?;

            return Ok(CommandResult::captured(
                output.status.code(),
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr),
            ));
        }

        let status = cmd
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| spawn_error(command, e))?;

        Ok(CommandResult {
            exit_code: status.code(),
            ..CommandResult::default()
        })
    }

    fn spawn_background(&self, command: &CommandSpec) -> Result<SystemChild> {
        let mut cmd = self.command(command);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false);

        // Own process group: a Ctrl-C aimed at the CLI must not reach the tunnel.
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn().map_err(|e| spawn_error(command, e))?;
        debug!(pid = ?child.id(), command = %command, "Spawned background process");

        Ok(SystemChild {
            inner: ChildInner::Spawned(child),
        })
    }

    fn attach(&self, pid: u32, expected: &CommandSpec) -> Option<SystemChild> {
        if !sys::is_alive(pid) {
            return None;
        }

        match sys::command_line(pid) {
            Some(argv) if expected.matches_argv(&argv) => Some(SystemChild {
                inner: ChildInner::Attached(pid),
            }),
            argv => {
                debug!(pid, ?argv, expected = %expected, "Pid now belongs to another program");
                None
            }
        }
    }
}

/// Handle to a background process, spawned here or attached by pid.
#[derive(Debug)]
pub struct SystemChild {
    inner: ChildInner,
}

#[derive(Debug)]
enum ChildInner {
    Spawned(Child),
    Attached(u32),
}

impl BackgroundProcess for SystemChild {
    fn pid(&self) -> Option<u32> {
        match &self.inner {
            ChildInner::Spawned(child) => child.id(),
            ChildInner::Attached(pid) => Some(*pid),
        }
    }

    fn terminate(&mut self) -> Result<()> {
        if let ChildInner::Spawned(child) = &mut self.inner {
            if cfg!(not(unix)) {
                return child.start_kill().map_err(Error::from);
            }
        }

        match self.pid() {
            Some(pid) => sys::terminate(pid),
            None => Ok(()), // Already reaped
        }
    }

    async fn wait_for_exit(&mut self, grace: Duration) -> Result<bool> {
        match &mut self.inner {
            ChildInner::Spawned(child) => match tokio::time::timeout(grace, child.wait()).await {
                Ok(status) => {
                    let status = status?;
                    debug!(?status, "Background process exited");
                    Ok(true)
                }
                Err(_) => Ok(false),
            },
            ChildInner::Attached(pid) => {
                let pid = *pid;
                let deadline = Instant::now() + grace;
                loop {
                    if !sys::is_alive(pid) {
                        return Ok(true);
                    }
                    if Instant::now() >= deadline {
                        return Ok(false);
                    }
                    sleep(EXIT_POLL_INTERVAL).await;
                }
            }
        }
    }

    async fn kill(&mut self) -> Result<()> {
        match &mut self.inner {
            ChildInner::Spawned(child) => child.kill().await.map_err(Error::from),
            ChildInner::Attached(pid) => sys::force_kill(*pid),
        }
    }
}

fn spawn_error(command: &CommandSpec, source: std::io::Error) -> Error {
    Error::Spawn {
        program: command.program().to_string(),
        source,
    }
}

#[cfg(unix)]
mod sys {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    use crate::error::{Error, Result};

    fn send(pid: u32, signal: Option<Signal>) -> nix::Result<()> {
        // pid 0 and negative pids address process groups, never a single tunnel
        let raw = i32::try_from(pid)
            .ok()
            .filter(|p| *p > 0)
            .ok_or(Errno::ESRCH)?;
        kill(Pid::from_raw(raw), signal)
    }

    fn deliver(pid: u32, signal: Signal) -> Result<()> {
        match send(pid, Some(signal)) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(errno) => Err(Error::KillFailed {
                pid,
                reason: errno.desc().to_string(),
            }),
        }
    }

    pub fn terminate(pid: u32) -> Result<()> {
        deliver(pid, Signal::SIGTERM)
    }

    pub fn force_kill(pid: u32) -> Result<()> {
        deliver(pid, Signal::SIGKILL)
    }

    pub fn is_alive(pid: u32) -> bool {
        matches!(send(pid, None), Ok(()) | Err(Errno::EPERM))
    }

    /// Argument vector of a running process. Zombies have none.
    #[cfg(target_os = "linux")]
    pub fn command_line(pid: u32) -> Option<Vec<String>> {
        let raw = std::fs::read(format!("/proc/{pid}/cmdline")).ok()?;
        let argv: Vec<String> = raw
            .split(|byte| *byte == 0)
            .filter(|arg| !arg.is_empty())
            .map(|arg| String::from_utf8_lossy(arg).into_owned())
            .collect();
        (!argv.is_empty()).then_some(argv)
    }

    /// Argument vector of a running process, split on whitespace by `ps`.
    #[cfg(not(target_os = "linux"))]
    pub fn command_line(pid: u32) -> Option<Vec<String>> {
        let output = std::process::Command::new("ps")
            .args(["-o", "command=", "-p", &pid.to_string()])
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let argv: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .split_whitespace()
            .map(str::to_string)
            .collect();
        (!argv.is_empty()).then_some(argv)
    }
}

#[cfg(not(unix))]
mod sys {
    use crate::error::{Error, Result};

    pub fn terminate(pid: u32) -> Result<()> {
        Err(Error::KillFailed {
            pid,
            reason: "signals are not supported on this platform".to_string(),
        })
    }

    pub fn force_kill(pid: u32) -> Result<()> {
        terminate(pid)
    }

    pub fn is_alive(_pid: u32) -> bool {
        false
    }

    pub fn command_line(_pid: u32) -> Option<Vec<String>> {
        None
    }
}
