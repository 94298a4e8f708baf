//! Test doubles for the process port.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::domain::{CommandResult, CommandSpec};
use crate::error::{Error, Result};
use crate::ports::{BackgroundProcess, ProcessPort};

/// `kubectl get pods -o json` output with one ready controller pod.
pub const READY_PODS: &str = r#"{"items":[{"metadata":{"name":"ingress-nginx-controller-0"},"status":{"conditions":[{"type":"Ready","status":"True"}]}}]}"#;

/// `kubectl get pods -o json` output with no pods.
pub const NO_PODS: &str = r#"{"items":[]}"#;

/// Lifecycle of a fake background process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildState {
    pub command: String,
    pub alive: bool,
    pub terminated: bool,
    pub killed: bool,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<String>,
    scripts: Vec<(String, VecDeque<CommandResult>)>,
    next_pid: u32,
    children: HashMap<u32, ChildState>,
    spawn_fails: bool,
    ignore_terminate: bool,
}

/// Fake process port.
///
/// Records every invocation as its rendered command line and answers with
/// results scripted per command prefix. Unscripted commands succeed with
/// empty output. Clones share state, so a test keeps one clone for
/// inspection after handing another to the code under test.
#[derive(Clone)]
pub struct FakeProcess {
    state: Arc<Mutex<FakeState>>,
}

impl FakeProcess {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                next_pid: 1000,
                ..FakeState::default()
            })),
        }
    }

    /// A cluster that is already running with a ready ingress controller.
    pub fn ready_cluster() -> Self {
        let fake = Self::new();
        fake.respond("minikube status", CommandResult::captured(Some(0), "Running\n", ""));
        fake.respond("kubectl get pods", CommandResult::captured(Some(0), READY_PODS, ""));
        fake
    }

    /// Answers every command starting with `prefix` with `result`.
    pub fn respond(&self, prefix: &str, result: CommandResult) {
        self.respond_sequence(prefix, vec![result]);
    }

    /// Answers successive matching commands with `results` in order; the
    /// last result repeats once the others are used up.
    pub fn respond_sequence(&self, prefix: &str, results: Vec<CommandResult>) {
        let mut state = self.state.lock();
        state.scripts.retain(|(p, _)| p != prefix);
        state.scripts.push((prefix.to_string(), results.into()));
    }

    /// Makes every command starting with `prefix` exit with `code`.
    pub fn fail(&self, prefix: &str, code: i32) {
        self.respond(prefix, CommandResult::captured(Some(code), "", "error"));
    }

    /// Makes background spawns fail.
    pub fn fail_spawn(&self) {
        self.state.lock().spawn_fails = true;
    }

    /// Makes background processes ignore graceful termination.
    pub fn ignore_terminate(&self) {
        self.state.lock().ignore_terminate = true;
    }

    /// Registers a live process started by an earlier invocation.
    pub fn add_orphan(&self, pid: u32, command: &str) {
        self.state.lock().children.insert(
            pid,
            ChildState {
                command: command.to_string(),
                alive: true,
                ..ChildState::default()
            },
        );
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn calls_matching(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls_matching(prefix).len()
    }

    /// Index of the first call starting with `prefix`.
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.calls().iter().position(|c| c.starts_with(prefix))
    }

    pub fn child(&self, pid: u32) -> Option<ChildState> {
        self.state.lock().children.get(&pid).cloned()
    }

    pub fn live_children(&self) -> Vec<u32> {
        let state = self.state.lock();
        let mut pids: Vec<u32> = state
            .children
            .iter()
            .filter(|(_, c)| c.alive)
            .map(|(pid, _)| *pid)
            .collect();
        pids.sort_unstable();
        pids
    }
}

impl ProcessPort for FakeProcess {
    type Child = FakeChild;

    async fn run(&self, command: &CommandSpec, _capture: bool) -> Result<CommandResult> {
        let line = command.to_string();
        let mut state = self.state.lock();
        state.calls.push(line.clone());

        let scripted = state
            .scripts
            .iter_mut()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .and_then(|(_, results)| {
                if results.len() > 1 {
                    results.pop_front()
                } else {
                    results.front().cloned()
                }
            });

        Ok(scripted.unwrap_or_else(|| CommandResult::exited(0)))
    }

    fn spawn_background(&self, command: &CommandSpec) -> Result<FakeChild> {
        let line = command.to_string();
        let mut state = self.state.lock();
        state.calls.push(line.clone());

        if state.spawn_fails {
            return Err(Error::Spawn {
                program: command.program().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            });
        }

        let pid = state.next_pid;
        state.next_pid += 1;
        state.children.insert(
            pid,
            ChildState {
                command: line,
                alive: true,
                ..ChildState::default()
            },
        );

        Ok(FakeChild {
            pid,
            state: Arc::clone(&self.state),
        })
    }

    fn attach(&self, pid: u32, expected: &CommandSpec) -> Option<FakeChild> {
        let state = self.state.lock();
        let running = state.children.get(&pid).is_some_and(|c| {
            let argv: Vec<&str> = c.command.split_whitespace().collect();
            c.alive && expected.matches_argv(&argv)
        });
        running.then(|| FakeChild {
            pid,
            state: Arc::clone(&self.state),
        })
    }
}

/// Background process handed out by [`FakeProcess`].
pub struct FakeChild {
    pid: u32,
    state: Arc<Mutex<FakeState>>,
}

impl FakeChild {
    fn is_alive(&self) -> bool {
        self.state
            .lock()
            .children
            .get(&self.pid)
            .is_some_and(|c| c.alive)
    }
}

impl BackgroundProcess for FakeChild {
    fn pid(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn terminate(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        let ignore = state.ignore_terminate;
        if let Some(child) = state.children.get_mut(&self.pid) {
            child.terminated = true;
            if !ignore {
                child.alive = false;
            }
        }
        Ok(())
    }

    async fn wait_for_exit(&mut self, grace: Duration) -> Result<bool> {
        if !self.is_alive() {
            return Ok(true);
        }
        tokio::time::sleep(grace).await;
        Ok(!self.is_alive())
    }

    async fn kill(&mut self) -> Result<()> {
        if let Some(child) = self.state.lock().children.get_mut(&self.pid) {
            child.killed = true;
            child.alive = false;
        }
        Ok(())
    }
}
