//! Tunnel process manager.
//!
//! Owns the single background `minikube tunnel` process. The handle lives in
//! [`TunnelManager`] and is only reachable through `&mut self`, so at most
//! one tunnel exists per process. The pid is also recorded on disk so a later
//! invocation can terminate a tunnel started by an earlier one.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::command_runner::CommandRunner;
use crate::error::{Error, Result};
use crate::ports::{BackgroundProcess, ProcessPort};
use crate::state::{TunnelRecord, TunnelRecordStore};
use crate::tools::Minikube;

pub struct TunnelManager<P: ProcessPort> {
    runner: Arc<CommandRunner<P>>,
    minikube: Minikube,
    records: TunnelRecordStore,
    run_id: Uuid,
    /// How long a terminated tunnel may take to exit before it is killed.
    grace: Duration,
    handle: Option<P::Child>,
}

impl<P: ProcessPort> TunnelManager<P> {
    pub fn new(
        runner: Arc<CommandRunner<P>>,
        minikube: Minikube,
        records: TunnelRecordStore,
        run_id: Uuid,
        grace: Duration,
    ) -> Self {
        Self {
            runner,
            minikube,
            records,
            run_id,
            grace,
            handle: None,
        }
    }

    /// True while this process owns a tunnel handle.
    pub fn is_live(&self) -> bool {
        self.handle.is_some()
    }

    pub fn pid(&self) -> Option<u32> {
        self.handle.as_ref().and_then(BackgroundProcess::pid)
    }

    /// Pid of the tunnel recorded on disk, if any.
    pub async fn recorded_pid(&self) -> Option<u32> {
        self.records.load().await.map(|record| record.pid)
    }

    /// Pid of the running tunnel, whether owned here or by an earlier run.
    pub async fn running_pid(&self) -> Option<u32> {
        match self.pid() {
            Some(pid) => Some(pid),
            None => self.attach_recorded().await.and_then(|child| child.pid()),
        }
    }

    /// Starts the tunnel in the background.
    ///
    /// Fails with [`Error::TunnelAlreadyRunning`] if this process already
    /// owns one. A still-running tunnel recorded by an earlier invocation is
    /// shut down first.
    pub async fn start(&mut self) -> Result<()> {
        if let Some(handle) = &self.handle {
            return Err(Error::TunnelAlreadyRunning(handle.pid()));
        }

        if let Some(stale) = self.attach_recorded().await {
            warn!(pid = ?stale.pid(), "Replacing tunnel left by an earlier run");
            self.shut_down(stale).await;
        }

        let child = self.runner.spawn_background(&self.minikube.tunnel())?;
        let pid = child.pid();
        info!(pid = ?pid, "Tunnel started");

        if let Some(pid) = pid {
            let record = TunnelRecord {
                pid,
                run_id: self.run_id,
            };
            if let Err(e) = self.records.save(&record).await {
                warn!(pid, error = %e, "Failed to record tunnel pid");
            }
        }

        self.handle = Some(child);
        Ok(())
    }

    /// Stops the tunnel: graceful termination, then a forced kill once the
    /// grace window has passed.
    ///
    /// Never fails. The handle and the on-disk record are always cleared.
    pub async fn stop(&mut self) {
        let handle = match self.handle.take() {
            Some(handle) => Some(handle),
            None => self.attach_recorded().await,
        };

        match handle {
            Some(child) => self.shut_down(child).await,
            None => debug!("No tunnel running"),
        }

        if let Err(e) = self.records.clear().await {
            warn!(error = %e, "Failed to clear tunnel record");
        }
    }

    /// Handle to the tunnel recorded on disk.
    ///
    /// The pid only counts while it still runs `minikube tunnel`. Otherwise
    /// the tunnel is gone and the OS may have reused the pid, so the record
    /// is discarded and nothing is signalled.
    async fn attach_recorded(&self) -> Option<P::Child> {
        let record = self.records.load().await?;
        let child = self.runner.attach(record.pid, &self.minikube.tunnel());
        if child.is_none() {
            info!(
                pid = record.pid,
                record = %self.records.path().display(),
                "Recorded tunnel is no longer running, discarding record"
            );
            if let Err(e) = self.records.clear().await {
                warn!(error = %e, "Failed to clear tunnel record");
            }
        }
        child
    }

    async fn shut_down(&self, mut child: P::Child) {
        let pid = child.pid();

        if let Err(e) = child.terminate() {
            warn!(pid = ?pid, error = %e, "Failed to signal tunnel");
        }

        match child.wait_for_exit(self.grace).await {
            Ok(true) => {
                info!(pid = ?pid, "Tunnel stopped");
                return;
            }
            Ok(false) => warn!(
                pid = ?pid,
                grace_secs = self.grace.as_secs(),
                "Tunnel did not exit in time, killing"
            ),
            Err(e) => warn!(pid = ?pid, error = %e, "Failed waiting for tunnel, killing"),
        }

        match child.kill().await {
            Ok(()) => info!(pid = ?pid, "Tunnel killed"),
            Err(e) => warn!(pid = ?pid, error = %e, "Failed to kill tunnel"),
        }
    }
}
