//! Cluster lifecycle controller.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use super::command_runner::CommandRunner;
use crate::domain::RunOptions;
use crate::error::Result;
use crate::ports::ProcessPort;
use crate::tools::Minikube;

/// Host state reported by the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterStatus {
    Running,
    /// Anything else, with the reported state (e.g., "Stopped", "Nonexistent").
    NotRunning(String),
}

impl ClusterStatus {
    fn from_host_state(output: &str) -> Self {
        let state = output.trim();
        if state == "Running" {
            ClusterStatus::Running
        } else if state.is_empty() {
            ClusterStatus::NotRunning("Unknown".to_string())
        } else {
            ClusterStatus::NotRunning(state.to_string())
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, ClusterStatus::Running)
    }
}

impl fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterStatus::Running => f.write_str("Running"),
            ClusterStatus::NotRunning(state) => f.write_str(state),
        }
    }
}

/// Starts and stops the local single-node cluster.
pub struct ClusterController<P: ProcessPort> {
    runner: Arc<CommandRunner<P>>,
    minikube: Minikube,
    driver: String,
}

impl<P: ProcessPort> ClusterController<P> {
    pub fn new(runner: Arc<CommandRunner<P>>, minikube: Minikube, driver: impl Into<String>) -> Self {
        Self {
            runner,
            minikube,
            driver: driver.into(),
        }
    }

    /// Queries the host state. `minikube status` exits non-zero for a stopped
    /// cluster, so only a failure to launch it is an error.
    pub async fn status(&self) -> Result<ClusterStatus> {
        let result = self
            .runner
            .run(&self.minikube.status(), RunOptions::captured())
            .await?;
        Ok(ClusterStatus::from_host_state(&result.stdout))
    }

    /// Starts the cluster unless it is already running.
    pub async fn ensure_running(&self) -> Result<()> {
        match self.status().await? {
            ClusterStatus::Running => {
                info!("Cluster already running");
                Ok(())
            }
            ClusterStatus::NotRunning(state) => {
                info!(state = %state, driver = %self.driver, "Starting cluster");
                self.runner
                    .run(&self.minikube.start(&self.driver), RunOptions::checked())
                    .await?;
                info!("Cluster started");
                Ok(())
            }
        }
    }

    /// Stops the cluster. Callers on the teardown path record the error
    /// instead of propagating it.
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping cluster");
        self.runner
            .run(&self.minikube.stop(), RunOptions::checked())
            .await?;
        Ok(())
    }
}
