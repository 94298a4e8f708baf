//! Ingress readiness gate.
//!
//! Enables the ingress addon, makes sure the tunnel is up and then polls the
//! controller pods until one reports `Ready` or the deadline passes.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::command_runner::CommandRunner;
use super::tunnel::TunnelManager;
use crate::config::IngressSettings;
use crate::domain::{ReadinessDeadline, RunOptions};
use crate::error::{Error, Result};
use crate::ports::ProcessPort;
use crate::tools::{Kubectl, Minikube, PodListResponse};

pub struct IngressGate<P: ProcessPort> {
    runner: Arc<CommandRunner<P>>,
    minikube: Minikube,
    kubectl: Kubectl,
    settings: IngressSettings,
}

impl<P: ProcessPort> IngressGate<P> {
    pub fn new(
        runner: Arc<CommandRunner<P>>,
        minikube: Minikube,
        kubectl: Kubectl,
        settings: IngressSettings,
    ) -> Self {
        Self {
            runner,
            minikube,
            kubectl,
            settings,
        }
    }

    /// Brings the ingress path up and blocks until the controller is ready.
    ///
    /// A tunnel already owned by `tunnel` is reused. Returns the time spent
    /// polling.
    pub async fn enable_and_wait(&self, tunnel: &mut TunnelManager<P>) -> Result<Duration> {
        info!(addon = %self.settings.addon, "Enabling ingress addon");
        self.runner
            .run(
                &self.minikube.addon_enable(&self.settings.addon),
                RunOptions::checked(),
            )
            .await?;

        if tunnel.is_live() {
            debug!(pid = ?tunnel.pid(), "Reusing running tunnel");
        } else {
            tunnel.start().await?;
            sleep(self.settings.settle()).await;
        }

        let elapsed = self.wait_ready().await?;
        sleep(self.settings.settle()).await;
        Ok(elapsed)
    }

    /// Polls until a controller pod is ready.
    ///
    /// Fails with [`Error::Timeout`] once a not-ready poll finds the deadline
    /// expired, so the loop ends within `timeout + poll_interval`.
    pub async fn wait_ready(&self) -> Result<Duration> {
        let deadline = ReadinessDeadline::start(self.settings.timeout());
        info!(
            timeout_secs = deadline.timeout().as_secs(),
            "Waiting for ingress controller"
        );

        loop {
            let ready = self.ready_pods().await?;
            if !ready.is_empty() {
                let elapsed = deadline.elapsed();
                info!(
                    elapsed_secs = elapsed.as_secs(),
                    pods = ?ready,
                    "Ingress controller ready"
                );
                return Ok(elapsed);
            }

            if deadline.is_expired() {
                warn!(
                    timeout_secs = deadline.timeout().as_secs(),
                    "Ingress controller never became ready"
                );
                return Err(Error::Timeout {
                    elapsed_secs: deadline.elapsed().as_secs(),
                });
            }

            debug!(
                elapsed_secs = deadline.elapsed().as_secs(),
                "Ingress controller not ready yet"
            );
            sleep(self.settings.poll_interval()).await;
        }
    }

    /// One readiness query. Query failures and unreadable output count as
    /// not ready; only a failure to launch the query is an error.
    pub async fn is_ready(&self) -> Result<bool> {
        Ok(!self.ready_pods().await?.is_empty())
    }

    /// Names of the controller pods that are ready now.
    async fn ready_pods(&self) -> Result<Vec<String>> {
        let query = self
            .kubectl
            .get_pods_json(&self.settings.namespace, &self.settings.selector);
        let result = self.runner.run(&query, RunOptions::captured()).await?;

        if !result.success() {
            debug!(
                exit_code = ?result.exit_code,
                stderr = %result.stderr.trim(),
                "Pod query failed"
            );
            return Ok(Vec::new());
        }

        match PodListResponse::parse(&result.stdout) {
            Ok(pods) => Ok(pods.ready_pods().into_iter().map(str::to_string).collect()),
            Err(e) => {
                debug!(error = %e, "Ignoring unreadable pod listing");
                Ok(Vec::new())
            }
        }
    }
}
