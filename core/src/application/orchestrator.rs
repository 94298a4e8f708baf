//! Deployment orchestrator.
//!
//! Composes the cluster controller, ingress gate, tunnel manager, manifest
//! applier and image builder into the user-facing lifecycle operations.
//! Bring-up paths propagate the first failure; teardown paths collect
//! failures in a [`TeardownReport`] and always run to the end.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::cluster::{ClusterController, ClusterStatus};
use super::command_runner::CommandRunner;
use super::images::ImageBuilder;
use super::ingress::IngressGate;
use super::manifests::ManifestApplier;
use super::tunnel::TunnelManager;
use crate::adapters::ToolPaths;
use crate::config::Settings;
use crate::domain::{
    buildable_targets, DeploymentState, RunOptions, ServiceName, TeardownReport,
};
use crate::error::{Error, Result};
use crate::ports::ProcessPort;
use crate::state::{
    DeploymentRecord, DeploymentRecordStore, TunnelRecordStore, DEPLOYMENT_RECORD_FILE,
    TUNNEL_RECORD_FILE,
};
use crate::tools::{Docker, Kubectl, Minikube};

/// Snapshot returned by [`Orchestrator::status`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub cluster: String,
    pub cluster_running: bool,
    pub tunnel_pid: Option<u32>,
    pub ingress_ready: bool,
    /// State left by the last `deploy` or `shutdown`, from any invocation.
    pub state: DeploymentState,
}

fn describe(target: Option<ServiceName>) -> &'static str {
    target.map_or("all", |service| service.as_str())
}

pub struct Orchestrator<P: ProcessPort> {
    runner: Arc<CommandRunner<P>>,
    cluster: ClusterController<P>,
    gate: IngressGate<P>,
    tunnel: TunnelManager<P>,
    manifests: ManifestApplier<P>,
    images: ImageBuilder<P>,
    kubectl: Kubectl,
    minikube: Minikube,
    image_prefix: String,
    ingress_addon: String,
    run_id: Uuid,
    state: DeploymentState,
    deployments: DeploymentRecordStore,
}

impl<P: ProcessPort> Orchestrator<P> {
    /// Wires every component over one shared command runner. Records that
    /// outlive this invocation go to `state_dir`.
    pub fn new(process: P, settings: &Settings, tools: &ToolPaths, state_dir: &Path) -> Self {
        let runner = Arc::new(CommandRunner::new(process));
        let minikube = Minikube::new(&tools.minikube);
        let kubectl = Kubectl::new(&tools.kubectl);
        let run_id = Uuid::new_v4();

        let cluster = ClusterController::new(
            Arc::clone(&runner),
            minikube.clone(),
            settings.cluster_driver.clone(),
        );
        let gate = IngressGate::new(
            Arc::clone(&runner),
            minikube.clone(),
            kubectl.clone(),
            settings.ingress.clone(),
        );
        let tunnel = TunnelManager::new(
            Arc::clone(&runner),
            minikube.clone(),
            TunnelRecordStore::in_dir(state_dir, TUNNEL_RECORD_FILE),
            run_id,
            settings.tunnel_grace(),
        );
        let manifests = ManifestApplier::new(
            Arc::clone(&runner),
            kubectl.clone(),
            settings.manifests_path(),
            settings.image_prefix.clone(),
        );
        let images = ImageBuilder::new(
            Arc::clone(&runner),
            Docker::new(&tools.docker),
            settings.project_root.clone(),
            settings.image_prefix.clone(),
            settings.image_tag.clone(),
        );

        Self {
            runner,
            cluster,
            gate,
            tunnel,
            manifests,
            images,
            kubectl,
            minikube,
            image_prefix: settings.image_prefix.clone(),
            ingress_addon: settings.ingress.addon.clone(),
            run_id,
            state: DeploymentState::Down,
            deployments: DeploymentRecordStore::in_dir(state_dir, DEPLOYMENT_RECORD_FILE),
        }
    }

    pub fn state(&self) -> DeploymentState {
        self.state
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Cluster up, ingress ready, then manifests applied.
    ///
    /// No manifest is applied before the ingress gate passes. A failure
    /// leaves the state [`DeploymentState::Indeterminate`].
    pub async fn deploy(&mut self, target: Option<ServiceName>) -> Result<()> {
        info!(services = describe(target), run_id = %self.run_id, "Deploying");

        let result = self.bring_up(target).await;
        let state = match result {
            Ok(()) => DeploymentState::Up,
            Err(_) => DeploymentState::Indeterminate,
        };
        self.set_state(state).await;
        result?;

        info!(services = describe(target), "Deployment complete");
        Ok(())
    }

    async fn bring_up(&mut self, target: Option<ServiceName>) -> Result<()> {
        self.cluster.ensure_running().await?;
        self.gate.enable_and_wait(&mut self.tunnel).await?;
        self.manifests.apply(target).await
    }

    /// Deletes resources. With `all_pods` the teardown is total whatever the
    /// target: every resource, the tunnel, the ingress addon and the cluster.
    ///
    /// Never fails; recoverable failures are returned in the report.
    pub async fn shutdown(
        &mut self,
        target: Option<ServiceName>,
        force: bool,
        all_pods: bool,
    ) -> TeardownReport {
        let report = if all_pods {
            if let Some(service) = target {
                info!(service = %service, "Total teardown requested, ignoring target");
            }
            self.teardown_everything(force).await
        } else {
            info!(services = describe(target), force, "Shutting down");
            self.manifests.remove(target, force).await
        };

        self.set_state(DeploymentState::Down).await;
        report
    }

    /// Updates the macro state and records it for later invocations. A
    /// failed write is only logged.
    async fn set_state(&mut self, state: DeploymentState) {
        self.state = state;
        let record = DeploymentRecord {
            state,
            run_id: self.run_id,
        };
        if let Err(e) = self.deployments.save(&record).await {
            warn!(
                state = %state,
                record = %self.deployments.path().display(),
                error = %e,
                "Failed to record deployment state"
            );
        }
    }

    async fn teardown_everything(&mut self, force: bool) -> TeardownReport {
        info!(force, "Tearing down everything");
        let mut report = self.manifests.remove(None, force).await;

        self.tunnel.stop().await;

        let disable = self.minikube.addon_disable(&self.ingress_addon);
        report.record(
            format!("disable {} addon", self.ingress_addon),
            self.runner.run(&disable, RunOptions::checked()).await,
        );
        report.record("stop cluster", self.cluster.stop().await);
        report
    }

    /// Forced shutdown of the target, image rebuild, then a fresh deploy.
    pub async fn restart(&mut self, target: Option<ServiceName>, no_cache: bool) -> Result<()> {
        info!(services = describe(target), "Restarting");

        let report = self.shutdown(target, true, false).await;
        if !report.is_clean() {
            warn!(
                failed = report.failures().len(),
                "Shutdown was incomplete, continuing with restart"
            );
        }

        self.images.build_targets(target, no_cache).await?;
        self.deploy(target).await
    }

    /// Rebuilds images and rolls the running deployments over to them,
    /// without touching the cluster, ingress or manifests.
    pub async fn rebuild(&mut self, target: Option<ServiceName>, no_cache: bool) -> Result<()> {
        if let Some(service) = target.filter(|service| !service.is_buildable()) {
            return Err(Error::NotBuildable(service));
        }

        let services = buildable_targets(target);
        for service in &services {
            self.images.build(*service, no_cache).await?;
        }

        for service in services {
            let deployment = service.deployment_name(&self.image_prefix);
            info!(deployment = %deployment, "Restarting rollout");
            self.runner
                .run(
                    &self.kubectl.rollout_restart(&deployment),
                    RunOptions::checked(),
                )
                .await?;
        }
        Ok(())
    }

    /// Builds the images of `target` (all buildable services for `None`),
    /// then deploys it.
    pub async fn build(&mut self, target: Option<ServiceName>, no_cache: bool) -> Result<()> {
        if let Some(service) = target.filter(|service| !service.is_buildable()) {
            return Err(Error::NotBuildable(service));
        }

        self.images.build_targets(target, no_cache).await?;
        self.deploy(target).await
    }

    /// Streams the logs of a service's deployment until the user interrupts.
    pub async fn logs(&self, service: ServiceName) -> Result<()> {
        let deployment = service.deployment_name(&self.image_prefix);
        info!(deployment = %deployment, "Tailing logs");

        let result = self
            .runner
            .run(&self.kubectl.logs_follow(&deployment), RunOptions::unchecked())
            .await?;
        if !result.success() {
            warn!(deployment = %deployment, exit_code = ?result.exit_code, "Log stream ended with an error");
        }
        Ok(())
    }

    /// Removes the locally built images.
    pub async fn clear_builds(&self) -> TeardownReport {
        self.images.remove_images().await
    }

    pub async fn status(&self) -> Result<StatusReport> {
        let cluster = self.cluster.status().await?;
        let ingress_ready = match cluster {
            ClusterStatus::Running => self.gate.is_ready().await?,
            ClusterStatus::NotRunning(_) => false,
        };

        Ok(StatusReport {
            cluster_running: cluster.is_running(),
            cluster: cluster.to_string(),
            tunnel_pid: self.tunnel.running_pid().await,
            ingress_ready,
            state: self
                .deployments
                .load()
                .await
                .map_or(self.state, |record| record.state),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CommandResult;
    use crate::testing::{FakeProcess, NO_PODS};
    use tempfile::{tempdir, TempDir};
    use tokio::time::Instant;

    struct Harness {
        fake: FakeProcess,
        orchestrator: Orchestrator<FakeProcess>,
        dir: TempDir,
    }

    fn harness(fake: FakeProcess) -> Harness {
        let dir = tempdir().unwrap();
        let orchestrator = Orchestrator::new(
            fake.clone(),
            &Settings::default(),
            &ToolPaths::default(),
            dir.path(),
        );
        Harness {
            fake,
            orchestrator,
            dir,
        }
    }

    fn applies(fake: &FakeProcess) -> Vec<String> {
        fake.calls_matching("kubectl apply")
    }

    #[tokio::test(start_paused = true)]
    async fn test_build_single_service() {
        let mut h = harness(FakeProcess::ready_cluster());

        h.orchestrator
            .build(Some(ServiceName::Backend), false)
            .await
            .unwrap();

        assert_eq!(
            h.fake.calls_matching("docker build"),
            vec!["docker build -f ./Dockerfile.backend -t campus-connect-backend:latest ."]
        );
        assert_eq!(
            applies(&h.fake),
            vec![
                "kubectl apply -f ./kubernetes/backend-deployment.yaml",
                "kubectl apply -f ./kubernetes/backend-service.yaml",
            ]
        );
        assert!(h.fake.position("docker build") < h.fake.position("kubectl apply"));
        assert_eq!(h.orchestrator.state(), DeploymentState::Up);
    }

    #[tokio::test(start_paused = true)]
    async fn test_build_all_then_full_deploy() {
        let mut h = harness(FakeProcess::ready_cluster());

        h.orchestrator.build(None, true).await.unwrap();

        let builds = h.fake.calls_matching("docker build");
        assert_eq!(builds.len(), 2);
        assert!(builds.iter().all(|b| b.contains("--no-cache")));
        assert_eq!(applies(&h.fake).len(), 11);
    }

    #[tokio::test(start_paused = true)]
    async fn test_build_rejects_non_buildable_target() {
        let mut h = harness(FakeProcess::ready_cluster());

        let err = h
            .orchestrator
            .build(Some(ServiceName::Redis), false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotBuildable(ServiceName::Redis)));
        assert!(h.fake.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deploy_order() {
        let mut h = harness(FakeProcess::ready_cluster());

        h.orchestrator.deploy(None).await.unwrap();

        let status = h.fake.position("minikube status").unwrap();
        let enable = h.fake.position("minikube addons enable").unwrap();
        let tunnel = h.fake.position("minikube tunnel").unwrap();
        let poll = h.fake.position("kubectl get pods").unwrap();
        let apply = h.fake.position("kubectl apply").unwrap();
        assert!(status < enable && enable < tunnel && tunnel < poll && poll < apply);
        assert_eq!(h.fake.count("minikube start"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_timeout_blocks_apply() {
        let fake = FakeProcess::new();
        fake.respond("minikube status", CommandResult::captured(Some(0), "Running", ""));
        fake.respond("kubectl get pods", CommandResult::captured(Some(0), NO_PODS, ""));
        let mut h = harness(fake);

        let started = Instant::now();
        let err = h.orchestrator.deploy(None).await.unwrap_err();

        assert!(matches!(err, Error::Timeout { .. }));
        assert_ne!(err.exit_code(), 0);
        assert!(applies(&h.fake).is_empty());
        assert_eq!(h.orchestrator.state(), DeploymentState::Indeterminate);
        // settle delay plus the bounded poll loop
        assert!(started.elapsed() <= std::time::Duration::from_secs(5 + 125));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cluster_start_failure_is_fatal() {
        let fake = FakeProcess::new();
        fake.respond("minikube status", CommandResult::captured(Some(7), "Stopped", ""));
        fake.fail("minikube start", 80);
        let mut h = harness(fake);

        let err = h.orchestrator.deploy(None).await.unwrap_err();
        assert_eq!(err.exit_code(), 80);
        assert_eq!(h.fake.count("minikube addons"), 0);
        assert!(applies(&h.fake).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_shutdown_survives_failures() {
        let fake = FakeProcess::ready_cluster();
        fake.fail("kubectl delete", 1);
        let mut h = harness(fake);
        h.orchestrator.deploy(None).await.unwrap();
        let tunnel_pid = h.orchestrator.tunnel.pid().unwrap();

        let report = h.orchestrator.shutdown(None, false, true).await;

        assert_eq!(report.failures().len(), 4);
        assert!(!h.orchestrator.tunnel.is_live());
        assert!(h.fake.child(tunnel_pid).unwrap().terminated);
        assert_eq!(h.fake.count("minikube addons disable ingress"), 1);
        assert_eq!(h.fake.count("minikube stop"), 1);
        assert!(h.fake.position("kubectl delete") < h.fake.position("minikube stop"));
        assert_eq!(h.orchestrator.state(), DeploymentState::Down);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_pods_ignores_target() {
        let mut h = harness(FakeProcess::ready_cluster());

        h.orchestrator
            .shutdown(Some(ServiceName::Backend), false, true)
            .await;

        assert_eq!(
            h.fake.count("kubectl delete --ignore-not-found deployments --all"),
            1
        );
        assert_eq!(h.fake.count("kubectl delete --ignore-not-found deployment campus"), 0);
        assert_eq!(h.fake.count("minikube stop"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_twice_is_harmless() {
        let mut h = harness(FakeProcess::ready_cluster());

        let first = h.orchestrator.shutdown(None, false, true).await;
        let second = h.orchestrator.shutdown(None, false, true).await;

        assert!(first.is_clean());
        assert!(second.is_clean());
        assert_eq!(h.fake.count("minikube stop"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_targeted_shutdown_keeps_cluster() {
        let mut h = harness(FakeProcess::ready_cluster());

        h.orchestrator
            .shutdown(Some(ServiceName::Frontend), false, false)
            .await;

        assert_eq!(
            h.fake.calls(),
            vec![
                "kubectl delete --ignore-not-found deployment campus-connect-frontend",
                "kubectl delete --ignore-not-found -f ./kubernetes/frontend-service.yaml",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_all() {
        let mut h = harness(FakeProcess::ready_cluster());

        h.orchestrator.restart(None, false).await.unwrap();

        let deletes = h.fake.calls_matching("kubectl delete");
        assert_eq!(deletes.len(), 4);
        assert!(deletes.iter().all(|d| d.contains("--grace-period=0 --force")));
        assert_eq!(h.fake.count("docker build"), 2);
        assert_eq!(applies(&h.fake).len(), 11);
        assert_eq!(h.fake.count("minikube stop"), 0);
        assert!(h.fake.position("kubectl delete") < h.fake.position("docker build"));
        assert!(h.fake.position("docker build") < h.fake.position("kubectl apply"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_stateful_service_skips_build() {
        let mut h = harness(FakeProcess::ready_cluster());

        h.orchestrator
            .restart(Some(ServiceName::Mongo), false)
            .await
            .unwrap();

        assert_eq!(h.fake.count("docker build"), 0);
        assert_eq!(
            applies(&h.fake),
            vec![
                "kubectl apply -f ./kubernetes/mongo-deployment.yaml",
                "kubectl apply -f ./kubernetes/mongo-service.yaml",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rebuild_rolls_out_without_deploy() {
        let mut h = harness(FakeProcess::ready_cluster());

        h.orchestrator.rebuild(None, false).await.unwrap();

        assert_eq!(h.fake.count("docker build"), 2);
        assert_eq!(
            h.fake.calls_matching("kubectl rollout"),
            vec![
                "kubectl rollout restart deployment/campus-connect-backend",
                "kubectl rollout restart deployment/campus-connect-frontend",
            ]
        );
        assert_eq!(h.fake.count("minikube"), 0);
        assert!(applies(&h.fake).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rebuild_rejects_non_buildable_target() {
        let mut h = harness(FakeProcess::ready_cluster());

        let err = h
            .orchestrator
            .rebuild(Some(ServiceName::Ingress), false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotBuildable(ServiceName::Ingress)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_logs_failure_is_not_fatal() {
        let fake = FakeProcess::new();
        fake.fail("kubectl logs", 1);
        let h = harness(fake);

        h.orchestrator.logs(ServiceName::Backend).await.unwrap();
        assert_eq!(
            h.fake.calls(),
            vec!["kubectl logs deployment/campus-connect-backend -f"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_builds() {
        let h = harness(FakeProcess::new());

        let report = h.orchestrator.clear_builds().await;
        assert!(report.is_clean());
        assert_eq!(h.fake.count("docker rmi"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status() {
        let mut h = harness(FakeProcess::ready_cluster());
        h.orchestrator.deploy(Some(ServiceName::Backend)).await.unwrap();

        let status = h.orchestrator.status().await.unwrap();
        assert!(status.cluster_running);
        assert_eq!(status.cluster, "Running");
        assert!(status.ingress_ready);
        assert_eq!(status.tunnel_pid, h.orchestrator.tunnel.pid());
        assert_eq!(status.state, DeploymentState::Up);
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_survives_into_next_invocation() {
        let mut h = harness(FakeProcess::ready_cluster());
        h.orchestrator.deploy(None).await.unwrap();

        let next = Orchestrator::new(
            h.fake.clone(),
            &Settings::default(),
            &ToolPaths::default(),
            h.dir.path(),
        );
        assert_eq!(next.state(), DeploymentState::Down);
        assert_eq!(next.status().await.unwrap().state, DeploymentState::Up);

        let mut later = Orchestrator::new(
            h.fake.clone(),
            &Settings::default(),
            &ToolPaths::default(),
            h.dir.path(),
        );
        later.shutdown(None, false, true).await;
        assert_eq!(next.status().await.unwrap().state, DeploymentState::Down);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_deploy_is_recorded_as_indeterminate() {
        let fake = FakeProcess::new();
        fake.respond("minikube status", CommandResult::captured(Some(0), "Running", ""));
        fake.fail("minikube addons enable", 1);
        let mut h = harness(fake);
        h.orchestrator.deploy(None).await.unwrap_err();

        let next = Orchestrator::new(
            h.fake.clone(),
            &Settings::default(),
            &ToolPaths::default(),
            h.dir.path(),
        );
        assert_eq!(
            next.status().await.unwrap().state,
            DeploymentState::Indeterminate
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_of_stopped_cluster() {
        let fake = FakeProcess::new();
        fake.respond("minikube status", CommandResult::captured(Some(7), "Stopped\n", ""));
        let h = harness(fake);

        let status = h.orchestrator.status().await.unwrap();
        assert!(!status.cluster_running);
        assert_eq!(status.cluster, "Stopped");
        assert!(!status.ingress_ready);
        assert_eq!(status.tunnel_pid, None);
        assert_eq!(status.state, DeploymentState::Down);
        assert_eq!(h.fake.count("kubectl"), 0);
    }
}
