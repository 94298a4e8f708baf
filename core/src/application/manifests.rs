//! Manifest applier and remover.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use super::command_runner::CommandRunner;
use crate::domain::{CommandSpec, ManifestSet, RunOptions, ServiceKind, ServiceName, TeardownReport};
use crate::error::Result;
use crate::ports::ProcessPort;
use crate::tools::Kubectl;

/// Resource kinds cleared by a full teardown, in order.
const TEARDOWN_KINDS: [&str; 3] = ["deployments", "pods", "services"];

/// Applies and deletes the fixed manifest set.
pub struct ManifestApplier<P: ProcessPort> {
    runner: Arc<CommandRunner<P>>,
    kubectl: Kubectl,
    manifests_dir: PathBuf,
    image_prefix: String,
}

impl<P: ProcessPort> ManifestApplier<P> {
    pub fn new(
        runner: Arc<CommandRunner<P>>,
        kubectl: Kubectl,
        manifests_dir: PathBuf,
        image_prefix: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            kubectl,
            manifests_dir,
            image_prefix: image_prefix.into(),
        }
    }

    /// Applies the manifests of `target` (every manifest for `None`) in
    /// order. The first failure aborts the sequence.
    pub async fn apply(&self, target: Option<ServiceName>) -> Result<()> {
        let set = ManifestSet::resolve(&self.manifests_dir, target);
        info!(count = set.iter().count(), "Applying manifests");

        for manifest in set.iter() {
            info!(manifest = %manifest.display(), "Applying");
            self.runner
                .run(&self.kubectl.apply(manifest), RunOptions::checked())
                .await?;
        }
        Ok(())
    }

    /// Deletes the resources of `target` (everything for `None`).
    ///
    /// Best-effort: each failed delete is recorded and the rest still run.
    pub async fn remove(&self, target: Option<ServiceName>, force: bool) -> TeardownReport {
        let steps = match target {
            None => self.full_teardown(force),
            Some(service) => self.service_teardown(service, force),
        };

        let mut report = TeardownReport::new();
        for step in steps {
            report.record(
                step.to_string(),
                self.runner.run(&step, RunOptions::checked()).await,
            );
        }

        if !report.is_clean() {
            warn!(
                failed = report.failures().len(),
                "Some resources could not be deleted"
            );
        }
        report
    }

    fn full_teardown(&self, force: bool) -> Vec<CommandSpec> {
        info!(force, "Deleting all resources");
        let mut steps: Vec<CommandSpec> = TEARDOWN_KINDS
            .iter()
            .map(|kind| self.kubectl.delete_all(kind, force))
            .collect();
        steps.push(self.kubectl.delete_file(
            &ManifestSet::service_resource(&self.manifests_dir, ServiceName::Ingress),
            force,
        ));
        steps
    }

    fn service_teardown(&self, service: ServiceName, force: bool) -> Vec<CommandSpec> {
        info!(service = %service, force, "Deleting service resources");
        let mut steps = Vec::new();

        if service.has_deployment() {
            steps.push(self.kubectl.delete_named(
                "deployment",
                &service.deployment_name(&self.image_prefix),
                force,
            ));
        }

        // Stateful pods can outlive their deployment record.
        if service.kind() == ServiceKind::Stateful {
            let selector = service.label_selector();
            steps.push(self.kubectl.delete_labelled("deployments", &selector, force));
            steps.push(self.kubectl.delete_labelled("pods", &selector, force));
        }

        steps.push(self.kubectl.delete_file(
            &ManifestSet::service_resource(&self.manifests_dir, service),
            force,
        ));
        steps
    }
}
