//! Image builder for the locally built services.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use super::command_runner::CommandRunner;
use crate::domain::{buildable_targets, RunOptions, ServiceName, TeardownReport};
use crate::error::Result;
use crate::ports::ProcessPort;
use crate::tools::Docker;

pub struct ImageBuilder<P: ProcessPort> {
    runner: Arc<CommandRunner<P>>,
    docker: Docker,
    /// Build context; holds `Dockerfile.<service>`.
    project_root: PathBuf,
    image_prefix: String,
    image_tag: String,
}

impl<P: ProcessPort> ImageBuilder<P> {
    pub fn new(
        runner: Arc<CommandRunner<P>>,
        docker: Docker,
        project_root: PathBuf,
        image_prefix: impl Into<String>,
        image_tag: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            docker,
            project_root,
            image_prefix: image_prefix.into(),
            image_tag: image_tag.into(),
        }
    }

    /// Local image reference, e.g. `campus-connect-backend:latest`.
    pub fn image_tag(&self, service: ServiceName) -> String {
        format!(
            "{}:{}",
            service.deployment_name(&self.image_prefix),
            self.image_tag
        )
    }

    pub fn dockerfile(&self, service: ServiceName) -> PathBuf {
        self.project_root.join(format!("Dockerfile.{}", service))
    }

    /// Builds the image of one service. Services without a local image are
    /// skipped.
    pub async fn build(&self, service: ServiceName, no_cache: bool) -> Result<()> {
        if !service.is_buildable() {
            info!(service = %service, "No local image to build");
            return Ok(());
        }

        let tag = self.image_tag(service);
        info!(service = %service, image = %tag, no_cache, "Building image");
        let command = self.docker.build(
            &self.dockerfile(service),
            &tag,
            &self.project_root,
            no_cache,
        );
        self.runner.run(&command, RunOptions::checked()).await?;
        Ok(())
    }

    /// Builds the images selected by `target`: every buildable service for
    /// `None`, otherwise the target alone when it is buildable.
    pub async fn build_targets(&self, target: Option<ServiceName>, no_cache: bool) -> Result<()> {
        for service in buildable_targets(target) {
            self.build(service, no_cache).await?;
        }
        Ok(())
    }

    /// Removes every locally built image, continuing past failures.
    pub async fn remove_images(&self) -> TeardownReport {
        let mut report = TeardownReport::new();
        for service in ServiceName::BUILDABLE {
            let tag = self.image_tag(service);
            info!(image = %tag, "Removing image");
            report.record(
                format!("remove image {}", tag),
                self.runner
                    .run(&self.docker.remove_image(&tag), RunOptions::checked())
                    .await,
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeProcess;

    fn builder(fake: &FakeProcess) -> ImageBuilder<FakeProcess> {
        ImageBuilder::new(
            Arc::new(CommandRunner::new(fake.clone())),
            Docker::new("docker"),
            PathBuf::from("."),
            "campus-connect",
            "latest",
        )
    }

    #[tokio::test]
    async fn test_build_single_service() {
        let fake = FakeProcess::new();
        builder(&fake).build(ServiceName::Backend, false).await.unwrap();

        assert_eq!(
            fake.calls(),
            vec!["docker build -f ./Dockerfile.backend -t campus-connect-backend:latest ."]
        );
    }

    #[tokio::test]
    async fn test_build_all_without_cache() {
        let fake = FakeProcess::new();
        builder(&fake).build_targets(None, true).await.unwrap();

        assert_eq!(
            fake.calls(),
            vec![
                "docker build --no-cache -f ./Dockerfile.backend -t campus-connect-backend:latest .",
                "docker build --no-cache -f ./Dockerfile.frontend -t campus-connect-frontend:latest .",
            ]
        );
    }

    #[tokio::test]
    async fn test_non_buildable_target_builds_nothing() {
        let fake = FakeProcess::new();
        builder(&fake)
            .build_targets(Some(ServiceName::Mongo), false)
            .await
            .unwrap();
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_build_failure_stops_remaining_builds() {
        let fake = FakeProcess::new();
        fake.fail("docker build -f ./Dockerfile.backend", 125);

        let err = builder(&fake).build_targets(None, false).await.unwrap_err();
        assert_eq!(err.exit_code(), 125);
        assert_eq!(fake.count("docker build"), 1);
    }

    #[tokio::test]
    async fn test_remove_images_is_best_effort() {
        let fake = FakeProcess::new();
        fake.fail("docker rmi campus-connect-backend", 1);

        let report = builder(&fake).remove_images().await;

        assert_eq!(
            fake.calls(),
            vec![
                "docker rmi campus-connect-backend:latest",
                "docker rmi campus-connect-frontend:latest",
            ]
        );
        assert_eq!(report.failures().len(), 1);
    }
}
