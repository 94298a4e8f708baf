//! Manifest set resolution.

use std::path::{Path, PathBuf};

use super::service::{ServiceKind, ServiceName};

/// Full manifest sequence in apply order (config first, dependents after).
const FULL_ORDER: &[&str] = &[
    "configmap.yaml",
    "backend-deployment.yaml",
    "backend-service.yaml",
    "frontend-deployment.yaml",
    "frontend-service.yaml",
    "ingress.yaml",
    "mongo-deployment.yaml",
    "mongo-service.yaml",
    "redis-deployment.yaml",
    "redis-service.yaml",
    "mongo-pvc.yaml",
];

/// An ordered sequence of manifest files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSet {
    files: Vec<PathBuf>,
}

impl ManifestSet {
    /// Every manifest of the application, in dependency order.
    pub fn full(dir: &Path) -> Self {
        Self {
            files: FULL_ORDER.iter().map(|name| dir.join(name)).collect(),
        }
    }

    /// The manifests belonging to a single service.
    ///
    /// Services with a deployment contribute their deployment and service
    /// manifests; infrastructure resources contribute their own file.
    pub fn for_service(dir: &Path, service: ServiceName) -> Self {
        let files = match service.kind() {
            ServiceKind::Buildable | ServiceKind::Stateful => vec![
                dir.join(format!("{}-deployment.yaml", service)),
                dir.join(format!("{}-service.yaml", service)),
            ],
            ServiceKind::Infrastructure => vec![dir.join(format!("{}.yaml", service))],
        };
        Self { files }
    }

    /// Resolves an optional target to its manifest set.
    pub fn resolve(dir: &Path, target: Option<ServiceName>) -> Self {
        match target {
            Some(service) => Self::for_service(dir, service),
            None => Self::full(dir),
        }
    }

    /// The resource file that must be deleted when a single service is shut down.
    ///
    /// This is the service manifest for deployed services and the resource
    /// itself for infrastructure.
    pub fn service_resource(dir: &Path, service: ServiceName) -> PathBuf {
        match service.kind() {
            ServiceKind::Infrastructure => dir.join(format!("{}.yaml", service)),
            _ => dir.join(format!("{}-service.yaml", service)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(PathBuf::as_path)
    }
}
