//! Service name domain model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// How a service is handled by the lifecycle commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    /// Image is built locally before deployment.
    Buildable,
    /// Deployment is managed, image is pulled (databases, caches).
    Stateful,
    /// Cluster resource without a deployment of its own.
    Infrastructure,
}

/// One of the fixed services and resources of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceName {
    Backend,
    Frontend,
    Mongo,
    Redis,
    MongoPvc,
    Ingress,
}

impl ServiceName {
    /// Services whose images this tool builds.
    pub const BUILDABLE: [ServiceName; 2] = [ServiceName::Backend, ServiceName::Frontend];

    /// Every name accepted by shutdown, restart and logs.
    pub const ALL: [ServiceName; 6] = [
        ServiceName::Backend,
        ServiceName::Frontend,
        ServiceName::Mongo,
        ServiceName::Redis,
        ServiceName::MongoPvc,
        ServiceName::Ingress,
    ];

    /// Returns the kebab-case name used on the command line and in manifest files.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceName::Backend => "backend",
            ServiceName::Frontend => "frontend",
            ServiceName::Mongo => "mongo",
            ServiceName::Redis => "redis",
            ServiceName::MongoPvc => "mongo-pvc",
            ServiceName::Ingress => "ingress",
        }
    }

    pub fn kind(&self) -> ServiceKind {
        match self {
            ServiceName::Backend | ServiceName::Frontend => ServiceKind::Buildable,
            ServiceName::Mongo | ServiceName::Redis => ServiceKind::Stateful,
            ServiceName::MongoPvc | ServiceName::Ingress => ServiceKind::Infrastructure,
        }
    }

    pub fn is_buildable(&self) -> bool {
        self.kind() == ServiceKind::Buildable
    }

    /// Returns true if the service runs as a deployment in the cluster.
    pub fn has_deployment(&self) -> bool {
        self.kind() != ServiceKind::Infrastructure
    }

    /// Deployment name in the cluster (e.g., "campus-connect-backend").
    pub fn deployment_name(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.as_str())
    }

    /// Label selector matching the pods of a stateful service.
    pub fn label_selector(&self) -> String {
        format!("app={}", self.as_str())
    }
}

/// Resolves an optional build target to the services whose images get built.
///
/// `None` means every buildable service; a non-buildable target yields nothing.
pub fn buildable_targets(target: Option<ServiceName>) -> Vec<ServiceName> {
    match target {
        None => ServiceName::BUILDABLE.to_vec(),
        Some(service) if service.is_buildable() => vec![service],
        Some(_) => Vec::new(),
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        ServiceName::ALL
            .into_iter()
            .find(|service| service.as_str() == name)
            .ok_or_else(|| Error::UnknownService(s.to_string()))
    }
}
