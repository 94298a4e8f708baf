//! Application layer - Use case services.
//!
//! Each service owns one concern of the deployment lifecycle and talks to
//! the outside world only through the shared [`CommandRunner`]:
//! - `cluster`: local cluster status, start and stop
//! - `tunnel`: the single background tunnel process
//! - `ingress`: addon enablement and controller readiness polling
//! - `manifests`: ordered apply, best-effort delete
//! - `images`: local image builds and removal
//!
//! [`Orchestrator`] composes them into the lifecycle commands.

mod cluster;
mod command_runner;
mod images;
mod ingress;
mod manifests;
mod orchestrator;
mod tunnel;

pub use cluster::{ClusterController, ClusterStatus};
pub use command_runner::CommandRunner;
pub use images::ImageBuilder;
pub use ingress::IngressGate;
pub use manifests::ManifestApplier;
pub use orchestrator::{Orchestrator, StatusReport};
pub use tunnel::TunnelManager;
