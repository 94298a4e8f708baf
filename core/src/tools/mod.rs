//! Typed command builders for the external tools.
//!
//! One builder per collaborator:
//! - `docker`: image build and removal
//! - `kubectl`: manifest apply/delete, rollouts, pod queries, logs
//! - `minikube`: cluster status/start/stop, addons, tunnel
//!
//! Builders only construct [`CommandSpec`](crate::domain::CommandSpec)s;
//! running them is the job of the command runner.

pub mod docker;
pub mod kubectl;
pub mod minikube;
pub mod models;

pub use docker::Docker;
pub use kubectl::Kubectl;
pub use minikube::Minikube;
pub use models::PodListResponse;
