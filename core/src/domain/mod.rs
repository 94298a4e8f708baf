//! Domain layer - Pure models for services, manifests and invocations.
//!
//! These types have no I/O dependencies and can be tested in isolation.

mod command;
mod deployment;
mod manifest;
mod outcome;
mod readiness;
mod service;

// Re-export all domain types
pub use command::{CommandResult, CommandSpec, RunOptions};
pub use deployment::DeploymentState;
pub use manifest::ManifestSet;
pub use outcome::{StepFailure, TeardownReport};
pub use readiness::ReadinessDeadline;
pub use service::{buildable_targets, ServiceKind, ServiceName};
