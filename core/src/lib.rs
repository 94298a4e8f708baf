//! campusctl Core Library
//!
//! Drives the local deployment lifecycle of the campus-connect application
//! through the external `docker`, `kubectl` and `minikube` tools:
//! - Build and remove the locally built service images
//! - Start and stop the single-node cluster
//! - Enable ingress, run the tunnel and wait for the controller to be ready
//! - Apply and delete the fixed manifest set, in full or per service
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure models for services, manifests and invocations
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: Child-process and tool discovery implementations
//! - `tools`: Typed command builders per external tool
//! - `application`: Use case services and the orchestrator
//!
//! Bring-up failures propagate as [`Error`]; teardown failures are collected
//! in a [`TeardownReport`] so the teardown always runs to the end.

// Hexagonal architecture layers
pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod config;
pub mod error;
pub mod state;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;

// Re-export domain types (primary API)
pub use domain::{
    CommandResult, CommandSpec, DeploymentState, ManifestSet, ServiceName, TeardownReport,
};

// Re-export other commonly used types
pub use adapters::{SystemProcess, ToolPaths};
pub use application::{Orchestrator, StatusReport};
pub use config::{ConfigStore, Settings};
pub use error::{Error, Result};
