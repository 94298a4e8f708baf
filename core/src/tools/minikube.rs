//! `minikube` command builder.

use std::path::PathBuf;

use crate::domain::CommandSpec;

/// Builds invocations of the local-cluster control plane.
#[derive(Debug, Clone)]
pub struct Minikube {
    program: PathBuf,
}

impl Minikube {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self) -> CommandSpec {
        CommandSpec::new(self.program.to_string_lossy())
    }

    /// `minikube status --format={{.Host}}`, prints e.g. "Running" or "Stopped".
    pub fn status(&self) -> CommandSpec {
        self.command().args(["status", "--format={{.Host}}"])
    }

    /// `minikube start --driver=<driver>`
    pub fn start(&self, driver: &str) -> CommandSpec {
        self.command()
            .arg("start")
            .arg(format!("--driver={}", driver))
    }

    pub fn stop(&self) -> CommandSpec {
        self.command().arg("stop")
    }

    pub fn addon_enable(&self, addon: &str) -> CommandSpec {
        self.command().args(["addons", "enable", addon])
    }

    pub fn addon_disable(&self, addon: &str) -> CommandSpec {
        self.command().args(["addons", "disable", addon])
    }

    /// `minikube tunnel`, long-lived.
    pub fn tunnel(&self) -> CommandSpec {
        self.command().arg("tunnel")
    }
}
