//! Discovery of the external tools (docker, kubectl, minikube).

use std::env;
use std::path::{Path, PathBuf};

use crate::config::ToolOverrides;

/// Default paths to search for docker.
const DOCKER_PATHS: &[&str] = &[
    "/opt/homebrew/bin/docker", // Apple Silicon
    "/usr/local/bin/docker",    // Intel Mac / Homebrew
    "/usr/bin/docker",          // System
];

/// Default paths to search for kubectl.
const KUBECTL_PATHS: &[&str] = &[
    "/opt/homebrew/bin/kubectl",
    "/usr/local/bin/kubectl",
    "/usr/bin/kubectl",
];

/// Default paths to search for minikube.
const MINIKUBE_PATHS: &[&str] = &[
    "/opt/homebrew/bin/minikube",
    "/usr/local/bin/minikube",
    "/usr/bin/minikube",
];

/// Resolved locations of the external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub docker: PathBuf,
    pub kubectl: PathBuf,
    pub minikube: PathBuf,
}

impl ToolPaths {
    /// Resolves each tool from the configured override, then `PATH`, then
    /// well-known install locations.
    ///
    /// A tool that cannot be found keeps its bare name so that the spawn
    /// error names the missing program.
    pub fn discover(overrides: &ToolOverrides) -> Self {
        Self {
            docker: resolve("docker", overrides.docker.as_deref(), DOCKER_PATHS),
            kubectl: resolve("kubectl", overrides.kubectl.as_deref(), KUBECTL_PATHS),
            minikube: resolve("minikube", overrides.minikube.as_deref(), MINIKUBE_PATHS),
        }
    }
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            docker: PathBuf::from("docker"),
            kubectl: PathBuf::from("kubectl"),
            minikube: PathBuf::from("minikube"),
        }
    }
}

fn resolve(name: &str, configured: Option<&Path>, fallbacks: &[&str]) -> PathBuf {
    configured
        .map(Path::to_path_buf)
        .or_else(|| find_on_path(name))
        .or_else(|| find_executable(fallbacks))
        .unwrap_or_else(|| PathBuf::from(name))
}

/// Finds `name` in the directories listed in `PATH`.
fn find_on_path(name: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Finds an executable in the given paths.
fn find_executable(paths: &[&str]) -> Option<PathBuf> {
    paths.iter().map(PathBuf::from).find(|path| path.exists())
}
