//! `kubectl` command builder.

use std::path::{Path, PathBuf};

use crate::domain::CommandSpec;

/// Flags turning a delete into an immediate, forced termination.
const FORCE_FLAGS: [&str; 2] = ["--grace-period=0", "--force"];

/// Builds invocations of the cluster CLI.
///
/// Every delete passes `--ignore-not-found` so tearing down an absent
/// resource succeeds.
#[derive(Debug, Clone)]
pub struct Kubectl {
    program: PathBuf,
}

impl Kubectl {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self) -> CommandSpec {
        CommandSpec::new(self.program.to_string_lossy())
    }

    fn delete(&self, force: bool) -> CommandSpec {
        let cmd = self.command().arg("delete");
        let cmd = if force { cmd.args(FORCE_FLAGS) } else { cmd };
        cmd.arg("--ignore-not-found")
    }

    /// `kubectl apply -f <manifest>`
    pub fn apply(&self, manifest: &Path) -> CommandSpec {
        self.command().args(["apply", "-f"]).path_arg(manifest)
    }

    /// `kubectl delete -f <manifest>`
    pub fn delete_file(&self, manifest: &Path, force: bool) -> CommandSpec {
        self.delete(force).arg("-f").path_arg(manifest)
    }

    /// `kubectl delete <kind> --all`
    pub fn delete_all(&self, kind: &str, force: bool) -> CommandSpec {
        self.delete(force).args([kind, "--all"])
    }

    /// `kubectl delete <kind> <name>`
    pub fn delete_named(&self, kind: &str, name: &str, force: bool) -> CommandSpec {
        self.delete(force).args([kind, name])
    }

    /// `kubectl delete <kind> -l <selector>`
    pub fn delete_labelled(&self, kind: &str, selector: &str, force: bool) -> CommandSpec {
        self.delete(force).args([kind, "-l", selector])
    }

    /// `kubectl rollout restart deployment/<name>`
    pub fn rollout_restart(&self, deployment: &str) -> CommandSpec {
        self.command()
            .args(["rollout", "restart"])
            .arg(format!("deployment/{}", deployment))
    }

    /// `kubectl get pods -n <namespace> -l <selector> -o json`
    pub fn get_pods_json(&self, namespace: &str, selector: &str) -> CommandSpec {
        self.command()
            .args(["get", "pods", "-n", namespace, "-l", selector, "-o", "json"])
            .arg("--request-timeout=10s")
    }

    /// `kubectl logs deployment/<name> -f`
    pub fn logs_follow(&self, deployment: &str) -> CommandSpec {
        self.command()
            .arg("logs")
            .arg(format!("deployment/{}", deployment))
            .arg("-f")
    }
}
