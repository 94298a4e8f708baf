//! `docker` command builder.

use std::path::{Path, PathBuf};

use crate::domain::CommandSpec;

/// Builds invocations of the container build tool.
#[derive(Debug, Clone)]
pub struct Docker {
    program: PathBuf,
}

impl Docker {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self) -> CommandSpec {
        CommandSpec::new(self.program.to_string_lossy())
    }

    /// `docker build [--no-cache] -f <dockerfile> -t <tag> <context>`
    pub fn build(&self, dockerfile: &Path, tag: &str, context: &Path, no_cache: bool) -> CommandSpec {
        self.command()
            .arg("build")
            .arg_if(no_cache, "--no-cache")
            .arg("-f")
            .path_arg(dockerfile)
            .args(["-t", tag])
            .path_arg(context)
    }

    /// `docker rmi <tag>`
    pub fn remove_image(&self, tag: &str) -> CommandSpec {
        self.command().args(["rmi", tag])
    }
}
