//! Subcommand implementations.

pub mod config;
pub mod images;
pub mod lifecycle;
pub mod logs;
pub mod status;

use std::path::PathBuf;

use anyhow::Result;
use campusctl_core::{ConfigStore, Orchestrator, Settings, SystemProcess, TeardownReport, ToolPaths};

/// Shared state of one invocation: loaded settings and output mode.
pub struct Context {
    pub store: ConfigStore,
    pub settings: Settings,
    pub json: bool,
}

/// Config store at `config_path`, or at the default location.
pub fn open_store(config_path: Option<PathBuf>) -> Result<ConfigStore> {
    Ok(match config_path {
        Some(path) => ConfigStore::with_path(path),
        None => ConfigStore::new()?,
    })
}

impl Context {
    /// Opens the store and loads validated settings from it.
    pub async fn load(config_path: Option<PathBuf>, json: bool) -> Result<Self> {
        let store = open_store(config_path)?;
        let settings = store.load().await?;

        Ok(Self {
            store,
            settings,
            json,
        })
    }

    /// Orchestrator over real processes and the discovered tools.
    pub fn orchestrator(&self) -> Orchestrator<SystemProcess> {
        let tools = ToolPaths::discover(&self.settings.tools);
        tracing::debug!(?tools, "Resolved tools");

        Orchestrator::new(
            SystemProcess::new(),
            &self.settings,
            &tools,
            &self.store.state_dir(),
        )
    }
}

/// Prints what a best-effort sequence could not do.
pub fn print_report(action: &str, report: &TeardownReport) {
    if report.is_clean() {
        println!("{action} complete.");
        return;
    }

    println!(
        "{action} finished with {} failed step(s):",
        report.failures().len()
    );
    for failure in report.failures() {
        println!("  - {}: {}", failure.step, failure.error);
    }
}
