//! Configuration management.
//!
//! Stores settings in JSON format at `~/.campusctl/config.json`. Every field
//! has a default, so a missing file or a partial file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};

/// Name of the directory under the home directory holding config and state.
const CONFIG_DIR_NAME: &str = ".campusctl";

/// Settings for one project checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Directory containing the Dockerfiles and the build context.
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,

    /// Manifest directory, relative to the project root unless absolute.
    #[serde(default = "default_manifests_dir")]
    pub manifests_dir: PathBuf,

    /// Prefix of image and deployment names (e.g., "campus-connect").
    #[serde(default = "default_image_prefix")]
    pub image_prefix: String,

    /// Tag given to locally built images.
    #[serde(default = "default_image_tag")]
    pub image_tag: String,

    /// minikube driver used when starting the cluster.
    #[serde(default = "default_cluster_driver")]
    pub cluster_driver: String,

    #[serde(default)]
    pub ingress: IngressSettings,

    /// Seconds a terminated tunnel is given to exit before it is killed.
    #[serde(default = "default_tunnel_grace")]
    pub tunnel_grace_secs: u64,

    #[serde(default)]
    pub tools: ToolOverrides,
}

/// Ingress addon and readiness polling settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressSettings {
    #[serde(default = "default_addon")]
    pub addon: String,

    /// Namespace of the ingress controller pods.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Label selector of the ingress controller pods.
    #[serde(default = "default_selector")]
    pub selector: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Fixed delay after starting the tunnel and after readiness.
    #[serde(default = "default_settle")]
    pub settle_secs: u64,
}

/// Explicit tool locations; unset tools are discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubectl: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minikube: Option<PathBuf>,
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_manifests_dir() -> PathBuf {
    PathBuf::from("kubernetes")
}

fn default_image_prefix() -> String {
    "campus-connect".to_string()
}

fn default_image_tag() -> String {
    "latest".to_string()
}

fn default_cluster_driver() -> String {
    "docker".to_string()
}

fn default_tunnel_grace() -> u64 {
    10
}

fn default_addon() -> String {
    "ingress".to_string()
}

fn default_namespace() -> String {
    "ingress-nginx".to_string()
}

fn default_selector() -> String {
    "app.kubernetes.io/component=controller".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_poll_interval() -> u64 {
    5
}

fn default_settle() -> u64 {
    5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            manifests_dir: default_manifests_dir(),
            image_prefix: default_image_prefix(),
            image_tag: default_image_tag(),
            cluster_driver: default_cluster_driver(),
            ingress: IngressSettings::default(),
            tunnel_grace_secs: default_tunnel_grace(),
            tools: ToolOverrides::default(),
        }
    }
}

impl Default for IngressSettings {
    fn default() -> Self {
        Self {
            addon: default_addon(),
            namespace: default_namespace(),
            selector: default_selector(),
            timeout_secs: default_timeout(),
            poll_interval_secs: default_poll_interval(),
            settle_secs: default_settle(),
        }
    }
}

impl Settings {
    /// Manifest directory resolved against the project root.
    pub fn manifests_path(&self) -> PathBuf {
        if self.manifests_dir.is_absolute() {
            self.manifests_dir.clone()
        } else {
            self.project_root.join(&self.manifests_dir)
        }
    }

    pub fn tunnel_grace(&self) -> Duration {
        Duration::from_secs(self.tunnel_grace_secs)
    }

    /// Checks values that serde cannot reject on its own.
    pub fn validate(&self) -> Result<()> {
        if self.image_prefix.trim().is_empty() {
            return Err(Error::Config("imagePrefix must not be empty".to_string()));
        }
        if self.ingress.poll_interval_secs == 0 {
            return Err(Error::Config(
                "ingress.pollIntervalSecs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl IngressSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }
}

/// Configuration store for reading and writing [`Settings`].
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    ///
    /// Default path: `~/.campusctl/config.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        Ok(Self {
            config_path: home.join(CONFIG_DIR_NAME).join("config.json"),
        })
    }

    /// Create a config store with a custom path.
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Directory holding the config file and runtime state.
    pub fn state_dir(&self) -> PathBuf {
        self.config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Load settings from disk.
    ///
    /// Returns default settings if the file doesn't exist.
    pub async fn load(&self) -> Result<Settings> {
        if !self.config_path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        let settings: Settings = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        settings.validate()?;

        Ok(settings)
    }

    /// Save settings to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub async fn save(&self, settings: &Settings) -> Result<()> {
        let config_dir = self.state_dir();
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .await
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        // Write atomically by writing to temp file then renaming
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to create temp config file: {}", e)))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        file.sync_all()
            .await
            .map_err(|e| Error::Config(format!("Failed to sync config: {}", e)))?;

        fs::rename(&temp_path, &self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to rename config file: {}", e)))?;

        Ok(())
    }
}
