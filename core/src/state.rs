//! Runtime state kept between invocations.
//!
//! Each CLI run is a fresh process, so whatever a later run needs to know
//! about an earlier one lives in small JSON records next to the config file:
//! - `tunnel.json`: the background tunnel, so a later `shutdown --all-pods`
//!   can terminate a tunnel started by `deploy`
//! - `deployment.json`: the macro state left by the last lifecycle command

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::fs;
use uuid::Uuid;

use crate::domain::DeploymentState;
use crate::error::Result;

pub const TUNNEL_RECORD_FILE: &str = "tunnel.json";
pub const DEPLOYMENT_RECORD_FILE: &str = "deployment.json";

/// The tunnel started by some invocation of this tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TunnelRecord {
    pub pid: u32,
    /// Run id of the invocation that started the tunnel.
    pub run_id: Uuid,
}

/// Outcome of the last `deploy` or `shutdown`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub state: DeploymentState,
    /// Run id of the invocation that reached this state.
    pub run_id: Uuid,
}

pub type TunnelRecordStore = RecordStore<TunnelRecord>;
pub type DeploymentRecordStore = RecordStore<DeploymentRecord>;

/// Reads and writes one JSON record file.
#[derive(Debug, Clone)]
pub struct RecordStore<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> RecordStore<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _record: PhantomData,
        }
    }

    /// Store for `file` inside the state directory.
    pub fn in_dir(state_dir: &Path, file: &str) -> Self {
        Self::new(state_dir.join(file))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the record, if any.
    ///
    /// An unreadable record is treated as absent.
    pub async fn load(&self) -> Option<T> {
        let content = fs::read_to_string(&self.path).await.ok()?;
        serde_json::from_str(&content).ok()
    }

    pub async fn save(&self, record: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, serde_json::to_vec(record)?).await?;
        Ok(())
    }

    /// Removes the record; a missing file is not an error.
    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
