//! Macro state of the deployed application.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the application stands after the last lifecycle command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentState {
    #[default]
    Down,
    Up,
    /// A deploy failed partway; nothing was rolled back.
    Indeterminate,
}

impl fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentState::Down => f.write_str("down"),
            DeploymentState::Up => f.write_str("up"),
            DeploymentState::Indeterminate => f.write_str("indeterminate"),
        }
    }
}
