//! Error types for the campusctl-core library.

use thiserror::Error;

use crate::domain::ServiceName;

/// Result type alias for campusctl operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving the local cluster.
#[derive(Error, Debug)]
pub enum Error {
    /// An external tool exited non-zero where success was required.
    #[error("Command failed with exit code {exit_code}: {command}")]
    CommandFailed { command: String, exit_code: i32 },

    /// A readiness condition never became true within its deadline.
    #[error("Timed out after {elapsed_secs}s waiting for ingress to become ready")]
    Timeout { elapsed_secs: u64 },

    /// A structured query response could not be parsed.
    #[error("Malformed response from {context}: {reason}")]
    MalformedResponse { context: String, reason: String },

    /// Failed to launch an external tool.
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A tunnel is already owned by this process.
    #[error("Tunnel process is already running (pid {0:?})")]
    TunnelAlreadyRunning(Option<u32>),

    /// Failed to signal a background process.
    #[error("Failed to kill process {pid}: {reason}")]
    KillFailed { pid: u32, reason: String },

    /// The service has no locally built image.
    #[error("Service '{0}' is not buildable")]
    NotBuildable(ServiceName),

    /// The name does not match any known service.
    #[error("Unknown service: {0}")]
    UnknownService(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Process exit code the CLI should report for this error.
    ///
    /// A failed external command propagates its own exit code when it fits
    /// a process status; everything else maps to `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::CommandFailed { exit_code, .. } if (1..=255).contains(exit_code) => *exit_code,
            _ => 1,
        }
    }
}
