//! Error types for the container runtime adapter.

use std::path::PathBuf;

/// Result type alias for runtime adapter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while launching or signalling containers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // =========================================================================
    // Input Errors
    // =========================================================================
    /// A required value is missing from the container's launch environment.
    ///
    /// Raised before any external process is spawned.
    #[error("{variable} not set!")]
    MissingConfiguration { variable: String },

    /// A required launch/signal context attribute was not supplied.
    #[error("invalid container context: missing required attribute '{field}'")]
    InvalidContext { field: &'static str },

    /// Container ID failed validation.
    #[error("invalid container ID '{id}': {reason}")]
    InvalidContainerId { id: String, reason: String },

    // =========================================================================
    // Privileged Helper Errors
    // =========================================================================
    /// The helper ran but reported a failed container launch.
    ///
    /// `exit_code`, `stdout` and `stderr` are the helper's values, unmodified.
    #[error("Launch container failed for '{container_id}' (exit code {exit_code})")]
    LaunchFailed {
        container_id: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    /// The helper ran but reported a failed signal delivery.
    #[error("Signal container failed for pid {pid} (exit code {exit_code})")]
    SignalFailed {
        pid: u32,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    /// The helper process could not be spawned at all.
    #[error("failed to dispatch privileged operation '{operation}': {reason}")]
    DispatchFailure { operation: String, reason: String },

    // =========================================================================
    // Collaborator Errors
    // =========================================================================
    /// The resource-isolation subsystem could not resolve a group path.
    #[error("resource isolation failed for container '{container_id}': {reason}")]
    ResourceIsolationFailure { container_id: String, reason: String },

    /// Writing the engine command file failed.
    #[error("failed to write engine command file in {path}: {reason}")]
    CommandFile { path: PathBuf, reason: String },

    /// Runtime configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Returns the helper's exit code for launch/signal failures.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::LaunchFailed { exit_code, .. } | Self::SignalFailed { exit_code, .. } => {
                Some(*exit_code)
            }
            _ => None,
        }
    }

    /// Returns the helper's captured stdout for launch/signal failures.
    pub fn stdout(&self) -> Option<&str> {
        match self {
            Self::LaunchFailed { stdout, .. } | Self::SignalFailed { stdout, .. } => Some(stdout),
            _ => None,
        }
    }

    /// Returns the helper's captured stderr for launch/signal failures.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::LaunchFailed { stderr, .. } | Self::SignalFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}
