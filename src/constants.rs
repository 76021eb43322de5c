//! # Runtime Adapter Constants
//!
//! Environment variable names, privileged helper protocol values, and input
//! validation bounds. These constants are the single source of truth for
//! values shared with the privileged helper binary and with the node manager
//! that populates the container launch environment.
//!
//! ## Helper Protocol Compatibility
//!
//! The separator, sentinel and operation codes below are compiled into the
//! helper binary. Changing any of them requires a matching helper release.
//!
//! ## Cross-References
//!
//! - [`crate::privileged`]: Uses operation codes and the path separator
//! - [`crate::isolation`]: Uses the cgroup sentinel
//! - [`crate::runtimes::docker`]: Uses the environment variable names

// =============================================================================
// Container Launch Environment
// =============================================================================
//
// Variables read from the launch environment the application submitted with
// the container request.
// =============================================================================

/// Selects the container runtime. `docker` routes the request to this adapter.
pub const ENV_CONTAINER_TYPE: &str = "YARN_CONTAINER_RUNTIME_TYPE";

/// Value of [`ENV_CONTAINER_TYPE`] that requests a Docker container.
pub const CONTAINER_TYPE_DOCKER: &str = "docker";

/// Docker image reference to run. Required.
pub const ENV_DOCKER_CONTAINER_IMAGE: &str = "YARN_CONTAINER_RUNTIME_DOCKER_IMAGE";

/// Path to an image tarball. Declared for compatibility; not read by the
/// launch path.
pub const ENV_DOCKER_CONTAINER_IMAGE_FILE: &str = "YARN_CONTAINER_RUNTIME_DOCKER_IMAGE_FILE";

/// When set to `"true"`, the image's own entrypoint/command is used instead
/// of the node manager launch script.
pub const ENV_DOCKER_CONTAINER_RUN_OVERRIDE_DISABLE: &str =
    "YARN_CONTAINER_RUNTIME_DOCKER_RUN_OVERRIDE_DISABLE";

// =============================================================================
// Docker Run Defaults
// =============================================================================

/// Network mode for every launched container.
pub const DOCKER_NETWORK_HOST: &str = "host";

/// Host user database, bind-mounted read-only into every container.
pub const USER_DATABASE_SOURCE: &str = "/etc/passwd";

/// Mount target (with mode suffix) for [`USER_DATABASE_SOURCE`].
pub const USER_DATABASE_TARGET: &str = "/etc/password:ro";

/// Launch script written by the node manager into the container work dir.
pub const CONTAINER_SCRIPT: &str = "launch_container.sh";

/// Interpreter used to run [`CONTAINER_SCRIPT`] when the command is overridden.
pub const CONTAINER_SCRIPT_INTERPRETER: &str = "bash";

// =============================================================================
// Privileged Helper Protocol
// =============================================================================

/// Joins directory lists into a single positional helper argument.
pub const LINUX_FILE_PATH_SEPARATOR: &str = "%";

/// Prefix of the resources options string for cgroup task placement.
pub const CGROUP_ARG_PREFIX: &str = "cgroups=";

/// Resources options value meaning "no cgroup tasks": no isolation requested.
pub const CGROUP_ARG_NO_TASKS: &str = "none";

/// Default helper binary location, relative to the YARN home directory.
pub const DEFAULT_CONTAINER_EXECUTOR_PATH: &str = "bin/container-executor";

/// Default cgroup hierarchy under which container groups are created.
pub const DEFAULT_CGROUP_HIERARCHY: &str = "hadoop-yarn";

/// Subdirectory of the temp dir holding serialized docker commands.
pub const DOCKER_COMMAND_DIR: &str = "nm-docker-cmds";

/// File name prefix for serialized docker commands.
pub const DOCKER_COMMAND_FILE_PREFIX: &str = "docker.";

/// File name suffix for serialized docker commands.
pub const DOCKER_COMMAND_FILE_SUFFIX: &str = ".cmd";

/// Returns the resources options value that means "no isolation requested".
pub fn cgroup_no_tasks_sentinel() -> String {
    format!("{}{}", CGROUP_ARG_PREFIX, CGROUP_ARG_NO_TASKS)
}

// =============================================================================
// Validation Patterns
// =============================================================================

/// Valid characters for container IDs.
///
/// Includes: `a-z`, `A-Z`, `0-9`, `-`, `_`
///
/// **Security**: Container IDs become file names and cgroup path components;
/// `/` and `.` are excluded to rule out path traversal.
pub const CONTAINER_NAME_VALID_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-_";

/// Maximum container ID length.
pub const MAX_CONTAINER_ID_LEN: usize = 128;

// =============================================================================
// Container ID Validation Helper
// =============================================================================

/// Validates a container ID for safety.
///
/// # Returns
///
/// `Ok(())` if valid, `Err(reason)` with a description of the failure.
#[inline]
#[must_use = "validation result must be checked to ensure container ID is safe"]
pub fn validate_container_id(id: &str) -> std::result::Result<(), &'static str> {
    if id.is_empty() {
        return Err("container ID cannot be empty");
    }
    if id.len() > MAX_CONTAINER_ID_LEN {
        return Err("container ID exceeds maximum length");
    }
    if !id.chars().all(|c| CONTAINER_NAME_VALID_CHARS.contains(c)) {
        return Err("container ID contains invalid characters");
    }
    Ok(())
}
