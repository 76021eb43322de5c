//! Typed launch and signal contexts.
//!
//! The node manager hands the runtime a set of execution attributes per call.
//! These are captured in [`LaunchContext`] and [`SignalContext`], which can
//! only be obtained through their builders (or serde, which routes through
//! the builders). A context that exists is therefore complete: every required
//! attribute is present and the container ID is well formed.
//!
//! ```rust,ignore
//! let ctx = LaunchContext::builder()
//!     .run_as_user("nobody")
//!     .user("alice")
//!     .app_id("application_1410901177871_0001")
//!     .container_id("container_1410901177871_0001_01_000005")
//!     .container_work_dir("/grid/0/nm/usercache/alice/appcache/app/container")
//!     .local_dirs(["/grid/0/nm", "/grid/1/nm"])
//!     .log_dirs(["/grid/0/logs"])
//!     .resources_options("cgroups=none")
//!     .container_script_path("/nm-private/launch_container.sh")
//!     .token_path("/nm-private/container_tokens")
//!     .pid_file_path("/nm-private/container.pid")
//!     .env("YARN_CONTAINER_RUNTIME_DOCKER_IMAGE", "centos:7")
//!     .build()?;
//! ```

use crate::constants::validate_container_id;
use crate::error::{Error, Result};
use crate::runtime::Signal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// =============================================================================
// Launch Context
// =============================================================================

/// Execution attributes for a single container launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LaunchContextBuilder", into = "LaunchContextBuilder")]
pub struct LaunchContext {
    run_as_user: String,
    user: String,
    app_id: String,
    container_id: String,
    container_work_dir: PathBuf,
    local_dirs: Vec<String>,
    log_dirs: Vec<String>,
    resources_options: String,
    container_script_path: PathBuf,
    token_path: PathBuf,
    pid_file_path: PathBuf,
    tc_command_file: Option<PathBuf>,
    environment: HashMap<String, String>,
}

impl LaunchContext {
    /// Returns an empty builder.
    pub fn builder() -> LaunchContextBuilder {
        LaunchContextBuilder::default()
    }

    /// Local user the container process runs as.
    pub fn run_as_user(&self) -> &str {
        &self.run_as_user
    }

    /// Application owner who requested the container.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Application ID.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Container ID.
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Container working directory on the host.
    pub fn container_work_dir(&self) -> &Path {
        &self.container_work_dir
    }

    /// Node-local directories, in caller order.
    pub fn local_dirs(&self) -> &[String] {
        &self.local_dirs
    }

    /// Log directories, in caller order.
    pub fn log_dirs(&self) -> &[String] {
        &self.log_dirs
    }

    /// Resource options string passed through to the helper.
    pub fn resources_options(&self) -> &str {
        &self.resources_options
    }

    /// Node-manager-private copy of the launch script.
    pub fn container_script_path(&self) -> &Path {
        &self.container_script_path
    }

    /// Node-manager-private credentials file.
    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    /// File the helper writes the container pid into.
    pub fn pid_file_path(&self) -> &Path {
        &self.pid_file_path
    }

    /// Traffic-control command file, when network shaping is enabled.
    pub fn tc_command_file(&self) -> Option<&Path> {
        self.tc_command_file.as_deref()
    }

    /// The container's launch environment.
    pub fn environment(&self) -> &HashMap<String, String> {
        &self.environment
    }

    /// Looks up a launch environment variable.
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.environment.get(key).map(String::as_str)
    }
}

/// Builder for [`LaunchContext`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LaunchContextBuilder {
    run_as_user: Option<String>,
    user: Option<String>,
    app_id: Option<String>,
    container_id: Option<String>,
    container_work_dir: Option<PathBuf>,
    local_dirs: Option<Vec<String>>,
    log_dirs: Option<Vec<String>>,
    resources_options: Option<String>,
    container_script_path: Option<PathBuf>,
    token_path: Option<PathBuf>,
    pid_file_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tc_command_file: Option<PathBuf>,
    environment: HashMap<String, String>,
}

impl LaunchContextBuilder {
    /// Sets the local user the container runs as.
    pub fn run_as_user(mut self, v: impl Into<String>) -> Self {
        self.run_as_user = Some(v.into());
        self
    }

    /// Sets the application owner.
    pub fn user(mut self, v: impl Into<String>) -> Self {
        self.user = Some(v.into());
        self
    }

    /// Sets the application ID.
    pub fn app_id(mut self, v: impl Into<String>) -> Self {
        self.app_id = Some(v.into());
        self
    }

    /// Sets the container ID.
    pub fn container_id(mut self, v: impl Into<String>) -> Self {
        self.container_id = Some(v.into());
        self
    }

    /// Sets the container working directory.
    pub fn container_work_dir(mut self, v: impl Into<PathBuf>) -> Self {
        self.container_work_dir = Some(v.into());
        self
    }

    /// Sets the node-local directories.
    pub fn local_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.local_dirs = Some(dirs.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the log directories.
    pub fn log_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.log_dirs = Some(dirs.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the resource options string.
    pub fn resources_options(mut self, v: impl Into<String>) -> Self {
        self.resources_options = Some(v.into());
        self
    }

    /// Sets the private launch script path.
    pub fn container_script_path(mut self, v: impl Into<PathBuf>) -> Self {
        self.container_script_path = Some(v.into());
        self
    }

    /// Sets the private credentials file path.
    pub fn token_path(mut self, v: impl Into<PathBuf>) -> Self {
        self.token_path = Some(v.into());
        self
    }

    /// Sets the pid file path.
    pub fn pid_file_path(mut self, v: impl Into<PathBuf>) -> Self {
        self.pid_file_path = Some(v.into());
        self
    }

    /// Sets the traffic-control command file.
    pub fn tc_command_file(mut self, v: impl Into<PathBuf>) -> Self {
        self.tc_command_file = Some(v.into());
        self
    }

    /// Adds one launch environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    /// Replaces the launch environment.
    pub fn environment(mut self, env: HashMap<String, String>) -> Self {
        self.environment = env;
        self
    }

    /// Validates and builds the context.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidContext`] naming the first missing attribute
    /// - [`Error::InvalidContainerId`] if the container ID is malformed
    pub fn build(self) -> Result<LaunchContext> {
        let container_id = required(self.container_id, "containerId")?;
        validate_container_id(&container_id).map_err(|reason| Error::InvalidContainerId {
            id: container_id.clone(),
            reason: reason.to_string(),
        })?;

        Ok(LaunchContext {
            run_as_user: required(self.run_as_user, "runAsUser")?,
            user: required(self.user, "user")?,
            app_id: required(self.app_id, "appId")?,
            container_id,
            container_work_dir: required(self.container_work_dir, "containerWorkDir")?,
            local_dirs: required(self.local_dirs, "localDirs")?,
            log_dirs: required(self.log_dirs, "logDirs")?,
            resources_options: required(self.resources_options, "resourcesOptions")?,
            container_script_path: required(self.container_script_path, "containerScriptPath")?,
            token_path: required(self.token_path, "tokenPath")?,
            pid_file_path: required(self.pid_file_path, "pidFilePath")?,
            tc_command_file: self.tc_command_file,
            environment: self.environment,
        })
    }
}

impl TryFrom<LaunchContextBuilder> for LaunchContext {
    type Error = Error;

    fn try_from(builder: LaunchContextBuilder) -> Result<Self> {
        builder.build()
    }
}

impl From<LaunchContext> for LaunchContextBuilder {
    fn from(ctx: LaunchContext) -> Self {
        Self {
            run_as_user: Some(ctx.run_as_user),
            user: Some(ctx.user),
            app_id: Some(ctx.app_id),
            container_id: Some(ctx.container_id),
            container_work_dir: Some(ctx.container_work_dir),
            local_dirs: Some(ctx.local_dirs),
            log_dirs: Some(ctx.log_dirs),
            resources_options: Some(ctx.resources_options),
            container_script_path: Some(ctx.container_script_path),
            token_path: Some(ctx.token_path),
            pid_file_path: Some(ctx.pid_file_path),
            tc_command_file: ctx.tc_command_file,
            environment: ctx.environment,
        }
    }
}

// =============================================================================
// Signal Context
// =============================================================================

/// Execution attributes for delivering a signal to a container process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SignalContextBuilder", into = "SignalContextBuilder")]
pub struct SignalContext {
    run_as_user: String,
    user: String,
    pid: u32,
    signal: Signal,
    container_id: Option<String>,
    environment: HashMap<String, String>,
}

impl SignalContext {
    /// Returns an empty builder.
    pub fn builder() -> SignalContextBuilder {
        SignalContextBuilder::default()
    }

    /// Local user the container process runs as.
    pub fn run_as_user(&self) -> &str {
        &self.run_as_user
    }

    /// Application owner requesting the signal.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Target process ID.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Signal to deliver.
    pub fn signal(&self) -> Signal {
        self.signal
    }

    /// Container the pid belongs to, if the caller knows it. Diagnostics only.
    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }

    /// Environment passed to the helper.
    pub fn environment(&self) -> &HashMap<String, String> {
        &self.environment
    }
}

/// Builder for [`SignalContext`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SignalContextBuilder {
    run_as_user: Option<String>,
    user: Option<String>,
    pid: Option<u32>,
    signal: Option<Signal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    container_id: Option<String>,
    environment: HashMap<String, String>,
}

impl SignalContextBuilder {
    /// Sets the local user the container runs as.
    pub fn run_as_user(mut self, v: impl Into<String>) -> Self {
        self.run_as_user = Some(v.into());
        self
    }

    /// Sets the application owner.
    pub fn user(mut self, v: impl Into<String>) -> Self {
        self.user = Some(v.into());
        self
    }

    /// Sets the target process ID.
    pub fn pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    /// Sets the signal to deliver.
    pub fn signal(mut self, signal: Signal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Sets the owning container ID, used in diagnostics.
    pub fn container_id(mut self, v: impl Into<String>) -> Self {
        self.container_id = Some(v.into());
        self
    }

    /// Adds one helper environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    /// Validates and builds the context.
    pub fn build(self) -> Result<SignalContext> {
        Ok(SignalContext {
            run_as_user: required(self.run_as_user, "runAsUser")?,
            user: required(self.user, "user")?,
            pid: required(self.pid, "pid")?,
            signal: required(self.signal, "signal")?,
            container_id: self.container_id,
            environment: self.environment,
        })
    }
}

impl TryFrom<SignalContextBuilder> for SignalContext {
    type Error = Error;

    fn try_from(builder: SignalContextBuilder) -> Result<Self> {
        builder.build()
    }
}

impl From<SignalContext> for SignalContextBuilder {
    fn from(ctx: SignalContext) -> Self {
        Self {
            run_as_user: Some(ctx.run_as_user),
            user: Some(ctx.user),
            pid: Some(ctx.pid),
            signal: Some(ctx.signal),
            container_id: ctx.container_id,
            environment: ctx.environment,
        }
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T> {
    value.ok_or(Error::InvalidContext { field })
}
