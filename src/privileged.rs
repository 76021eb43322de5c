//! # Privileged Helper Protocol
//!
//! Containers are never started by this process directly. Every launch and
//! signal goes through a setuid helper binary (`container-executor`) that
//! switches to the target user before acting. The helper takes positional
//! arguments only, so the argument vectors below are an external contract.
//!
//! ## Launch Vector
//!
//! | #  | Field                         |
//! |----|-------------------------------|
//! | 1  | run-as user                   |
//! | 2  | requesting user               |
//! | 3  | op code (`4`, launch docker)  |
//! | 4  | app ID                        |
//! | 5  | container ID                  |
//! | 6  | container work dir            |
//! | 7  | private launch script path    |
//! | 8  | private token path            |
//! | 9  | pid file path                 |
//! | 10 | local dirs, `%`-joined        |
//! | 11 | log dirs, `%`-joined          |
//! | 12 | docker command file           |
//! | 13 | resources options             |
//! | 14 | traffic-control file (opt.)   |
//!
//! ## Signal Vector
//!
//! | # | Field                      |
//! |---|----------------------------|
//! | 1 | run-as user                |
//! | 2 | requesting user            |
//! | 3 | op code (`2`, signal)      |
//! | 4 | target pid                 |
//! | 5 | signal number              |
//!
//! Both vectors are produced only by [`LaunchInvocation::to_args`] and
//! [`SignalInvocation::to_args`]; call sites fill named fields.

use crate::config::RuntimeConfig;
use crate::constants::LINUX_FILE_PATH_SEPARATOR;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

// =============================================================================
// Operation Codes
// =============================================================================

/// Operation selector passed as the helper's third argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunAsUserCommand {
    InitializeContainer = 0,
    LaunchContainer = 1,
    SignalContainer = 2,
    DeleteAsUser = 3,
    LaunchDockerContainer = 4,
}

impl RunAsUserCommand {
    /// Numeric code understood by the helper.
    pub fn code(self) -> u8 {
        self as u8
    }
}

// =============================================================================
// Invocations
// =============================================================================

/// Helper arguments for launching a docker container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchInvocation {
    pub run_as_user: String,
    pub user: String,
    pub app_id: String,
    pub container_id: String,
    pub container_work_dir: PathBuf,
    pub container_script_path: PathBuf,
    pub token_path: PathBuf,
    pub pid_file_path: PathBuf,
    pub local_dirs: Vec<String>,
    pub log_dirs: Vec<String>,
    pub command_file: PathBuf,
    pub resources_options: String,
    pub tc_command_file: Option<PathBuf>,
}

impl LaunchInvocation {
    /// Serializes to the helper's positional argument vector.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            self.run_as_user.clone(),
            self.user.clone(),
            RunAsUserCommand::LaunchDockerContainer.code().to_string(),
            self.app_id.clone(),
            self.container_id.clone(),
            path_arg(&self.container_work_dir),
            path_arg(&self.container_script_path),
            path_arg(&self.token_path),
            path_arg(&self.pid_file_path),
            self.local_dirs.join(LINUX_FILE_PATH_SEPARATOR),
            self.log_dirs.join(LINUX_FILE_PATH_SEPARATOR),
            path_arg(&self.command_file),
            self.resources_options.clone(),
        ];
        if let Some(tc) = &self.tc_command_file {
            args.push(path_arg(tc));
        }
        args
    }
}

/// Helper arguments for signalling a container process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalInvocation {
    pub run_as_user: String,
    pub user: String,
    pub pid: u32,
    pub signal: i32,
}

impl SignalInvocation {
    /// Serializes to the helper's positional argument vector.
    pub fn to_args(&self) -> Vec<String> {
        vec![
            self.run_as_user.clone(),
            self.user.clone(),
            RunAsUserCommand::SignalContainer.code().to_string(),
            self.pid.to_string(),
            self.signal.to_string(),
        ]
    }
}

/// A single helper invocation of either shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelperInvocation {
    Launch(LaunchInvocation),
    Signal(SignalInvocation),
}

impl HelperInvocation {
    /// Operation name used in logs and dispatch errors.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Launch(_) => "launch-docker-container",
            Self::Signal(_) => "signal-container",
        }
    }

    /// Serializes to the helper's positional argument vector.
    pub fn to_args(&self) -> Vec<String> {
        match self {
            Self::Launch(inv) => inv.to_args(),
            Self::Signal(inv) => inv.to_args(),
        }
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

// =============================================================================
// Execution
// =============================================================================

/// Result of a helper run that got as far as exiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success,
    Failure {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },
}

impl ExecutionOutcome {
    /// Returns true if the helper exited zero.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Runs helper invocations.
///
/// Implementations block the calling task until the helper exits. A helper
/// that exits non-zero is an [`ExecutionOutcome::Failure`]; only a helper
/// that could not be run at all is an `Err` ([`Error::DispatchFailure`]).
#[async_trait]
pub trait PrivilegedExecutor: Send + Sync {
    async fn execute(
        &self,
        invocation: &HelperInvocation,
        env: &HashMap<String, String>,
    ) -> Result<ExecutionOutcome>;
}

/// Spawns the `container-executor` binary.
#[derive(Debug, Clone)]
pub struct ContainerExecutor {
    binary: PathBuf,
}

impl ContainerExecutor {
    /// Creates an executor for the configured helper binary.
    pub fn new(config: &RuntimeConfig) -> Self {
        Self::with_binary(config.container_executor_path.clone())
    }

    /// Creates an executor for `binary`.
    pub fn with_binary(binary: PathBuf) -> Self {
        Self { binary }
    }

    /// Path of the helper binary.
    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

#[async_trait]
impl PrivilegedExecutor for ContainerExecutor {
    async fn execute(
        &self,
        invocation: &HelperInvocation,
        env: &HashMap<String, String>,
    ) -> Result<ExecutionOutcome> {
        let args = invocation.to_args();
        debug!("Privileged operation: {} {}", self.binary.display(), args.join(" "));

        let output = Command::new(&self.binary)
            .args(&args)
            .envs(env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| Error::DispatchFailure {
                operation: invocation.operation().to_string(),
                reason: format!("{}: {}", self.binary.display(), e),
            })?;

        if output.status.success() {
            return Ok(ExecutionOutcome::Success);
        }

        // Killed by a signal: no exit code.
        let exit_code = output.status.code().unwrap_or(-1);
        Ok(ExecutionOutcome::Failure {
            exit_code,
            stdout: capture(output.stdout, "stdout"),
            stderr: capture(output.stderr, "stderr"),
        })
    }
}

/// Decodes a captured stream in full. Only bytes that are not UTF-8 are
/// replaced.
fn capture(bytes: Vec<u8>, stream: &str) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!("Helper {} is not valid UTF-8, decoding lossily", stream);
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launch() -> LaunchInvocation {
        LaunchInvocation {
            run_as_user: "nobody".into(),
            user: "alice".into(),
            app_id: "app_1".into(),
            container_id: "c1".into(),
            container_work_dir: "/w".into(),
            container_script_path: "/p/launch_container.sh".into(),
            token_path: "/p/tokens".into(),
            pid_file_path: "/p/pid".into(),
            local_dirs: vec!["/l1".into(), "/l2".into()],
            log_dirs: vec!["/g1".into()],
            command_file: "/tmp/docker.c1.cmd".into(),
            resources_options: "cgroups=none".into(),
            tc_command_file: None,
        }
    }

    #[test]
    fn test_op_codes() {
        assert_eq!(RunAsUserCommand::InitializeContainer.code(), 0);
        assert_eq!(RunAsUserCommand::LaunchContainer.code(), 1);
        assert_eq!(RunAsUserCommand::SignalContainer.code(), 2);
        assert_eq!(RunAsUserCommand::DeleteAsUser.code(), 3);
        assert_eq!(RunAsUserCommand::LaunchDockerContainer.code(), 4);
    }

    #[test]
    fn test_launch_args_layout() {
        assert_eq!(
            launch().to_args(),
            vec![
                "nobody",
                "alice",
                "4",
                "app_1",
                "c1",
                "/w",
                "/p/launch_container.sh",
                "/p/tokens",
                "/p/pid",
                "/l1%/l2",
                "/g1",
                "/tmp/docker.c1.cmd",
                "cgroups=none",
            ]
        );
    }

    #[test]
    fn test_launch_args_tc_file_appended() {
        let mut inv = launch();
        inv.tc_command_file = Some("/p/tc.cmd".into());
        let args = inv.to_args();
        assert_eq!(args.len(), 14);
        assert_eq!(args[13], "/p/tc.cmd");
    }

    #[test]
    fn test_signal_args_layout() {
        let inv = SignalInvocation {
            run_as_user: "nobody".into(),
            user: "alice".into(),
            pid: 123,
            signal: 9,
        };
        assert_eq!(inv.to_args(), vec!["nobody", "alice", "2", "123", "9"]);
    }

    #[test]
    fn test_capture_keeps_large_output_whole() {
        let mut bytes = vec![b'x'; 2 * 1024 * 1024];
        bytes.extend_from_slice("éTAIL".as_bytes());
        let out = capture(bytes, "stderr");
        assert_eq!(out.len(), 2 * 1024 * 1024 + "éTAIL".len());
        assert!(out.ends_with("éTAIL"));
    }

    #[test]
    fn test_capture_invalid_utf8_is_lossy() {
        let out = capture(vec![b'o', b'k', 0xff], "stdout");
        assert_eq!(out, "ok\u{fffd}");
    }
}
