//! Docker engine client.
//!
//! The adapter never talks to the docker daemon itself. It renders the run
//! specification into a command file that the privileged helper reads and
//! executes as the target user. [`EngineClient`] is that seam;
//! [`DockerClient`] is the file-backed implementation.
//!
//! ## Command File Layout
//!
//! ```text
//! <tmp_dir>/nm-docker-cmds/docker.<container-id>.<random>.cmd
//! ```
//!
//! Files are left in place after launch; the helper and node manager own
//! their cleanup.

use crate::config::RuntimeConfig;
use crate::constants::{DOCKER_COMMAND_DIR, DOCKER_COMMAND_FILE_PREFIX, DOCKER_COMMAND_FILE_SUFFIX};
use crate::error::{Error, Result};
use crate::run_spec::RunSpecification;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Persists run specifications for the privileged helper.
pub trait EngineClient: Send + Sync {
    /// Writes `spec` to a command file and returns its location.
    fn write_command_file(&self, spec: &RunSpecification, container_id: &str) -> Result<PathBuf>;
}

/// Writes docker run commands into a private temp directory.
#[derive(Debug, Clone)]
pub struct DockerClient {
    command_dir: PathBuf,
}

impl DockerClient {
    /// Creates the client, creating `<tmp_dir>/nm-docker-cmds` if needed.
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        Self::with_command_dir(config.tmp_dir.join(DOCKER_COMMAND_DIR))
    }

    /// Creates a client writing into `command_dir`.
    pub fn with_command_dir(command_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&command_dir).map_err(|e| Error::CommandFile {
            path: command_dir.clone(),
            reason: format!("unable to create directory: {}", e),
        })?;
        Ok(Self { command_dir })
    }

    /// Creates a client for `command_dir` without touching the filesystem.
    ///
    /// Writes fail with [`Error::CommandFile`] until the directory exists.
    pub fn at(command_dir: PathBuf) -> Self {
        Self { command_dir }
    }

    /// Directory holding generated command files.
    pub fn command_dir(&self) -> &Path {
        &self.command_dir
    }
}

impl EngineClient for DockerClient {
    fn write_command_file(&self, spec: &RunSpecification, container_id: &str) -> Result<PathBuf> {
        let contents = spec.command_with_arguments()?;
        let io_err = |e: std::io::Error| Error::CommandFile {
            path: self.command_dir.clone(),
            reason: e.to_string(),
        };

        let mut file = tempfile::Builder::new()
            .prefix(&format!("{}{}.", DOCKER_COMMAND_FILE_PREFIX, container_id))
            .suffix(DOCKER_COMMAND_FILE_SUFFIX)
            .tempfile_in(&self.command_dir)
            .map_err(io_err)?;
        file.write_all(contents.as_bytes()).map_err(io_err)?;
        file.flush().map_err(io_err)?;

        let (_, path) = file.keep().map_err(|e| io_err(e.error))?;
        debug!("Wrote docker command for {} to {}", container_id, path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_command_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config = RuntimeConfig {
            tmp_dir: tmp.path().to_path_buf(),
            ..RuntimeConfig::default()
        };
        let client = DockerClient::new(&config).unwrap();
        assert!(client.command_dir().ends_with("nm-docker-cmds"));

        let spec = RunSpecification::new("c1", "nobody", "centos:7").detach_on_run();
        let path = client.write_command_file(&spec, "c1").unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("docker.c1."));
        assert!(name.ends_with(".cmd"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "run --name=c1 --user=nobody -d centos:7"
        );
    }

    #[test]
    fn test_at_creates_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("cmds");
        let client = DockerClient::at(dir.clone());
        assert!(!dir.exists());

        let spec = RunSpecification::new("c1", "nobody", "centos:7");
        let err = client.write_command_file(&spec, "c1").unwrap_err();
        assert!(matches!(err, Error::CommandFile { .. }));
    }

    #[test]
    fn test_empty_image_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let client = DockerClient::with_command_dir(tmp.path().join("cmds")).unwrap();
        let spec = RunSpecification::new("c1", "nobody", "");
        assert!(client.write_command_file(&spec, "c1").is_err());
        assert_eq!(std::fs::read_dir(client.command_dir()).unwrap().count(), 0);
    }
}
