//! Docker run specification.
//!
//! [`RunSpecification`] describes one `docker run` invocation. It is built
//! per launch, rendered to text by [`RunSpecification::command_with_arguments`]
//! and then discarded; the engine client persists that text for the helper.
//!
//! ## Rendered Form
//!
//! ```text
//! run --name=<id> --user=<user> -d --workdir=<dir> --net=host \
//!     -v <src>:<dst> ... [--cgroup-parent=<path>] <image> [override...]
//! ```
//!
//! Option order follows the order the setters were called in; mounts keep
//! insertion order.

use crate::error::{Error, Result};
use crate::mounts::MountBinding;
use serde::{Deserialize, Serialize};

const RUN_COMMAND: &str = "run";

/// In-memory description of a `docker run` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSpecification {
    container_id: String,
    user: String,
    image: String,
    detach: bool,
    work_dir: Option<String>,
    network: Option<String>,
    mounts: Vec<MountBinding>,
    override_command: Option<Vec<String>>,
    cgroup_parent: Option<String>,
}

impl RunSpecification {
    /// Creates a specification naming the container, user and image.
    pub fn new(
        container_id: impl Into<String>,
        user: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            container_id: container_id.into(),
            user: user.into(),
            image: image.into(),
            detach: false,
            work_dir: None,
            network: None,
            mounts: Vec::new(),
            override_command: None,
            cgroup_parent: None,
        }
    }

    /// Runs the container in the background (`-d`).
    pub fn detach_on_run(mut self) -> Self {
        self.detach = true;
        self
    }

    /// Sets the working directory inside the container (`--workdir`).
    pub fn with_work_dir(mut self, dir: impl Into<String>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Sets the network mode (`--net`).
    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    /// Appends one `-v source:target` binding.
    pub fn add_mount(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.mounts.push(MountBinding::new(source, target));
        self
    }

    /// Appends bindings in iteration order.
    pub fn add_mounts(mut self, mounts: impl IntoIterator<Item = MountBinding>) -> Self {
        self.mounts.extend(mounts);
        self
    }

    /// Replaces the image's entrypoint/command with `command`.
    pub fn set_override_command(&mut self, command: Vec<String>) {
        self.override_command = Some(command);
    }

    /// Places the container under `parent` (`--cgroup-parent`).
    pub fn set_cgroup_parent(&mut self, parent: impl Into<String>) {
        self.cgroup_parent = Some(parent.into());
    }

    /// Container name (`--name`).
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// User the container runs as (`--user`).
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Image to run.
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Whether `-d` is emitted.
    pub fn is_detached(&self) -> bool {
        self.detach
    }

    /// Working directory, if set.
    pub fn work_dir(&self) -> Option<&str> {
        self.work_dir.as_deref()
    }

    /// Network mode, if set.
    pub fn network(&self) -> Option<&str> {
        self.network.as_deref()
    }

    /// Volume bindings in insertion order.
    pub fn mounts(&self) -> &[MountBinding] {
        &self.mounts
    }

    /// Command replacing the image entrypoint, if any.
    pub fn override_command(&self) -> Option<&[String]> {
        self.override_command.as_deref()
    }

    /// Cgroup parent path, if set.
    pub fn cgroup_parent(&self) -> Option<&str> {
        self.cgroup_parent.as_deref()
    }

    /// Returns the docker argument tokens, starting with `run`.
    ///
    /// # Errors
    ///
    /// [`Error::MissingConfiguration`] if the image is empty.
    pub fn to_args(&self) -> Result<Vec<String>> {
        if self.image.trim().is_empty() {
            return Err(Error::MissingConfiguration {
                variable: "image".to_string(),
            });
        }

        let mut args = vec![
            RUN_COMMAND.to_string(),
            format!("--name={}", self.container_id),
            format!("--user={}", self.user),
        ];
        if self.detach {
            args.push("-d".to_string());
        }
        if let Some(dir) = &self.work_dir {
            args.push(format!("--workdir={}", dir));
        }
        if let Some(net) = &self.network {
            args.push(format!("--net={}", net));
        }
        for mount in &self.mounts {
            args.push(format!("-v {}", mount.as_volume_arg()));
        }
        if let Some(parent) = &self.cgroup_parent {
            args.push(format!("--cgroup-parent={}", parent));
        }
        args.push(self.image.clone());
        if let Some(cmd) = &self.override_command {
            args.extend(cmd.iter().cloned());
        }
        Ok(args)
    }

    /// Renders the space-joined command line written to the command file.
    pub fn command_with_arguments(&self) -> Result<String> {
        Ok(self.to_args()?.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_render() {
        let mut spec = RunSpecification::new("c1", "nobody", "centos:7")
            .detach_on_run()
            .with_work_dir("/w")
            .with_network("host")
            .add_mount("/etc/passwd", "/etc/password:ro")
            .add_mounts([MountBinding::identity("/l1")]);
        spec.set_override_command(vec!["bash".into(), "/w/launch_container.sh".into()]);

        assert_eq!(
            spec.command_with_arguments().unwrap(),
            "run --name=c1 --user=nobody -d --workdir=/w --net=host \
             -v /etc/passwd:/etc/password:ro -v /l1:/l1 centos:7 bash /w/launch_container.sh"
        );
    }

    #[test]
    fn test_cgroup_parent_before_image() {
        let mut spec = RunSpecification::new("c1", "u", "img");
        spec.set_cgroup_parent("/hadoop-yarn/c1");
        let args = spec.to_args().unwrap();
        assert_eq!(args[args.len() - 2], "--cgroup-parent=/hadoop-yarn/c1");
        assert_eq!(args.last().unwrap(), "img");
    }

    #[test]
    fn test_empty_image_rejected() {
        let spec = RunSpecification::new("c1", "u", "  ");
        assert!(matches!(
            spec.to_args(),
            Err(Error::MissingConfiguration { .. })
        ));
    }
}
