//! Bind mount set for launched containers.
//!
//! Every node-local directory the container may touch is exposed at the same
//! path inside the container, so paths computed by the node manager stay
//! valid on both sides.

use serde::{Deserialize, Serialize};

/// A host path bound into the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountBinding {
    /// Host path.
    pub source: String,
    /// Path inside the container. May carry a mode suffix such as `:ro`.
    pub target: String,
}

impl MountBinding {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Binds `path` at the same location inside the container.
    pub fn identity(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            target: path.clone(),
            source: path,
        }
    }

    /// Renders as a docker `-v` value (`source:target`).
    pub fn as_volume_arg(&self) -> String {
        format!("{}:{}", self.source, self.target)
    }
}

/// Assembles identity bindings for the container's directories.
///
/// Order: `local_dirs` as given, then `work_dir`, then `log_dirs` as given.
/// Duplicates are kept and paths are not checked.
pub fn assemble_mounts(local_dirs: &[String], work_dir: &str, log_dirs: &[String]) -> Vec<MountBinding> {
    local_dirs
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(work_dir))
        .chain(log_dirs.iter().map(String::as_str))
        .map(MountBinding::identity)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dirs(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_mount_order() {
        let mounts = assemble_mounts(&dirs(&["a", "b"]), "w", &dirs(&["c"]));
        let expected: Vec<MountBinding> =
            ["a", "b", "w", "c"].into_iter().map(MountBinding::identity).collect();
        assert_eq!(mounts, expected);
    }

    #[test]
    fn test_empty_lists() {
        let mounts = assemble_mounts(&[], "w", &[]);
        assert_eq!(mounts, vec![MountBinding::identity("w")]);
    }

    #[test]
    fn test_duplicates_kept() {
        let mounts = assemble_mounts(&dirs(&["w"]), "w", &dirs(&["w"]));
        assert_eq!(mounts.len(), 3);
    }

    #[test]
    fn test_volume_arg() {
        assert_eq!(
            MountBinding::new("/etc/passwd", "/etc/password:ro").as_volume_arg(),
            "/etc/passwd:/etc/password:ro"
        );
    }
}
