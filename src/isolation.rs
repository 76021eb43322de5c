//! cgroup parent resolution for launched containers.
//!
//! Docker can place a container under an existing cgroup via
//! `--cgroup-parent`. When the resources options request cgroup placement,
//! [`add_cgroup_parent_if_required`] asks a [`CgroupPathResolver`] for the
//! container's group and attaches it to the run specification.
//!
//! This step is opt-in: the docker runtime only calls it when
//! `RuntimeConfig::cgroup_parent_enabled` is set.

use crate::constants::{cgroup_no_tasks_sentinel, validate_container_id};
use crate::error::{Error, Result};
use crate::run_spec::RunSpecification;
use tracing::{info, warn};

/// Resolves the cgroup path of a container, relative to the cgroup root.
pub trait CgroupPathResolver: Send + Sync {
    fn relative_path_for(&self, container_id: &str) -> Result<String>;
}

/// Resolver for a single flat hierarchy: `<hierarchy>/<container-id>`.
#[derive(Debug, Clone)]
pub struct CgroupsHandler {
    hierarchy: String,
}

impl CgroupsHandler {
    pub fn new(hierarchy: impl Into<String>) -> Self {
        Self {
            hierarchy: hierarchy.into(),
        }
    }
}

impl CgroupPathResolver for CgroupsHandler {
    fn relative_path_for(&self, container_id: &str) -> Result<String> {
        validate_container_id(container_id).map_err(|reason| Error::ResourceIsolationFailure {
            container_id: container_id.to_string(),
            reason: reason.to_string(),
        })?;

        let hierarchy = self.hierarchy.trim_matches('/');
        if hierarchy.is_empty() {
            return Err(Error::ResourceIsolationFailure {
                container_id: container_id.to_string(),
                reason: "cgroup hierarchy not configured".to_string(),
            });
        }
        Ok(format!("{}/{}", hierarchy, container_id))
    }
}

/// Sets `spec`'s cgroup parent unless `resources_options` opts out.
///
/// `cgroups=none` leaves `spec` untouched. Any other value resolves the
/// container's cgroup and sets `/<relative-path>` as the parent.
///
/// # Errors
///
/// [`Error::ResourceIsolationFailure`] if the resolver fails.
pub fn add_cgroup_parent_if_required(
    resources_options: &str,
    container_id: &str,
    resolver: &dyn CgroupPathResolver,
    spec: &mut RunSpecification,
) -> Result<()> {
    if resources_options == cgroup_no_tasks_sentinel() {
        info!("no resource restrictions specified. not using docker's cgroup options");
        return Ok(());
    }

    info!("using docker's cgroups options");
    let relative = resolver.relative_path_for(container_id).map_err(|e| {
        warn!("unable to use cgroups handler: {}", e);
        match e {
            Error::ResourceIsolationFailure { .. } => e,
            other => Error::ResourceIsolationFailure {
                container_id: container_id.to_string(),
                reason: other.to_string(),
            },
        }
    })?;

    let parent = format!("/{}", relative);
    info!("using cgroup parent: {}", parent);
    spec.set_cgroup_parent(parent);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl CgroupPathResolver for Failing {
        fn relative_path_for(&self, _container_id: &str) -> Result<String> {
            Err(Error::Io(std::io::Error::other("cgroup mount missing")))
        }
    }

    fn spec() -> RunSpecification {
        RunSpecification::new("c1", "nobody", "img")
    }

    #[test]
    fn test_sentinel_skips() {
        let mut s = spec();
        add_cgroup_parent_if_required("cgroups=none", "c1", &Failing, &mut s).unwrap();
        assert!(s.cgroup_parent().is_none());
    }

    #[test]
    fn test_parent_attached() {
        let mut s = spec();
        let handler = CgroupsHandler::new("/hadoop-yarn/");
        add_cgroup_parent_if_required("cgroups=/sys/fs/cgroup/cpu/hadoop-yarn/c1/tasks", "c1", &handler, &mut s)
            .unwrap();
        assert_eq!(s.cgroup_parent(), Some("/hadoop-yarn/c1"));
    }

    #[test]
    fn test_resolver_failure_wrapped() {
        let mut s = spec();
        let err = add_cgroup_parent_if_required("cgroups=x", "c1", &Failing, &mut s).unwrap_err();
        match err {
            Error::ResourceIsolationFailure { container_id, reason } => {
                assert_eq!(container_id, "c1");
                assert!(reason.contains("cgroup mount missing"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(s.cgroup_parent().is_none());
    }

    #[test]
    fn test_handler_rejects_bad_id() {
        assert!(CgroupsHandler::new("hadoop-yarn").relative_path_for("../x").is_err());
    }
}
