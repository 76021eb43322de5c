//! # Docker Container Runtime - Launch via the Privileged Helper
//!
//! Implements [`ContainerRuntime`] for containers whose launch environment
//! sets `YARN_CONTAINER_RUNTIME_TYPE=docker`.
//!
//! ## Launch Flow
//!
//! ```text
//! LaunchContext
//!   │  image from env (required)        ──► MissingConfiguration
//!   ▼
//! RunSpecification  (-d, --net=host, passwd mount, dir mounts,
//!   │                 launch script override, [cgroup parent])
//!   ▼
//! EngineClient::write_command_file     ──► command file path
//!   ▼
//! LaunchInvocation ──► PrivilegedExecutor::execute
//!                         ├─ Success
//!                         ├─ Failure   ──► LaunchFailed
//!                         └─ Err       ──► DispatchFailure
//! ```
//!
//! ## Command Override
//!
//! Unless `YARN_CONTAINER_RUNTIME_DOCKER_RUN_OVERRIDE_DISABLE=true`, the
//! image's entrypoint is replaced with `bash <work-dir>/launch_container.sh`,
//! so the node manager's launch script runs whatever the image declares.
//!
//! ## Concurrency
//!
//! The runtime holds only immutable collaborators behind `Arc`s. Calls for
//! different containers share nothing mutable and can run concurrently. No
//! task is spawned; each call waits on the helper in the caller's task.
//!
//! [`ContainerRuntime`]: crate::runtime::ContainerRuntime

use crate::config::RuntimeConfig;
use crate::constants::{
    CONTAINER_SCRIPT, CONTAINER_SCRIPT_INTERPRETER, CONTAINER_TYPE_DOCKER, DOCKER_COMMAND_DIR,
    DOCKER_NETWORK_HOST, ENV_CONTAINER_TYPE, ENV_DOCKER_CONTAINER_IMAGE,
    ENV_DOCKER_CONTAINER_RUN_OVERRIDE_DISABLE, USER_DATABASE_SOURCE, USER_DATABASE_TARGET,
};
use crate::context::{LaunchContext, SignalContext};
use crate::engine::{DockerClient, EngineClient};
use crate::error::{Error, Result};
use crate::isolation::{CgroupPathResolver, CgroupsHandler, add_cgroup_parent_if_required};
use crate::mounts::assemble_mounts;
use crate::privileged::{
    ContainerExecutor, ExecutionOutcome, HelperInvocation, LaunchInvocation, PrivilegedExecutor,
    SignalInvocation,
};
use crate::run_spec::RunSpecification;
use crate::runtime::ContainerRuntime;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Returns true if the launch environment asks for a docker container.
pub fn is_docker_container_requested(env: &HashMap<String, String>) -> bool {
    env.get(ENV_CONTAINER_TYPE)
        .is_some_and(|t| t == CONTAINER_TYPE_DOCKER)
}

/// Docker runtime driving `container-executor`.
pub struct DockerContainerRuntime {
    config: Arc<RuntimeConfig>,
    engine: Arc<dyn EngineClient>,
    executor: Arc<dyn PrivilegedExecutor>,
    cgroups: Arc<dyn CgroupPathResolver>,
}

impl DockerContainerRuntime {
    /// Creates a runtime with the production collaborators.
    ///
    /// Creates the docker command directory under `config.tmp_dir`.
    pub fn initialize(config: RuntimeConfig) -> Result<Self> {
        config.validate()?;
        let engine = DockerClient::new(&config)?;
        Ok(Self::production(config, engine))
    }

    /// Creates a runtime that only builds run specifications.
    ///
    /// Nothing is created on disk. Launching through it fails with
    /// [`Error::CommandFile`] unless the command directory already exists.
    pub fn render_only(config: RuntimeConfig) -> Result<Self> {
        config.validate()?;
        let engine = DockerClient::at(config.tmp_dir.join(DOCKER_COMMAND_DIR));
        Ok(Self::production(config, engine))
    }

    fn production(config: RuntimeConfig, engine: DockerClient) -> Self {
        let executor = Arc::new(ContainerExecutor::new(&config));
        let cgroups = Arc::new(CgroupsHandler::new(config.cgroup_hierarchy.clone()));

        info!(
            "docker runtime initialized (executor: {}, cgroup parent: {})",
            config.container_executor_path.display(),
            config.cgroup_parent_enabled
        );
        Self::with_collaborators(Arc::new(config), Arc::new(engine), executor, cgroups)
    }

    /// Creates a runtime from explicit collaborators.
    pub fn with_collaborators(
        config: Arc<RuntimeConfig>,
        engine: Arc<dyn EngineClient>,
        executor: Arc<dyn PrivilegedExecutor>,
        cgroups: Arc<dyn CgroupPathResolver>,
    ) -> Self {
        Self {
            config,
            engine,
            executor,
            cgroups,
        }
    }

    /// Runtime configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Builds the docker run specification for `ctx`.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingConfiguration`] if the image variable is unset or blank
    /// - [`Error::ResourceIsolationFailure`] if cgroup parents are enabled and
    ///   the container's cgroup cannot be resolved
    pub fn build_run_spec(&self, ctx: &LaunchContext) -> Result<RunSpecification> {
        let image = ctx
            .env_var(ENV_DOCKER_CONTAINER_IMAGE)
            .filter(|image| !image.trim().is_empty())
            .ok_or_else(|| Error::MissingConfiguration {
                variable: ENV_DOCKER_CONTAINER_IMAGE.to_string(),
            })?;

        let work_dir = ctx.container_work_dir().to_string_lossy().into_owned();
        let mut spec = RunSpecification::new(ctx.container_id(), ctx.run_as_user(), image)
            .detach_on_run()
            .with_work_dir(work_dir.clone())
            .with_network(DOCKER_NETWORK_HOST)
            .add_mount(USER_DATABASE_SOURCE, USER_DATABASE_TARGET)
            .add_mounts(assemble_mounts(ctx.local_dirs(), &work_dir, ctx.log_dirs()));

        if self.config.cgroup_parent_enabled {
            add_cgroup_parent_if_required(
                ctx.resources_options(),
                ctx.container_id(),
                self.cgroups.as_ref(),
                &mut spec,
            )?;
        }

        if ctx.env_var(ENV_DOCKER_CONTAINER_RUN_OVERRIDE_DISABLE) == Some("true") {
            info!("command override disabled");
        } else {
            let script = Path::new(&work_dir).join(CONTAINER_SCRIPT);
            spec.set_override_command(vec![
                CONTAINER_SCRIPT_INTERPRETER.to_string(),
                script.to_string_lossy().into_owned(),
            ]);
        }

        Ok(spec)
    }

    async fn dispatch(
        &self,
        invocation: HelperInvocation,
        env: &HashMap<String, String>,
        target: &str,
    ) -> Result<ExecutionOutcome> {
        self.executor
            .execute(&invocation, env)
            .await
            .map_err(|e| match e {
                Error::DispatchFailure { operation, reason } => Error::DispatchFailure {
                    operation,
                    reason: format!("{}: {}", target, reason),
                },
                other => Error::DispatchFailure {
                    operation: invocation.operation().to_string(),
                    reason: format!("{}: {}", target, other),
                },
            })
    }
}

#[async_trait]
impl ContainerRuntime for DockerContainerRuntime {
    fn name(&self) -> &str {
        "docker"
    }

    async fn prepare(&self, _ctx: &LaunchContext) -> Result<()> {
        Ok(())
    }

    async fn launch(&self, ctx: &LaunchContext) -> Result<()> {
        let container_id = ctx.container_id();
        debug!("Launching docker container {}", container_id);

        let spec = self.build_run_spec(ctx)?;
        let command_file = self.engine.write_command_file(&spec, container_id)?;

        let invocation = LaunchInvocation {
            run_as_user: ctx.run_as_user().to_string(),
            user: ctx.user().to_string(),
            app_id: ctx.app_id().to_string(),
            container_id: container_id.to_string(),
            container_work_dir: ctx.container_work_dir().to_path_buf(),
            container_script_path: ctx.container_script_path().to_path_buf(),
            token_path: ctx.token_path().to_path_buf(),
            pid_file_path: ctx.pid_file_path().to_path_buf(),
            local_dirs: ctx.local_dirs().to_vec(),
            log_dirs: ctx.log_dirs().to_vec(),
            command_file,
            resources_options: ctx.resources_options().to_string(),
            tc_command_file: ctx.tc_command_file().map(Path::to_path_buf),
        };

        let target = format!("container {}", container_id);
        match self
            .dispatch(HelperInvocation::Launch(invocation), ctx.environment(), &target)
            .await
        {
            Ok(ExecutionOutcome::Success) => {
                info!("Launched docker container {}", container_id);
                Ok(())
            }
            Ok(ExecutionOutcome::Failure {
                exit_code,
                stdout,
                stderr,
            }) => {
                warn!(
                    "Launch container failed for {} (exit code {}): {}",
                    container_id,
                    exit_code,
                    stderr.trim()
                );
                Err(Error::LaunchFailed {
                    container_id: container_id.to_string(),
                    exit_code,
                    stdout,
                    stderr,
                })
            }
            Err(e) => {
                warn!("Launch container failed for {}: {}", container_id, e);
                Err(e)
            }
        }
    }

    async fn signal(&self, ctx: &SignalContext) -> Result<()> {
        let pid = ctx.pid();
        let signal = ctx.signal();
        let target = match ctx.container_id() {
            Some(id) => format!("container {} (pid {})", id, pid),
            None => format!("pid {}", pid),
        };
        debug!("Sending {} to {}", signal, target);

        let invocation = SignalInvocation {
            run_as_user: ctx.run_as_user().to_string(),
            user: ctx.user().to_string(),
            pid,
            signal: signal.as_i32(),
        };

        match self
            .dispatch(HelperInvocation::Signal(invocation), ctx.environment(), &target)
            .await
        {
            Ok(ExecutionOutcome::Success) => {
                debug!("Sent {} to {}", signal, target);
                Ok(())
            }
            Ok(ExecutionOutcome::Failure {
                exit_code,
                stdout,
                stderr,
            }) => {
                warn!(
                    "Signal container failed for {} (exit code {}): {}",
                    target,
                    exit_code,
                    stderr.trim()
                );
                Err(Error::SignalFailed {
                    pid,
                    exit_code,
                    stdout,
                    stderr,
                })
            }
            Err(e) => {
                warn!("Signal container failed for {}: {}", target, e);
                Err(e)
            }
        }
    }

    async fn reap(&self, _ctx: &LaunchContext) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Signal;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct FixedEngine;

    impl EngineClient for FixedEngine {
        fn write_command_file(&self, spec: &RunSpecification, container_id: &str) -> Result<PathBuf> {
            spec.command_with_arguments()?;
            Ok(PathBuf::from(format!("/tmp/docker.{}.cmd", container_id)))
        }
    }

    struct Recording {
        calls: Mutex<Vec<Vec<String>>>,
        outcome: ExecutionOutcome,
    }

    #[async_trait]
    impl PrivilegedExecutor for Recording {
        async fn execute(
            &self,
            invocation: &HelperInvocation,
            _env: &HashMap<String, String>,
        ) -> Result<ExecutionOutcome> {
            self.calls.lock().unwrap().push(invocation.to_args());
            Ok(self.outcome.clone())
        }
    }

    fn runtime(outcome: ExecutionOutcome) -> (DockerContainerRuntime, Arc<Recording>) {
        let executor = Arc::new(Recording {
            calls: Mutex::new(Vec::new()),
            outcome,
        });
        let rt = DockerContainerRuntime::with_collaborators(
            Arc::new(RuntimeConfig::default()),
            Arc::new(FixedEngine),
            executor.clone(),
            Arc::new(CgroupsHandler::new("hadoop-yarn")),
        );
        (rt, executor)
    }

    fn ctx() -> LaunchContext {
        LaunchContext::builder()
            .run_as_user("nobody")
            .user("alice")
            .app_id("app_1")
            .container_id("c1")
            .container_work_dir("/w")
            .local_dirs(["/l1"])
            .log_dirs(["/g1"])
            .resources_options("cgroups=none")
            .container_script_path("/p/launch_container.sh")
            .token_path("/p/tokens")
            .pid_file_path("/p/pid")
            .env(ENV_DOCKER_CONTAINER_IMAGE, "centos:7")
            .build()
            .unwrap()
    }

    #[test]
    fn test_container_type_detection() {
        let mut env = HashMap::new();
        assert!(!is_docker_container_requested(&env));
        env.insert(ENV_CONTAINER_TYPE.to_string(), "default".to_string());
        assert!(!is_docker_container_requested(&env));
        env.insert(ENV_CONTAINER_TYPE.to_string(), "docker".to_string());
        assert!(is_docker_container_requested(&env));
    }

    #[test]
    fn test_build_run_spec_defaults() {
        let (rt, _) = runtime(ExecutionOutcome::Success);
        let spec = rt.build_run_spec(&ctx()).unwrap();
        assert!(spec.is_detached());
        assert_eq!(spec.network(), Some("host"));
        assert_eq!(spec.mounts()[0].target, "/etc/password:ro");
        assert_eq!(
            spec.override_command(),
            Some(&["bash".to_string(), "/w/launch_container.sh".to_string()][..])
        );
        assert!(spec.cgroup_parent().is_none());
    }

    #[tokio::test]
    async fn test_launch_success() {
        let (rt, exec) = runtime(ExecutionOutcome::Success);
        rt.launch(&ctx()).await.unwrap();
        let calls = exec.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][11], "/tmp/docker.c1.cmd");
    }

    #[tokio::test]
    async fn test_signal_vector() {
        let (rt, exec) = runtime(ExecutionOutcome::Success);
        let sctx = SignalContext::builder()
            .run_as_user("nobody")
            .user("alice")
            .pid(123)
            .signal(Signal::Kill)
            .build()
            .unwrap();
        rt.signal(&sctx).await.unwrap();
        let calls = exec.calls.lock().unwrap();
        assert_eq!(calls[0][3], "123");
        assert_eq!(calls[0][4], "9");
    }
}
