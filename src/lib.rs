//! # docklaunch
//!
//! **Docker Container Runtime Adapter for a Privileged Helper**
//!
//! This crate turns a node manager's "launch this container" request into a
//! `docker run` command and hands it to a setuid helper binary
//! (`container-executor`) to execute as the target user. The calling process
//! never runs docker itself and never needs elevated privileges.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           docklaunch                                │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────────┐    │
//! │  │                  ContainerRuntime Trait                     │    │
//! │  │      prepare(ctx) → launch(ctx) → signal(ctx) → reap(ctx)   │    │
//! │  └─────────────────────────────────────────────────────────────┘    │
//! │                              │                                      │
//! │  ┌───────────────────────────┼───────────────────────────────┐      │
//! │  │               Run Specification Building                  │      │
//! │  │  Image from env │ Identity mounts │ Launch script override │      │
//! │  │  Optional cgroup parent (opt-in)                          │      │
//! │  └───────────────────────────┼───────────────────────────────┘      │
//! │                              │                                      │
//! │  ┌───────────────────────────┼───────────────────────────────┐      │
//! │  │                  Engine Client                            │      │
//! │  │  RunSpecification → nm-docker-cmds/docker.<id>.*.cmd      │      │
//! │  └───────────────────────────┼───────────────────────────────┘      │
//! │                              │                                      │
//! │  ┌───────────────────────────┼───────────────────────────────┐      │
//! │  │              Privileged Helper Dispatch                   │      │
//! │  │  LaunchInvocation (13+1 args) │ SignalInvocation (5 args)  │      │
//! │  └───────────────────────────────────────────────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Error Model
//!
//! | Error                      | Raised when                                  |
//! |----------------------------|----------------------------------------------|
//! | `MissingConfiguration`     | Image variable absent; nothing spawned       |
//! | `LaunchFailed`             | Helper exited non-zero on launch             |
//! | `SignalFailed`             | Helper exited non-zero on signal             |
//! | `ResourceIsolationFailure` | cgroup path lookup failed                    |
//! | `DispatchFailure`          | Helper could not be spawned                  |
//!
//! Helper exit code, stdout and stderr are carried unmodified. Nothing is
//! retried.
//!
//! # Example
//!
//! ```rust,ignore
//! use docklaunch::{ContainerRuntime, DockerContainerRuntime, LaunchContext, RuntimeConfig};
//!
//! #[tokio::main]
//! async fn main() -> docklaunch::Result<()> {
//!     let runtime = DockerContainerRuntime::initialize(RuntimeConfig::default())?;
//!     let ctx: LaunchContext = LaunchContext::builder()
//!         // ... attributes from the node manager
//!         .build()?;
//!     runtime.launch(&ctx).await
//! }
//! ```

pub mod config;
pub mod constants;
pub mod context;
pub mod engine;
pub mod error;
pub mod isolation;
pub mod mounts;
pub mod privileged;
pub mod run_spec;
pub mod runtime;

pub mod runtimes;

// Re-exports
pub use config::RuntimeConfig;
pub use context::{LaunchContext, LaunchContextBuilder, SignalContext, SignalContextBuilder};
pub use engine::{DockerClient, EngineClient};
pub use error::{Error, Result};
pub use isolation::{CgroupPathResolver, CgroupsHandler, add_cgroup_parent_if_required};
pub use mounts::{MountBinding, assemble_mounts};
pub use privileged::{
    ContainerExecutor, ExecutionOutcome, HelperInvocation, LaunchInvocation, PrivilegedExecutor,
    RunAsUserCommand, SignalInvocation,
};
pub use run_spec::RunSpecification;
pub use runtime::{ContainerRuntime, Signal};
pub use runtimes::{DockerContainerRuntime, is_docker_container_requested};
