//! Container runtime implementations.
//!
//! Each runtime implements [`ContainerRuntime`](crate::runtime::ContainerRuntime)
//! for one container technology and holds no per-container state.

pub mod docker;

pub use self::docker::{DockerContainerRuntime, is_docker_container_requested};
