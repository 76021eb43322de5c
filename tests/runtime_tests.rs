//! Tests for signals, container type detection and configuration.

use docklaunch::constants::ENV_CONTAINER_TYPE;
use docklaunch::{RuntimeConfig, Signal, is_docker_container_requested};
use std::collections::HashMap;

// =============================================================================
// Signal Tests
// =============================================================================

#[test]
fn test_signal_display() {
    assert_eq!(format!("{}", Signal::Term), "SIGTERM");
    assert_eq!(format!("{}", Signal::Kill), "SIGKILL");
    assert_eq!(format!("{}", Signal::Quit), "SIGQUIT");
    assert_eq!(format!("{}", Signal::Null), "NULL");
}

#[test]
fn test_signal_parse_roundtrip_by_number() {
    for signal in [
        Signal::Null,
        Signal::Quit,
        Signal::Kill,
        Signal::Term,
        Signal::Hup,
        Signal::Int,
    ] {
        let parsed = Signal::parse(&signal.as_i32().to_string());
        assert_eq!(parsed, Some(signal));
    }
}

#[test]
fn test_signal_serialization() {
    let json = serde_json::to_string(&Signal::Kill).unwrap();
    assert_eq!(json, "\"KILL\"");

    let signal: Signal = serde_json::from_str("\"TERM\"").unwrap();
    assert_eq!(signal, Signal::Term);
}

// =============================================================================
// Container Type Detection
// =============================================================================

#[test]
fn test_docker_requested() {
    let mut env = HashMap::new();
    env.insert(ENV_CONTAINER_TYPE.to_string(), "docker".to_string());
    assert!(is_docker_container_requested(&env));
}

#[test]
fn test_docker_not_requested() {
    assert!(!is_docker_container_requested(&HashMap::new()));

    let mut env = HashMap::new();
    env.insert(ENV_CONTAINER_TYPE.to_string(), "Docker".to_string());
    assert!(!is_docker_container_requested(&env), "match is exact");
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_config_from_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("docklaunch.toml");
    std::fs::write(
        &path,
        "container_executor_path = \"/opt/hadoop/bin/container-executor\"\n\
         tmp_dir = \"/var/tmp\"\n",
    )
    .unwrap();

    let config = RuntimeConfig::from_file(&path).unwrap();
    assert_eq!(
        config.container_executor_path,
        std::path::PathBuf::from("/opt/hadoop/bin/container-executor")
    );
    assert_eq!(config.tmp_dir, std::path::PathBuf::from("/var/tmp"));
    assert!(!config.cgroup_parent_enabled, "cgroup parent stays opt-in");
}

#[test]
fn test_config_missing_file() {
    let err = RuntimeConfig::from_file(std::path::Path::new("/nonexistent/docklaunch.toml"));
    assert!(err.is_err());
}

#[tokio::test]
async fn test_initialize_creates_command_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let config = RuntimeConfig {
        tmp_dir: tmp.path().to_path_buf(),
        ..RuntimeConfig::default()
    };

    let runtime = docklaunch::DockerContainerRuntime::initialize(config).unwrap();

    assert!(tmp.path().join("nm-docker-cmds").is_dir());
    assert!(!runtime.config().cgroup_parent_enabled);
}

#[test]
fn test_render_only_creates_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let config = RuntimeConfig {
        tmp_dir: tmp.path().to_path_buf(),
        ..RuntimeConfig::default()
    };

    let runtime = docklaunch::DockerContainerRuntime::render_only(config).unwrap();
    let ctx = docklaunch::LaunchContext::builder()
        .container_id("container_01")
        .app_id("app_01")
        .run_as_user("nobody")
        .user("alice")
        .container_work_dir("/w")
        .local_dirs(["/l"])
        .log_dirs(["/g"])
        .container_script_path("/p/launch_container.sh")
        .token_path("/p/tokens")
        .pid_file_path("/p/pid")
        .resources_options("cgroups=none")
        .env(docklaunch::constants::ENV_DOCKER_CONTAINER_IMAGE, "centos:7")
        .build()
        .unwrap();

    let spec = runtime.build_run_spec(&ctx).unwrap();
    let command = spec.command_with_arguments().unwrap();
    assert!(command.ends_with("centos:7 bash /w/launch_container.sh"));
    assert!(!tmp.path().join("nm-docker-cmds").exists());
}
