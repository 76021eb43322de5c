//! docklaunch - launch and signal docker containers through container-executor
//!
//! ## Usage
//!
//! ```sh
//! docklaunch [--config <toml>] launch --context <launch-context.json>
//! docklaunch [--config <toml>] render --context <launch-context.json>
//! docklaunch [--config <toml>] signal --run-as-user <u> --user <u> --pid <pid> [--signal TERM]
//! ```
//!
//! `render` prints the docker command that `launch` would hand to the helper
//! without writing a command file or invoking the helper.
//!
//! Helper failures exit with the helper's exit code after printing its
//! captured stdout/stderr.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use docklaunch::{
    ContainerRuntime, DockerContainerRuntime, Error, LaunchContext, RuntimeConfig, Signal,
    SignalContext,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

// =============================================================================
// CLI Parsing
// =============================================================================

#[derive(Debug, Parser)]
#[command(name = "docklaunch", version, about)]
struct Cli {
    /// Runtime configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Launch a container described by a JSON launch context.
    Launch {
        #[arg(long)]
        context: PathBuf,
    },
    /// Print the docker run command for a launch context.
    Render {
        #[arg(long)]
        context: PathBuf,
    },
    /// Deliver a signal to a container process.
    Signal {
        #[arg(long)]
        run_as_user: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        pid: u32,
        /// Signal name or number (TERM, KILL, QUIT, 9, ...).
        #[arg(long, default_value = "TERM")]
        signal: String,
        #[arg(long)]
        container_id: Option<String>,
    },
}

// =============================================================================
// Commands
// =============================================================================

fn load_config(path: Option<&Path>) -> Result<RuntimeConfig> {
    match path {
        Some(p) => RuntimeConfig::from_file(p).with_context(|| format!("loading {}", p.display())),
        None => Ok(RuntimeConfig::default()),
    }
}

fn load_launch_context(path: &Path) -> Result<LaunchContext> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading launch context {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing launch context {}", path.display()))
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Launch { context } => {
            let ctx = load_launch_context(&context)?;
            let runtime = DockerContainerRuntime::initialize(config)?;
            runtime.prepare(&ctx).await?;
            runtime.launch(&ctx).await?;
            println!("{}", ctx.container_id());
        }
        Command::Render { context } => {
            let ctx = load_launch_context(&context)?;
            let runtime = DockerContainerRuntime::render_only(config)?;
            let spec = runtime.build_run_spec(&ctx)?;
            println!("{}", spec.command_with_arguments()?);
        }
        Command::Signal {
            run_as_user,
            user,
            pid,
            signal,
            container_id,
        } => {
            let signal =
                Signal::parse(&signal).ok_or_else(|| anyhow!("unknown signal '{}'", signal))?;
            let mut builder = SignalContext::builder()
                .run_as_user(run_as_user)
                .user(user)
                .pid(pid)
                .signal(signal);
            if let Some(id) = container_id {
                builder = builder.container_id(id);
            }
            let ctx = builder.build()?;
            let runtime = DockerContainerRuntime::initialize(config)?;
            runtime.signal(&ctx).await?;
        }
    }
    Ok(())
}

/// Maps helper failures to the helper's own exit code.
fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<Error>() {
        Some(e) if e.exit_code().is_some() => {
            if let Some(out) = e.stdout().filter(|s| !s.is_empty()) {
                eprintln!("helper stdout:\n{}", out);
            }
            if let Some(out) = e.stderr().filter(|s| !s.is_empty()) {
                eprintln!("helper stderr:\n{}", out);
            }
            e.exit_code()
                .and_then(|c| u8::try_from(c).ok())
                .filter(|c| *c != 0)
                .map(ExitCode::from)
                .unwrap_or(ExitCode::FAILURE)
        }
        _ => ExitCode::FAILURE,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Failed to set tracing subscriber");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            exit_code_for(&e)
        }
    }
}
