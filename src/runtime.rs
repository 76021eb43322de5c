//! Container runtime trait - the surface exposed to the node manager.
//!
//! A runtime handles four per-container operations:
//! - `prepare`: Pre-launch hook
//! - `launch`: Start the container
//! - `signal`: Deliver a signal to the container's process
//! - `reap`: Post-exit cleanup hook
//!
//! # Stateless Operations
//!
//! Implementations hold no per-container state. Every call is keyed by the
//! context passed in, so calls for different containers are independent and
//! may run concurrently. Ordering between a launch and a signal for the same
//! container is the caller's responsibility.

use crate::context::{LaunchContext, SignalContext};
use crate::error::Result;
use async_trait::async_trait;

// =============================================================================
// Signals
// =============================================================================

/// Signal to deliver to a container process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    /// Signal 0: liveness check, nothing is delivered.
    Null,
    /// SIGQUIT (thread dump on JVMs).
    Quit,
    /// SIGKILL (force kill).
    Kill,
    /// SIGTERM (graceful shutdown).
    Term,
    /// SIGHUP (hangup).
    Hup,
    /// SIGINT (interrupt).
    Int,
}

impl Signal {
    /// Returns the signal number.
    #[cfg(unix)]
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::Null => 0,
            Self::Quit => libc::SIGQUIT,
            Self::Kill => libc::SIGKILL,
            Self::Term => libc::SIGTERM,
            Self::Hup => libc::SIGHUP,
            Self::Int => libc::SIGINT,
        }
    }

    #[cfg(not(unix))]
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::Null => 0,
            Self::Quit => 3,
            Self::Kill => 9,
            Self::Term => 15,
            Self::Hup => 1,
            Self::Int => 2,
        }
    }

    /// Parses from signal name (e.g., "SIGTERM", "TERM", "15").
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.to_uppercase();
        let s = s.strip_prefix("SIG").unwrap_or(&s);
        match s {
            "NULL" | "0" => Some(Self::Null),
            "QUIT" | "3" => Some(Self::Quit),
            "KILL" | "9" => Some(Self::Kill),
            "TERM" | "15" => Some(Self::Term),
            "HUP" | "1" => Some(Self::Hup),
            "INT" | "2" => Some(Self::Int),
            _ => None,
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Quit => write!(f, "SIGQUIT"),
            Self::Kill => write!(f, "SIGKILL"),
            Self::Term => write!(f, "SIGTERM"),
            Self::Hup => write!(f, "SIGHUP"),
            Self::Int => write!(f, "SIGINT"),
        }
    }
}

// =============================================================================
// Container Runtime Trait
// =============================================================================

/// Per-container operations the node manager drives.
///
/// # Lifecycle
///
/// ```text
/// prepare(ctx) → launch(ctx) → [signal(ctx)...] → reap(ctx)
/// ```
///
/// # Implementations
///
/// - `DockerContainerRuntime`: Docker containers via the privileged helper
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Returns the runtime name.
    fn name(&self) -> &str;

    /// Runs before launch. Must not fail for a valid context.
    async fn prepare(&self, ctx: &LaunchContext) -> Result<()>;

    /// Launches the container described by `ctx`.
    ///
    /// Returns once the helper has exited. A failed launch leaves no
    /// container running.
    async fn launch(&self, ctx: &LaunchContext) -> Result<()>;

    /// Delivers `ctx.signal` to `ctx.pid`.
    async fn signal(&self, ctx: &SignalContext) -> Result<()>;

    /// Runs after the container exits. Must not fail for a valid context.
    async fn reap(&self, ctx: &LaunchContext) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_parsing() {
        assert_eq!(Signal::parse("SIGTERM"), Some(Signal::Term));
        assert_eq!(Signal::parse("TERM"), Some(Signal::Term));
        assert_eq!(Signal::parse("15"), Some(Signal::Term));
        assert_eq!(Signal::parse("sigkill"), Some(Signal::Kill));
        assert_eq!(Signal::parse("9"), Some(Signal::Kill));
        assert_eq!(Signal::parse("0"), Some(Signal::Null));
        assert_eq!(Signal::parse("INVALID"), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_signal_numbers() {
        assert_eq!(Signal::Null.as_i32(), 0);
        assert_eq!(Signal::Kill.as_i32(), 9);
        assert_eq!(Signal::Term.as_i32(), 15);
        assert_eq!(Signal::Quit.as_i32(), 3);
    }
}
