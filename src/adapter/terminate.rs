//! Adapter termination strategies.
//!
//! Termination differs by host platform. On Windows, children can outlive
//! their parent as orphaned roots, so the whole process tree is force-killed
//! and the kill operation itself is awaited. Elsewhere a graceful signal is
//! sent directly to the child and the call returns without waiting for exit
//! confirmation.
//!
//! The two behaviors share one strategy interface, selected once per
//! channel at construction rather than branched inline at stop time.

use std::future::Future;
use std::pin::Pin;

use crate::Result;

/// Strategy interface for stopping a running adapter process.
pub trait Terminate: Send + Sync {
    /// Terminate the process identified by `pid`.
    ///
    /// # Errors
    ///
    /// Returns [`DapError::Terminate`](crate::DapError::Terminate) when the
    /// termination operation itself fails. A child that is already gone is
    /// reported the same way; callers treating stop as idempotent may
    /// ignore it.
    fn terminate(&self, pid: u32) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Pick the termination strategy for the running host.
#[cfg(windows)]
#[must_use]
pub fn platform_strategy() -> Box<dyn Terminate> {
    Box::new(TreeKill)
}

/// Pick the termination strategy for the running host.
#[cfg(unix)]
#[must_use]
pub fn platform_strategy() -> Box<dyn Terminate> {
    Box::new(SignalKill)
}

// ── Unix: graceful signal ─────────────────────────────────────────────────────

/// Graceful, fire-and-forget termination: SIGTERM straight to the child.
///
/// Resolves as soon as the signal is delivered — the child may still be
/// shutting down when this returns, and buffered protocol messages keep
/// flowing until its streams actually close.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalKill;

#[cfg(unix)]
impl Terminate for SignalKill {
    fn terminate(&self, pid: u32) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        use crate::DapError;

        Box::pin(async move {
            let raw = i32::try_from(pid)
                .map_err(|_| DapError::Terminate(format!("pid {pid} out of range")))?;
            kill(Pid::from_raw(raw), Signal::SIGTERM).map_err(|err| {
                DapError::Terminate(format!("failed to signal adapter process {pid}: {err}"))
            })
        })
    }
}

// ── Windows: forceful tree kill ───────────────────────────────────────────────

/// Forceful process-tree termination via `taskkill /F /T`.
///
/// Awaits the kill command's own exit and propagates its failure, so a
/// resolved stop means the tree kill actually ran to completion.
#[cfg(windows)]
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeKill;

#[cfg(windows)]
impl Terminate for TreeKill {
    fn terminate(&self, pid: u32) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        use crate::DapError;

        Box::pin(async move {
            let status = tokio::process::Command::new("taskkill")
                .args(["/F", "/T", "/PID", &pid.to_string()])
                .status()
                .await
                .map_err(|err| {
                    DapError::Terminate(format!("failed to run taskkill for {pid}: {err}"))
                })?;

            if status.success() {
                Ok(())
            } else {
                Err(DapError::Terminate(format!(
                    "taskkill for {pid} exited with {status}"
                )))
            }
        })
    }
}
