//! Adapter process spawning, stderr forwarding, and exit monitoring.
//!
//! [`spawn_adapter`] validates and launches a resolved [`Executable`] with
//! fully piped stdio and `kill_on_drop(true)` so an abandoned child never
//! outlives the channel. [`forward_stderr`] tees the child's diagnostic
//! output, line by line, to an optional sink. [`monitor_exit`] awaits
//! process termination and raises the session exit event.

use std::path::Path;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::adapter::descriptor::Executable;
use crate::protocol::session::ProtocolSession;
use crate::{DapError, Result};

/// Commands recognized as in-host scripting runtimes.
///
/// The original host environment could fork these in-process; this channel
/// spawns them as ordinary children, but a runtime invocation with nothing
/// to run is still rejected up front with a descriptive error.
const SCRIPT_RUNTIMES: &[&str] = &["node", "node.exe"];

/// Spawn the resolved adapter executable with piped stdio.
///
/// # Errors
///
/// Returns [`DapError::Launch`] for an empty command, a scripting runtime
/// invoked without arguments, or an OS-level spawn failure.
pub fn spawn_adapter(executable: &Executable) -> Result<Child> {
    if executable.command.is_empty() {
        return Err(DapError::Launch("adapter executable is not specified".into()));
    }
    if is_script_runtime(&executable.command) && executable.args.is_empty() {
        return Err(DapError::Launch(format!(
            "runtime '{}' given nothing to run: adapter description provides no arguments",
            executable.command
        )));
    }

    let mut cmd = Command::new(&executable.command);
    cmd.args(&executable.args)
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|err| {
        DapError::Launch(format!(
            "failed to spawn adapter '{}': {err}",
            executable.command
        ))
    })?;

    info!(command = executable.command.as_str(), "adapter process spawned");
    Ok(child)
}

/// Spawn a task forwarding the child's stderr, line by line, to `sink`.
///
/// Trailing CR/LF is stripped from each line. With no sink, lines are
/// logged at `DEBUG` and otherwise discarded. The task ends at stderr EOF,
/// when the sink closes, or on cancellation.
#[must_use]
pub fn forward_stderr(
    stderr: ChildStderr,
    sink: Option<mpsc::Sender<String>>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => break,

                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            let line = line.trim_end_matches(['\r', '\n']).to_owned();
                            match &sink {
                                Some(tx) => {
                                    if tx.send(line).await.is_err() {
                                        debug!("diagnostics sink closed, stopping stderr forwarder");
                                        break;
                                    }
                                }
                                None => debug!(line = line.as_str(), "adapter stderr"),
                            }
                        }
                        Ok(None) => break,
                        Err(err) => {
                            warn!(error = %err, "error reading adapter stderr");
                            break;
                        }
                    }
                }
            }
        }
    })
}

/// Spawn a task that awaits child exit and raises the session exit event.
///
/// Cancellation detaches the monitor without emitting an event — the caller
/// owns orderly shutdown on that path. Dropping the child on cancellation
/// also reaps it via `kill_on_drop`.
#[must_use]
pub fn monitor_exit(
    mut child: Child,
    session: ProtocolSession,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = child.wait() => {
                match result {
                    Ok(status) => {
                        let code = status.code();
                        let signal = exit_signal(&status);
                        info!(?code, ?signal, "adapter process exited");
                        session.report_exit(code, signal).await;
                    }
                    Err(err) => {
                        warn!(error = %err, "error waiting for adapter process");
                        session
                            .report_error(DapError::Process(format!(
                                "wait for adapter failed: {err}"
                            )))
                            .await;
                    }
                }
            }
            () = cancel.cancelled() => {
                debug!("exit monitor cancelled");
            }
        }
    })
}

/// Whether `command` names a known in-host scripting runtime.
fn is_script_runtime(command: &str) -> bool {
    Path::new(command)
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| SCRIPT_RUNTIMES.contains(&name))
}

/// Terminating signal number, where the platform reports one.
#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}

// ── Tests ─────────────────────────────────────────────────────────────────────
