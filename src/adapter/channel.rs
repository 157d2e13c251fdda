//! Process-backed adapter channel assembly.
//!
//! [`AdapterChannel::start`] turns a declarative [`AdapterDescription`]
//! into a running child process wired to a [`ProtocolSession`]: resolve the
//! executable, spawn, tee stderr, monitor exit, and bind the child's
//! stdout/stdin to the framed transport's reader/writer tasks.
//! [`AdapterChannel::stop`] delegates to the termination strategy selected
//! for the host platform at construction.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::adapter::descriptor::{AdapterDescription, HostPlatform};
use crate::adapter::spawner::{forward_stderr, monitor_exit, spawn_adapter};
use crate::adapter::terminate::{platform_strategy, Terminate};
use crate::protocol::session::{ProtocolSession, SessionEvent};
use crate::transport::{reader, writer};
use crate::{DapError, Result};

/// Capacity of the outbound message and session event channels.
const CHANNEL_CAPACITY: usize = 64;

/// Configuration for starting an adapter channel.
#[derive(Debug)]
pub struct ChannelConfig {
    /// Declarative launch description, typically deserialized from the
    /// adapter's manifest.
    pub description: AdapterDescription,
    /// Root directory that relative program paths resolve against.
    pub extension_root: PathBuf,
    /// Optional sink receiving the adapter's stderr lines.
    pub stderr_sink: Option<mpsc::Sender<String>>,
}

/// A running adapter process bound to a protocol session.
pub struct AdapterChannel {
    session: ProtocolSession,
    terminator: Box<dyn Terminate>,
    pid: u32,
    cancel: CancellationToken,
    _tasks: Vec<JoinHandle<()>>,
}

impl AdapterChannel {
    /// Resolve, spawn, and wire the adapter described by `config`.
    ///
    /// Returns the channel handle together with the receiver for session
    /// error/exit events.
    ///
    /// # Errors
    ///
    /// Returns [`DapError::Launch`] when the executable cannot be resolved,
    /// the process fails to spawn, or its stdio cannot be captured.
    pub fn start(config: ChannelConfig) -> Result<(Self, mpsc::Receiver<SessionEvent>)> {
        let executable = config
            .description
            .resolve(HostPlatform::current(), &config.extension_root)?;
        let mut child = spawn_adapter(&executable)?;

        let pid = child
            .id()
            .ok_or_else(|| DapError::Launch("adapter process has no pid".into()))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| DapError::Launch("failed to capture adapter stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DapError::Launch("failed to capture adapter stdout".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DapError::Launch("failed to capture adapter stderr".into()))?;

        let (outbound_tx, outbound_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let session = ProtocolSession::new(outbound_tx, event_tx);
        let cancel = CancellationToken::new();

        let mut tasks = Vec::with_capacity(4);
        tasks.push(forward_stderr(stderr, config.stderr_sink, cancel.clone()));
        tasks.push(monitor_exit(child, session.clone(), cancel.clone()));
        {
            let session = session.clone();
            let cancel = cancel.clone();
            tasks.push(tokio::spawn(async move {
                if let Err(err) = reader::run_reader(stdout, session, cancel).await {
                    debug!(error = %err, "adapter reader task ended with error");
                }
            }));
        }
        {
            let session = session.clone();
            let cancel = cancel.clone();
            tasks.push(tokio::spawn(async move {
                if let Err(err) = writer::run_writer(stdin, outbound_rx, session, cancel).await {
                    debug!(error = %err, "adapter writer task ended with error");
                }
            }));
        }

        Ok((
            Self {
                session,
                terminator: platform_strategy(),
                pid,
                cancel,
                _tasks: tasks,
            },
            event_rx,
        ))
    }

    /// The protocol session bound to this adapter process.
    #[must_use]
    pub fn session(&self) -> &ProtocolSession {
        &self.session
    }

    /// Process id of the spawned adapter.
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Terminate the adapter process using the platform strategy.
    ///
    /// On Windows the whole process tree is force-killed and the kill
    /// operation awaited. Elsewhere a termination signal is sent and this
    /// returns immediately — the child may still be shutting down, and
    /// inbound messages already buffered continue to be delivered until its
    /// streams close.
    ///
    /// # Errors
    ///
    /// Returns [`DapError::Terminate`] when the kill operation itself
    /// fails.
    pub async fn stop(&self) -> Result<()> {
        self.terminator.terminate(self.pid).await
    }

    /// Tear the channel down: clear session handlers and pending calls,
    /// then cancel the transport and monitor tasks. Safe to call more than
    /// once.
    pub async fn dispose(&self) {
        self.session.dispose().await;
        self.cancel.cancel();
    }
}
