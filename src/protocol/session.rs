//! Protocol session — sequencing, correlation, and dispatch.
//!
//! A [`ProtocolSession`] owns the monotonic sequence counter and the
//! pending-call table for one conversation with an adapter. It is
//! transport-agnostic: outbound messages are handed to an [`mpsc::Sender`]
//! drained by whatever transport was wired at construction, and inbound
//! messages arrive through [`ProtocolSession::accept_message`]. Transport
//! errors and adapter process exit reach the host through the
//! [`SessionEvent`] channel.
//!
//! There is no timeout or cancellation for outstanding requests: a request
//! whose response never arrives keeps its slot in the pending table until
//! [`ProtocolSession::dispose`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::debug;

use crate::protocol::messages::{EventMessage, ProtocolMessage, RequestMessage, ResponseMessage};
use crate::{DapError, Result};

/// Callback invoked for each inbound request when registered.
pub type RequestHandler = Box<dyn Fn(RequestMessage) + Send + Sync>;

/// Callback invoked for each inbound event when registered.
pub type EventHandler = Box<dyn Fn(EventMessage) + Send + Sync>;

/// Observable session-level notifications.
#[derive(Debug)]
pub enum SessionEvent {
    /// A transport, framing, or misuse error. Non-fatal: the session keeps
    /// operating and the host decides whether to tear it down.
    Error(DapError),
    /// The backing adapter process terminated.
    Exited {
        /// Process exit code, when the process exited normally.
        code: Option<i32>,
        /// Terminating signal number, when killed by a signal (unix).
        signal: Option<i32>,
    },
}

/// Pending-call table: outstanding request seq → single-use completion.
type PendingCalls = Arc<Mutex<HashMap<u64, oneshot::Sender<ResponseMessage>>>>;

/// Transport-agnostic protocol session.
///
/// Cheaply cloneable — all mutable state lives behind [`Arc`]s, so the
/// transport tasks and the host can share one session.
#[derive(Clone)]
pub struct ProtocolSession {
    /// Monotonic counter shared by requests and responses, starting at 1.
    next_seq: Arc<AtomicU64>,
    /// Outstanding requests awaiting a correlated response.
    pending: PendingCalls,
    /// At most one inbound request handler.
    request_handler: Arc<Mutex<Option<RequestHandler>>>,
    /// At most one inbound event handler.
    event_handler: Arc<Mutex<Option<EventHandler>>>,
    /// Outbound channel drained by the transport writer.
    outbound: mpsc::Sender<ProtocolMessage>,
    /// Error/exit notification channel observed by the host.
    events: mpsc::Sender<SessionEvent>,
}

impl ProtocolSession {
    /// Create a session that transmits through `outbound` and reports
    /// errors and process exit through `events`.
    #[must_use]
    pub fn new(outbound: mpsc::Sender<ProtocolMessage>, events: mpsc::Sender<SessionEvent>) -> Self {
        Self {
            next_seq: Arc::new(AtomicU64::new(1)),
            pending: Arc::new(Mutex::new(HashMap::new())),
            request_handler: Arc::new(Mutex::new(None)),
            event_handler: Arc::new(Mutex::new(None)),
            outbound,
            events,
        }
    }

    /// Send a request, optionally registering a completion for its response.
    ///
    /// Assigns the next sequence number, registers `reply` in the pending
    /// table under that number (before transmitting, so a fast response
    /// cannot race the registration), and hands the message to the
    /// transport. Empty payloads (`null` or `{}`) are stripped so no
    /// `arguments` field reaches the wire.
    ///
    /// Returns the assigned sequence number.
    ///
    /// # Errors
    ///
    /// Returns [`DapError::Io`] when the transport writer has shut down;
    /// the pending registration is rolled back in that case.
    pub async fn send_request(
        &self,
        command: &str,
        arguments: Option<Value>,
        reply: Option<oneshot::Sender<ResponseMessage>>,
    ) -> Result<u64> {
        let seq = self.assign_seq();
        let arguments = arguments.filter(|value| !is_empty_payload(value));

        if let Some(tx) = reply {
            self.pending.lock().await.insert(seq, tx);
        }

        let message = ProtocolMessage::Request(RequestMessage {
            seq,
            command: command.to_owned(),
            arguments,
        });

        if let Err(err) = self.transmit(message).await {
            self.pending.lock().await.remove(&seq);
            return Err(err);
        }

        Ok(seq)
    }

    /// Send a request and obtain a receiver for its eventual response.
    ///
    /// The receiver resolves whenever the adapter answers — responses may
    /// arrive in any order relative to other in-flight requests. A request
    /// that is never answered keeps its slot until [`ProtocolSession::dispose`],
    /// at which point the receiver observes channel closure.
    ///
    /// # Errors
    ///
    /// Returns [`DapError::Io`] when the transport writer has shut down.
    pub async fn request(
        &self,
        command: &str,
        arguments: Option<Value>,
    ) -> Result<oneshot::Receiver<ResponseMessage>> {
        let (tx, rx) = oneshot::channel();
        self.send_request(command, arguments, Some(tx)).await?;
        Ok(rx)
    }

    /// Send a response built with [`ResponseMessage::reply_to`] or
    /// [`ResponseMessage::reject`].
    ///
    /// A response whose sequence number is already assigned has been sent
    /// once before; the duplicate raises [`DapError::Misuse`] through the
    /// error event and is not transmitted. This detects programmer misuse
    /// on this side, not a protocol violation by the adapter.
    ///
    /// # Errors
    ///
    /// Returns [`DapError::Io`] when the transport writer has shut down.
    pub async fn send_response(&self, response: &mut ResponseMessage) -> Result<()> {
        if response.seq != 0 {
            self.report_error(DapError::Misuse(format!(
                "attempt to send more than one response for command '{}'",
                response.command
            )))
            .await;
            return Ok(());
        }

        response.seq = self.assign_seq();
        self.transmit(ProtocolMessage::Response(response.clone())).await
    }

    /// Register the handler for inbound requests.
    ///
    /// Exactly one handler may be registered per session; a second
    /// registration keeps the first and raises [`DapError::Misuse`] through
    /// the error event.
    pub async fn on_request(&self, handler: RequestHandler) {
        let mut slot = self.request_handler.lock().await;
        if slot.is_some() {
            drop(slot);
            self.report_error(DapError::Misuse(
                "request handler already registered".into(),
            ))
            .await;
            return;
        }
        *slot = Some(handler);
    }

    /// Register the handler for inbound events.
    ///
    /// Exactly one handler may be registered per session; a second
    /// registration keeps the first and raises [`DapError::Misuse`] through
    /// the error event.
    pub async fn on_event(&self, handler: EventHandler) {
        let mut slot = self.event_handler.lock().await;
        if slot.is_some() {
            drop(slot);
            self.report_error(DapError::Misuse("event handler already registered".into()))
                .await;
            return;
        }
        *slot = Some(handler);
    }

    /// Single inbound dispatch entry point.
    ///
    /// Events and requests go to their registered handler, or are dropped
    /// when none is registered. A response is matched against the pending
    /// table by `request_seq` with find-and-remove semantics — its
    /// completion fires exactly once. Responses with no matching pending
    /// call are dropped silently: stale or duplicate delivery is not an
    /// error.
    pub async fn accept_message(&self, message: ProtocolMessage) {
        match message {
            ProtocolMessage::Event(event) => {
                let guard = self.event_handler.lock().await;
                if let Some(handler) = guard.as_ref() {
                    handler(event);
                }
            }
            ProtocolMessage::Request(request) => {
                let guard = self.request_handler.lock().await;
                if let Some(handler) = guard.as_ref() {
                    handler(request);
                }
            }
            ProtocolMessage::Response(response) => {
                let reply = self.pending.lock().await.remove(&response.request_seq);
                match reply {
                    Some(tx) => {
                        // Completion is best-effort: the caller may have
                        // dropped the receiver.
                        let _ = tx.send(response);
                    }
                    None => {
                        debug!(
                            request_seq = response.request_seq,
                            "dropping response with no pending call"
                        );
                    }
                }
            }
        }
    }

    /// Report a non-fatal session error to the host.
    pub async fn report_error(&self, error: DapError) {
        if self.events.send(SessionEvent::Error(error)).await.is_err() {
            debug!("session event channel closed, error notification dropped");
        }
    }

    /// Report adapter process termination to the host.
    pub async fn report_exit(&self, code: Option<i32>, signal: Option<i32>) {
        if self
            .events
            .send(SessionEvent::Exited { code, signal })
            .await
            .is_err()
        {
            debug!("session event channel closed, exit notification dropped");
        }
    }

    /// Drop registered handlers and all outstanding pending calls.
    ///
    /// Safe to call more than once. Pending reply receivers observe channel
    /// closure.
    pub async fn dispose(&self) {
        self.request_handler.lock().await.take();
        self.event_handler.lock().await.take();
        self.pending.lock().await.clear();
    }

    /// Assign the next sequence number. Requests and responses draw from
    /// the same counter.
    fn assign_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    async fn transmit(&self, message: ProtocolMessage) -> Result<()> {
        self.outbound
            .send(message)
            .await
            .map_err(|_| DapError::Io("transport writer has shut down".into()))
    }
}

/// A payload that must not appear on the wire: `null` or an empty object.
fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
