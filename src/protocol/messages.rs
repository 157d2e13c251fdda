//! Wire-level protocol message envelopes.
//!
//! Messages are a tagged union over `Request`, `Response`, and `Event`,
//! serialized as JSON with a lowercase `type` discriminant. Payloads
//! (`arguments`, `body`) are opaque [`serde_json::Value`]s — the session
//! never inspects them, and optional fields are omitted from the wire
//! entirely when absent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One protocol message exchanged with the adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProtocolMessage {
    /// A command sent to the peer, answerable by a correlated response.
    Request(RequestMessage),
    /// The answer to a previously issued request.
    Response(ResponseMessage),
    /// An unsolicited notification.
    Event(EventMessage),
}

impl ProtocolMessage {
    /// The sender-assigned sequence number of this message.
    #[must_use]
    pub fn seq(&self) -> u64 {
        match self {
            Self::Request(m) => m.seq,
            Self::Response(m) => m.seq,
            Self::Event(m) => m.seq,
        }
    }
}

/// A request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestMessage {
    /// Sequence number assigned by the sending side.
    pub seq: u64,
    /// Command name; semantics are adapter-defined.
    pub command: String,
    /// Opaque command arguments. Never present on the wire when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

/// A response envelope, correlated to its request by `request_seq`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    /// Sequence number assigned by the sending side. A freshly built
    /// response carries `0` until the session assigns one on send.
    pub seq: u64,
    /// The `seq` of the request this response answers.
    pub request_seq: u64,
    /// Whether the request succeeded.
    pub success: bool,
    /// Command name copied from the request.
    pub command: String,
    /// Error text when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Opaque result or error payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl ResponseMessage {
    /// Build a success response answering `request`.
    ///
    /// The sequence number is left at `0`; the session assigns the real one
    /// when the response is sent.
    #[must_use]
    pub fn reply_to(request: &RequestMessage) -> Self {
        Self {
            seq: 0,
            request_seq: request.seq,
            success: true,
            command: request.command.clone(),
            message: None,
            body: None,
        }
    }

    /// Build a failure response answering `request` with an error message.
    #[must_use]
    pub fn reject(request: &RequestMessage, message: impl Into<String>) -> Self {
        Self {
            seq: 0,
            request_seq: request.seq,
            success: false,
            command: request.command.clone(),
            message: Some(message.into()),
            body: None,
        }
    }

    /// Attach an opaque body payload.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// An event envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    /// Sequence number assigned by the sending side.
    pub seq: u64,
    /// Event name; semantics are adapter-defined.
    pub event: String,
    /// Opaque event payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}
