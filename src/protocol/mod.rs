//! Transport-agnostic protocol session layer.
//!
//! This module owns everything above the byte stream: the wire message
//! envelopes and the session that sequences, correlates, and dispatches
//! them. How messages move is the transport's concern (see
//! [`crate::transport`]); the session only requires an outbound channel to
//! hand messages to and feeds on whatever the transport delivers to
//! [`session::ProtocolSession::accept_message`].

pub mod messages;
pub mod session;

pub use messages::{EventMessage, ProtocolMessage, RequestMessage, ResponseMessage};
pub use session::{ProtocolSession, SessionEvent};
