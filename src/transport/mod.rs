//! Byte-stream transport for protocol messages.
//!
//! Realizes message transmission as `Content-Length` framing over a pair of
//! byte streams — inbound readable, outbound writable — and feeds parsed
//! messages into the [`crate::protocol::ProtocolSession`] above it:
//!
//! - `codec`: the framing [`Decoder`](tokio_util::codec::Decoder) /
//!   [`Encoder`](tokio_util::codec::Encoder) pair.
//! - `reader`: async task pumping inbound frames into the session.
//! - `writer`: async task draining the session's outbound channel.

pub mod codec;
pub mod reader;
pub mod writer;

pub use codec::DapCodec;
