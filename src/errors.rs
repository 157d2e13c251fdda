//! Error types shared across the crate.

use std::fmt::{Display, Formatter};

/// Shared crate result type.
pub type Result<T> = std::result::Result<T, DapError>;

/// Error enumeration covering all failure modes of an adapter session.
#[derive(Debug)]
pub enum DapError {
    /// Protocol framing violation or unparsable message body.
    Protocol(String),
    /// Caller misuse detected at runtime, such as registering a second
    /// handler or sending a response twice.
    Misuse(String),
    /// Adapter executable could not be resolved or spawned.
    Launch(String),
    /// OS-level failure of the running adapter process.
    Process(String),
    /// The termination operation itself failed.
    Terminate(String),
    /// JSON serialization failure on the outbound path.
    Json(String),
    /// Underlying stream I/O failure.
    Io(String),
}

impl Display for DapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Protocol(msg) => write!(f, "protocol: {msg}"),
            Self::Misuse(msg) => write!(f, "misuse: {msg}"),
            Self::Launch(msg) => write!(f, "launch: {msg}"),
            Self::Process(msg) => write!(f, "process: {msg}"),
            Self::Terminate(msg) => write!(f, "terminate: {msg}"),
            Self::Json(msg) => write!(f, "json: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for DapError {}

impl From<std::io::Error> for DapError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DapError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}
