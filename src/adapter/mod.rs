//! Process-backed adapter channel.
//!
//! Turns a declarative adapter description into a running child process
//! connected to a protocol session:
//!
//! - `descriptor`: platform-keyed launch descriptions and their pure
//!   resolution into a concrete command/argument pair.
//! - `spawner`: validated child spawn, stderr forwarding, exit monitoring.
//! - `terminate`: platform-selected termination strategies.
//! - `channel`: assembly of the above plus the stream transport.

pub mod channel;
pub mod descriptor;
pub mod spawner;
pub mod terminate;

pub use channel::{AdapterChannel, ChannelConfig};
pub use descriptor::{AdapterDescription, Executable, HostPlatform, PlatformSpec};
