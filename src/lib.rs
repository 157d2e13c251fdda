#![forbid(unsafe_code)]

//! Client-side session and transport layer for conversing with an
//! out-of-process debug adapter over a framed byte stream.

pub mod adapter;
pub mod errors;
pub mod protocol;
pub mod transport;

pub use errors::{DapError, Result};
