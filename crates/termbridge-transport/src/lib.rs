//! # termbridge-transport
//!
//! Transport layer for the terminal session bridge.
//!
//! This crate provides:
//! - The [`ProcessHost`]/[`HostLink`] traits abstracting the remote process host
//! - The [`Channel`]: one duplex event stream per session
//! - A newline-delimited JSON wire codec for the host protocol
//! - [`StreamHost`]: a `ProcessHost` over any async duplex byte stream
//! - [`ScriptedHost`]: an in-memory host double for tests
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends only on termbridge-core
//! and carries process I/O between the client and the remote host. Process
//! execution itself lives behind the [`ProcessHost`] seam.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod host;
pub mod stream;
pub mod testing;
pub mod wire;

// Re-export commonly used types
pub use channel::{Channel, ChannelStats};
pub use host::{ConnectFuture, HostLink, ProcessHost};
pub use stream::StreamHost;
pub use testing::ScriptedHost;
