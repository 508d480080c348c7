//! Traits abstracting the remote process host.
//!
//! The host is the external service that actually spawns and manages
//! processes/PTYs. The bridge only ever talks to it through these seams,
//! which keeps process execution out of this workspace entirely.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc::UnboundedSender;

use termbridge_core::{ClientEvent, HostEvent, Result, StartRequest};

/// Future returned by [`ProcessHost::connect`].
pub type ConnectFuture<'a> = Pin<Box<dyn Future<Output = Result<Box<dyn HostLink>>> + Send + 'a>>;

/// A remote process host capable of starting processes on request.
///
/// The returned future completing successfully is the `start`
/// acknowledgement: the remote process exists and its events will flow into
/// `events`. A failed future is a connection error, never a process exit.
pub trait ProcessHost: Send + Sync {
    /// Establish a fresh connection and start the requested process.
    ///
    /// Events produced by the remote process are delivered through `events`
    /// in the order the process produced them. The host never reconnects a
    /// link on its own; every reconnection is a fresh `connect` call.
    fn connect(
        &self,
        request: StartRequest,
        events: UnboundedSender<HostEvent>,
    ) -> ConnectFuture<'_>;
}

/// Client side of one established host connection.
pub trait HostLink: Send {
    /// Forward a client event (input or resize) to the remote process.
    fn send(&mut self, event: ClientEvent) -> Result<()>;

    /// Tear the connection down. Safe to call more than once.
    fn close(&mut self);
}
