//! The transport channel: one duplex event stream per session.

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info};

use termbridge_core::{ClientEvent, Error, Geometry, HostEvent, Result, StartRequest};

use crate::host::{HostLink, ProcessHost};

/// Byte and event accounting for one channel, logged on teardown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// Total output/stderr bytes received from the host
    pub bytes_in: u64,
    /// Total input bytes forwarded to the host
    pub bytes_out: u64,
    /// Number of resize events forwarded
    pub resize_events: u64,
}

/// A single logical duplex stream between the client and one remote process.
///
/// A channel is live from construction until [`Channel::close`] or drop.
/// Its owner holds at most one at a time; replacing it drops the old link,
/// which is the teardown path that prevents a reconnecting session from
/// leaking its previous stream.
pub struct Channel {
    link: Box<dyn HostLink>,
    events: UnboundedReceiver<HostEvent>,
    stats: ChannelStats,
    closed: bool,
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("stats", &self.stats)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Channel {
    /// Open a fresh channel against `host`.
    ///
    /// Suspends until the transport-level handshake completes or fails; a
    /// failure surfaces as [`Error::ConnectionFailed`], never as an exit.
    pub async fn open(host: &dyn ProcessHost, request: StartRequest) -> Result<Self> {
        debug!(
            "Opening channel: path='{}', command='{}'",
            request.path, request.command
        );
        let (tx, rx) = mpsc::unbounded_channel();
        let link = host.connect(request, tx).await?;

        Ok(Self {
            link,
            events: rx,
            stats: ChannelStats::default(),
            closed: false,
        })
    }

    /// Forward raw input bytes to the remote process stdin.
    pub fn send_input(&mut self, data: &[u8]) -> Result<usize> {
        if self.closed {
            return Err(Error::ChannelClosed);
        }
        self.link.send(ClientEvent::input(data.to_vec()))?;
        self.stats.bytes_out += data.len() as u64;
        Ok(data.len())
    }

    /// Forward new terminal dimensions to the remote PTY.
    ///
    /// Ill-formed geometry is rejected here as a last line of defense; it
    /// never reaches the link.
    pub fn resize(&mut self, geometry: Geometry) -> Result<()> {
        if !geometry.is_valid() {
            return Err(Error::InvalidGeometry {
                cols: geometry.cols,
                rows: geometry.rows,
            });
        }
        if self.closed {
            return Err(Error::ChannelClosed);
        }
        debug!("Forwarding resize: {}", geometry);
        self.link.send(ClientEvent::resize(geometry))?;
        self.stats.resize_events += 1;
        Ok(())
    }

    /// Take the next queued host event, if one is ready (non-blocking).
    ///
    /// Events are delivered in the order the remote process produced them.
    /// Returns `None` once the channel is closed, regardless of anything
    /// still queued, which is what guarantees a disconnected session hears
    /// nothing further.
    pub fn poll_event(&mut self) -> Option<HostEvent> {
        if self.closed {
            return None;
        }
        match self.events.try_recv() {
            Ok(event) => {
                match &event {
                    HostEvent::Output { data } | HostEvent::ErrorOutput { data } => {
                        self.stats.bytes_in += data.len() as u64;
                    }
                    HostEvent::Exit { .. } => {}
                }
                Some(event)
            }
            Err(_) => None,
        }
    }

    /// Current channel accounting.
    pub fn stats(&self) -> ChannelStats {
        self.stats
    }

    /// Whether the channel has been shut down.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Tear the channel down. Always safe; idempotent.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.link.close();
        self.events.close();
        info!(
            "Channel closed: {} bytes in, {} bytes out, {} resizes",
            self.stats.bytes_in, self.stats.bytes_out, self.stats.resize_events
        );
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.shutdown();
    }
}
