//! A `ProcessHost` speaking the wire protocol over an async byte stream.

use std::future::Future;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use termbridge_core::{ClientEvent, Error, HostEvent, Result, StartRequest};

use crate::host::{ConnectFuture, HostLink, ProcessHost};
use crate::wire;

/// A process host reached over a duplex byte stream.
///
/// `dial` produces a fresh stream per connection (e.g. a TCP or Unix socket
/// connect); every session connect sends a `start` frame and then speaks
/// newline-delimited JSON in both directions. Writing the `start` frame is
/// the transport handshake: if it fails, the connect fails and no process
/// exit is ever synthesized.
pub struct StreamHost<F> {
    dial: F,
}

impl<F> StreamHost<F> {
    /// Create a host that dials a fresh stream per connection.
    pub fn new(dial: F) -> Self {
        Self { dial }
    }
}

impl<F, Fut, S> ProcessHost for StreamHost<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = std::io::Result<S>> + Send + 'static,
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    fn connect(
        &self,
        request: StartRequest,
        events: UnboundedSender<HostEvent>,
    ) -> ConnectFuture<'_> {
        let dial = (self.dial)();
        Box::pin(async move {
            let stream = dial
                .await
                .map_err(|e| Error::ConnectionFailed(e.to_string()))?;
            let (read_half, mut write_half) = tokio::io::split(stream);

            let start_frame = wire::encode_frame(&ClientEvent::start(&request))?;
            write_half
                .write_all(&start_frame)
                .await
                .map_err(|e| Error::ConnectionFailed(e.to_string()))?;
            write_half
                .flush()
                .await
                .map_err(|e| Error::ConnectionFailed(e.to_string()))?;

            debug!(
                "Stream host connected: path='{}', command='{}'",
                request.path, request.command
            );

            // Writer task owns the write half; the link hands it frames.
            let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<Vec<u8>>();
            let writer = tokio::spawn(async move {
                while let Some(frame) = frame_rx.recv().await {
                    if write_half.write_all(&frame).await.is_err() {
                        break;
                    }
                    if write_half.flush().await.is_err() {
                        break;
                    }
                }
            });

            // Reader task decodes host frames until EOF, decode failure, or
            // the receiving channel going away.
            let reader = tokio::spawn(async move {
                let mut lines = BufReader::new(read_half).lines();
                loop {
                    match lines.next_line().await {
                        Ok(Some(line)) => {
                            let line = line.trim();
                            if line.is_empty() {
                                continue;
                            }
                            match wire::decode_host_event(line) {
                                Ok(event) => {
                                    if events.send(event).is_err() {
                                        break;
                                    }
                                }
                                Err(e) => {
                                    warn!("Undecodable host frame, closing stream: {}", e);
                                    break;
                                }
                            }
                        }
                        Ok(None) => break, // EOF: host side closed the stream
                        Err(e) => {
                            debug!("Stream read error: {}", e);
                            break;
                        }
                    }
                }
            });

            Ok(Box::new(StreamLink {
                frames: Some(frame_tx),
                reader,
                writer,
            }) as Box<dyn HostLink>)
        })
    }
}

struct StreamLink {
    frames: Option<UnboundedSender<Vec<u8>>>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl HostLink for StreamLink {
    fn send(&mut self, event: ClientEvent) -> Result<()> {
        let frames = self.frames.as_ref().ok_or(Error::ChannelClosed)?;
        let frame = wire::encode_frame(&event)?;
        frames.send(frame).map_err(|_| Error::ChannelClosed)
    }

    fn close(&mut self) {
        self.frames = None;
        self.reader.abort();
        self.writer.abort();
    }
}

impl Drop for StreamLink {
    fn drop(&mut self) {
        self.close();
    }
}
