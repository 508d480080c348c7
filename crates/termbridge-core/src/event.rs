//! Wire events for the remote-process-host protocol.
//!
//! One logical duplex stream per session carries these events. The client
//! sends [`ClientEvent`]s and receives [`HostEvent`]s; the successful
//! completion of the transport handshake acts as the `start` acknowledgement,
//! so no ack variant appears in the host stream.

use serde::{Deserialize, Serialize};

use crate::Geometry;

/// Request to begin a new remote process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRequest {
    /// Working directory for the process
    pub path: String,
    /// Command line to run
    pub command: String,
}

impl StartRequest {
    /// Create a new start request.
    pub fn new(path: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            command: command.into(),
        }
    }
}

/// Event sent from the client to the remote process host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Begin a new process at `path` running `command`
    Start {
        /// Working directory for the process
        path: String,
        /// Command line to run
        command: String,
    },
    /// Raw keystroke/paste bytes forwarded to the process stdin
    Input {
        /// Raw input bytes
        data: Vec<u8>,
    },
    /// Notify the remote PTY of new terminal dimensions
    Resize {
        /// Number of columns
        cols: u16,
        /// Number of rows
        rows: u16,
    },
}

impl ClientEvent {
    /// Build a start event from a request.
    pub fn start(request: &StartRequest) -> Self {
        ClientEvent::Start {
            path: request.path.clone(),
            command: request.command.clone(),
        }
    }

    /// Build an input event.
    pub fn input(data: impl Into<Vec<u8>>) -> Self {
        ClientEvent::Input { data: data.into() }
    }

    /// Build a resize event.
    pub fn resize(geometry: Geometry) -> Self {
        ClientEvent::Resize {
            cols: geometry.cols,
            rows: geometry.rows,
        }
    }
}

/// Event delivered from the remote process host to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// Stdout bytes to render
    Output {
        /// Raw output bytes
        data: Vec<u8>,
    },
    /// Stderr bytes, rendered with distinct styling
    #[serde(rename = "error")]
    ErrorOutput {
        /// Raw stderr bytes
        data: Vec<u8>,
    },
    /// Process terminated; 0 is a normal stop, nonzero a crash
    Exit {
        /// Process exit code
        code: i32,
    },
}

impl HostEvent {
    /// Build an output event.
    pub fn output(data: impl Into<Vec<u8>>) -> Self {
        HostEvent::Output { data: data.into() }
    }

    /// Build a stderr output event.
    pub fn error_output(data: impl Into<Vec<u8>>) -> Self {
        HostEvent::ErrorOutput { data: data.into() }
    }

    /// Build an exit event.
    pub fn exit(code: i32) -> Self {
        HostEvent::Exit { code }
    }
}
