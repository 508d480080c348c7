//! Session identity and lifecycle state types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a terminal session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for SessionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection state of a session's transport channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No channel has been opened yet
    Idle,
    /// Transport-level handshake in progress
    Connecting,
    /// Channel is live; input and resize events flow
    Connected,
    /// Teardown in progress
    Closing,
    /// Channel closed (clean stop, exit, or connection failure after a prior connect)
    Closed,
}

impl ConnectionState {
    /// Whether the session currently has a live channel.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// Whether the session has reached a terminal state for this connection attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Idle | ConnectionState::Closed)
    }
}

/// Classification of a process exit, driving distinct UI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitClass {
    /// Exit code 0: the process finished or was stopped deliberately
    Normal,
    /// Nonzero exit code: the process failed and a restart affordance applies
    Crash,
}

impl ExitClass {
    /// Classify an exit code.
    pub fn from_code(code: i32) -> Self {
        if code == 0 {
            ExitClass::Normal
        } else {
            ExitClass::Crash
        }
    }
}

/// Recorded outcome of a finished connection, set once per connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitInfo {
    /// Process exit code
    pub code: i32,
    /// Classification derived from the code
    pub class: ExitClass,
}

impl ExitInfo {
    /// Build exit info from a raw exit code.
    pub fn from_code(code: i32) -> Self {
        Self {
            code,
            class: ExitClass::from_code(code),
        }
    }

    /// Whether this exit should surface a crash affordance.
    pub fn is_crash(&self) -> bool {
        self.class == ExitClass::Crash
    }
}
