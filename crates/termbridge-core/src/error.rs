//! Error types for the terminal session bridge.

use thiserror::Error;

use crate::SessionId;

/// Main error type for bridge operations.
///
/// Everything here is a terminal, local, recoverable condition: none of
/// these should take down the owning UI surface. Operating on a session id
/// absent from the registry is a caller defect surfaced as
/// [`Error::SessionNotFound`].
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level connection could not be established; never retried
    /// automatically and never reported as a process exit
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Session not found in the registry
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// Session limit reached
    #[error("Session limit reached (max: {0})")]
    SessionLimitReached(usize),

    /// Ill-formed terminal geometry; dropped locally, never forwarded
    #[error("Invalid geometry: {cols}x{rows}")]
    InvalidGeometry {
        /// Number of columns
        cols: u16,
        /// Number of rows
        rows: u16,
    },

    /// The transport channel is gone; no further events can be sent
    #[error("Transport channel closed")]
    ChannelClosed,

    /// Operation requires a connected channel
    #[error("Session not connected")]
    NotConnected,

    /// Setup operation exceeded its maximum wait
    #[error("Setup timed out after {0}ms")]
    SetupTimeout(u64),

    /// Setup operation was cancelled through its token
    #[error("Setup cancelled")]
    SetupCancelled,

    /// Setup process exited with a nonzero code
    #[error("Setup process exited with code {0}")]
    SetupFailed(i32),

    /// Wire frame could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with custom message
    #[error("{0}")]
    Other(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failed_error() {
        let err = Error::ConnectionFailed("host unreachable".to_string());
        assert_eq!(err.to_string(), "Connection failed: host unreachable");
    }

    #[test]
    fn test_session_not_found_error() {
        let session_id = SessionId::new();
        let err = Error::SessionNotFound(session_id);
        assert!(err.to_string().starts_with("Session not found:"));
    }

    #[test]
    fn test_session_limit_reached_error() {
        let err = Error::SessionLimitReached(10);
        assert_eq!(err.to_string(), "Session limit reached (max: 10)");
    }

    #[test]
    fn test_invalid_geometry_error() {
        let err = Error::InvalidGeometry { cols: 0, rows: 24 };
        assert_eq!(err.to_string(), "Invalid geometry: 0x24");
    }

    #[test]
    fn test_setup_timeout_error() {
        let err = Error::SetupTimeout(5000);
        assert_eq!(err.to_string(), "Setup timed out after 5000ms");
    }

    #[test]
    fn test_setup_failed_error() {
        let err = Error::SetupFailed(2);
        assert_eq!(err.to_string(), "Setup process exited with code 2");
    }

    #[test]
    fn test_config_error() {
        let err = Error::Config("registry.max_sessions must be > 0".to_string());
        assert!(err.to_string().starts_with("Configuration error:"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("pipe closed"));
    }

    #[test]
    fn test_codec_error_conversion() {
        let json_err = serde_json::from_str::<i32>("not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Codec(_)));
    }

    #[test]
    fn test_error_debug() {
        let err = Error::NotConnected;
        let debug_str = format!("{err:?}");
        assert!(debug_str.contains("NotConnected"));
    }
}
