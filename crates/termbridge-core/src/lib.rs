//! # termbridge-core
//!
//! Core types for the terminal session bridge.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other termbridge crates. It provides:
//!
//! - Geometry types (Geometry, Viewport, CellMetrics)
//! - Session types (SessionId, ConnectionState, ExitInfo)
//! - Wire event types for the remote-process-host protocol
//! - Configuration types
//! - Error types
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other termbridge crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export all modules
pub mod config;
pub mod error;
pub mod event;
pub mod geometry;
pub mod session;

// Re-export commonly used types
pub use config::{BridgeConfig, RegistrySettings, SetupSettings, TerminalSettings};
pub use error::{Error, Result};
pub use event::{ClientEvent, HostEvent, StartRequest};
pub use geometry::{CellMetrics, Geometry, Viewport};
pub use session::{ConnectionState, ExitClass, ExitInfo, SessionId};
