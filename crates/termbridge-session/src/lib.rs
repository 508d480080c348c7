//! # termbridge-session
//!
//! Session lifecycle management for the terminal session bridge.
//!
//! This crate provides:
//! - [`Session`]: connection lifecycle and geometry for one logical terminal
//! - [`SessionRegistry`]: the tab manager owning the ordered session list
//! - [`ResizeSynchronizer`]: viewport-to-geometry synchronization
//! - Setup operations with an explicit deadline and cancellation token
//!
//! ## Architecture
//!
//! This is Layer 2 in the architecture - it depends on termbridge-core and
//! termbridge-transport to manage terminal session lifecycles.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod registry;
pub mod resize;
pub mod session;
pub mod setup;
pub mod testing;

// Re-export commonly used types
pub use registry::{RegistryConfig, SessionRegistry, TabInfo};
pub use resize::ResizeSynchronizer;
pub use session::{Session, SessionObserver};
pub use setup::{run_setup, SetupOptions, SetupReport};
pub use tokio_util::sync::CancellationToken;
pub use testing::{EventLog, Observed};
