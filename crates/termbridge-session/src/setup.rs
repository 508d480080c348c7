//! Long-running setup operations with an explicit deadline and cancellation.
//!
//! Template/setup runs are a distinct channel kind: unlike interactive
//! sessions they carry a maximum wait, after which the operation is treated
//! as failed and the channel is force-closed. Cancellation is an explicit
//! [`CancellationToken`] passed in and checked at every progress step -
//! never a global flag. The token is cheap to clone; cancelling any clone
//! cancels the operation at its next progress check.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use termbridge_core::{ConnectionState, Error, ExitClass, Result};

use crate::session::Session;

/// Bounds for a setup operation.
#[derive(Debug, Clone)]
pub struct SetupOptions {
    /// Maximum time to wait for the setup process to finish
    pub timeout: Duration,

    /// Polling interval between progress checks
    pub poll_interval: Duration,
}

impl Default for SetupOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl SetupOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum wait.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Outcome of a completed setup operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupReport {
    /// Time spent waiting, in milliseconds
    pub waited_ms: u64,
}

/// Run a setup command to completion on `session`.
///
/// Opens the session, then pumps it until the process exits cleanly. Each
/// progress pass invokes `on_progress` with the elapsed time and checks the
/// token. Deadline, cancellation, and a nonzero exit all force-close the
/// channel and fail the operation; only `exit(0)` succeeds.
pub async fn run_setup<F>(
    session: &Session,
    path: &str,
    command: &str,
    options: &SetupOptions,
    token: &CancellationToken,
    mut on_progress: F,
) -> Result<SetupReport>
where
    F: FnMut(Duration),
{
    if token.is_cancelled() {
        return Err(Error::SetupCancelled);
    }

    session.open(path, command).await?;
    let started = Instant::now();
    info!(
        "Setup started: id={}, command='{}', timeout={}ms",
        session.id(),
        command,
        options.timeout.as_millis()
    );

    loop {
        session.pump();
        let elapsed = started.elapsed();
        on_progress(elapsed);

        if token.is_cancelled() {
            warn!("Setup cancelled: id={}", session.id());
            session.close();
            return Err(Error::SetupCancelled);
        }

        if session.state() == ConnectionState::Closed {
            return match session.exit_info() {
                Some(info) if info.class == ExitClass::Normal => {
                    let waited_ms = elapsed.as_millis() as u64;
                    info!("Setup finished: id={}, waited={}ms", session.id(), waited_ms);
                    Ok(SetupReport { waited_ms })
                }
                Some(info) => {
                    warn!(
                        "Setup failed: id={}, exit code {}",
                        session.id(),
                        info.code
                    );
                    Err(Error::SetupFailed(info.code))
                }
                // Closed underneath us without an exit: treat as cancelled.
                None => Err(Error::SetupCancelled),
            };
        }

        if elapsed >= options.timeout {
            warn!(
                "Setup timed out: id={}, after {}ms",
                session.id(),
                elapsed.as_millis()
            );
            session.close();
            return Err(Error::SetupTimeout(options.timeout.as_millis() as u64));
        }

        tokio::time::sleep(options.poll_interval).await;
    }
}
