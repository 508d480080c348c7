//! Viewport-to-geometry synchronization.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{debug, trace};

use termbridge_core::{CellMetrics, Geometry, Result, SessionId, Viewport};

use crate::session::Session;

/// Keeps a session's remote PTY geometry in sync with the rendered viewport.
///
/// `notify` is idempotent and safe to call speculatively - on every layout
/// pass, visibility change, or tab activation. It recomputes `(cols, rows)`
/// from the viewport and only forwards a resize when the computed value
/// differs from the last one actually sent for that session, so pixel-level
/// layout churn produces no wire chatter.
pub struct ResizeSynchronizer {
    metrics: CellMetrics,
    last_sent: Mutex<HashMap<SessionId, Geometry>>,
}

impl ResizeSynchronizer {
    /// Create a synchronizer for a given rendering font.
    pub fn new(metrics: CellMetrics) -> Self {
        Self {
            metrics,
            last_sent: Mutex::new(HashMap::new()),
        }
    }

    /// Compute the geometry a viewport can hold, if any.
    ///
    /// Zero-area viewports (hidden or minimized tabs) and viewports smaller
    /// than one cell yield `None`: a backgrounded tab must never clobber the
    /// remote PTY's last valid geometry.
    pub fn compute(&self, viewport: Viewport) -> Option<Geometry> {
        if viewport.is_zero_area() {
            return None;
        }

        let cols = (viewport.width as f32 / self.metrics.width).floor() as u16;
        let rows = (viewport.height as f32 / self.metrics.height).floor() as u16;
        let geometry = Geometry::new(cols, rows);
        if !geometry.is_valid() {
            return None;
        }
        Some(geometry)
    }

    /// Recompute geometry for `session` and forward it if it changed.
    ///
    /// Returns whether a resize was actually sent.
    pub fn notify(&self, session: &Session, viewport: Viewport) -> Result<bool> {
        let Some(geometry) = self.compute(viewport) else {
            trace!(
                "Suppressing resize for degenerate viewport {}x{}: id={}",
                viewport.width,
                viewport.height,
                session.id()
            );
            return Ok(false);
        };

        {
            let last_sent = self.last_sent.lock().unwrap();
            if last_sent.get(&session.id()) == Some(&geometry) {
                return Ok(false);
            }
        }

        session.resize(geometry)?;
        debug!("Viewport resize applied: id={}, {}", session.id(), geometry);
        self.last_sent.lock().unwrap().insert(session.id(), geometry);
        Ok(true)
    }

    /// Drop the memo for a closed session.
    pub fn forget(&self, id: SessionId) {
        self.last_sent.lock().unwrap().remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use termbridge_core::ClientEvent;
    use termbridge_transport::ScriptedHost;

    fn fixture() -> (ScriptedHost, Session, ResizeSynchronizer) {
        let host = ScriptedHost::new();
        let session = Session::new(
            Arc::new(host.clone()),
            "Terminal 1".to_string(),
            Geometry::default(),
        );
        let sync = ResizeSynchronizer::new(CellMetrics::new(8.0, 16.0));
        (host, session, sync)
    }

    fn resizes(host: &ScriptedHost) -> Vec<ClientEvent> {
        host.latest_events()
            .into_iter()
            .filter(|e| matches!(e, ClientEvent::Resize { .. }))
            .collect()
    }

    #[test]
    fn test_compute_from_pixels() {
        let sync = ResizeSynchronizer::new(CellMetrics::new(8.0, 16.0));
        assert_eq!(
            sync.compute(Viewport::new(800, 640)),
            Some(Geometry::new(100, 40))
        );
        // Fractional cells are floored away.
        assert_eq!(
            sync.compute(Viewport::new(807, 655)),
            Some(Geometry::new(100, 40))
        );
    }

    #[test]
    fn test_compute_suppresses_degenerate_viewports() {
        let sync = ResizeSynchronizer::new(CellMetrics::new(8.0, 16.0));
        assert_eq!(sync.compute(Viewport::new(0, 640)), None);
        assert_eq!(sync.compute(Viewport::new(800, 0)), None);
        // Smaller than a single cell.
        assert_eq!(sync.compute(Viewport::new(4, 640)), None);
    }

    #[tokio::test]
    async fn test_notify_sends_once_per_distinct_geometry() {
        let (host, session, sync) = fixture();
        session.open("/work", "bash").await.unwrap();
        let replayed = resizes(&host).len();

        assert!(sync.notify(&session, Viewport::new(800, 640)).unwrap());
        // Same compute result: no wire chatter on layout churn.
        assert!(!sync.notify(&session, Viewport::new(800, 640)).unwrap());
        assert!(!sync.notify(&session, Viewport::new(803, 643)).unwrap());
        // Real change goes through.
        assert!(sync.notify(&session, Viewport::new(960, 640)).unwrap());

        assert_eq!(resizes(&host).len(), replayed + 2);
    }

    #[tokio::test]
    async fn test_notify_hidden_tab_never_reaches_channel() {
        let (host, session, sync) = fixture();
        session.open("/work", "bash").await.unwrap();
        let before = resizes(&host);

        assert!(!sync.notify(&session, Viewport::new(0, 0)).unwrap());
        assert_eq!(resizes(&host), before);
        // The remote side keeps its last valid geometry.
        assert!(session.geometry().is_valid());
    }

    #[tokio::test]
    async fn test_notify_while_disconnected_records_for_replay() {
        let (host, session, sync) = fixture();

        // Tab laid out before its first connect.
        assert!(sync.notify(&session, Viewport::new(800, 640)).unwrap());
        assert_eq!(session.geometry(), Geometry::new(100, 40));

        session.open("/work", "bash").await.unwrap();
        assert_eq!(
            resizes(&host),
            vec![ClientEvent::resize(Geometry::new(100, 40))]
        );
    }

    #[tokio::test]
    async fn test_forget_allows_resend_after_reopen() {
        let (host, session, sync) = fixture();
        session.open("/work", "bash").await.unwrap();

        assert!(sync.notify(&session, Viewport::new(800, 640)).unwrap());
        sync.forget(session.id());
        assert!(sync.notify(&session, Viewport::new(800, 640)).unwrap());

        assert!(resizes(&host).len() >= 2);
    }
}
