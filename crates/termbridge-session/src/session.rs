//! One logical terminal session and its observer seam.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, warn};

use termbridge_core::{
    ConnectionState, Error, ExitInfo, Geometry, HostEvent, Result, SessionId, StartRequest,
};
use termbridge_transport::{Channel, ProcessHost};

/// Consumer of one session's output stream.
///
/// This is the seam the presentation adapter plugs into. Each session has at
/// most one observer at a time: [`Session::subscribe`] replaces the previous
/// one rather than stacking, so a re-render can never cause double-firing.
/// Callbacks must not call `subscribe` on the same session re-entrantly.
pub trait SessionObserver: Send {
    /// Stdout bytes to render.
    fn output(&mut self, data: &[u8]);

    /// Stderr bytes, rendered with distinct styling.
    fn error_output(&mut self, data: &[u8]);

    /// The remote process terminated. Crash exits warrant a restart
    /// affordance; normal exits do not.
    fn exited(&mut self, info: ExitInfo);

    /// The session reconnected and prior scrollback no longer applies.
    fn cleared(&mut self) {}
}

/// One logical terminal tab and its remote process binding.
///
/// Owns at most one live transport channel at any instant; a new `open`
/// synchronously tears down the prior channel before dialing, so a
/// reconnecting tab can never hear its previous stream. All state lives
/// behind internal locks, letting the registry hand out `Arc<Session>`.
pub struct Session {
    id: SessionId,
    title: Mutex<String>,
    host: Arc<dyn ProcessHost>,
    state: Mutex<ConnectionState>,
    channel: Mutex<Option<Channel>>,
    geometry: Mutex<Geometry>,
    exit_info: Mutex<Option<ExitInfo>>,
    observer: Mutex<Option<Box<dyn SessionObserver>>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("geometry", &self.geometry())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a new idle session bound to a process host.
    pub fn new(host: Arc<dyn ProcessHost>, title: String, geometry: Geometry) -> Self {
        let id = SessionId::new();
        info!("Creating session: id={}, title='{}'", id, title);
        Self {
            id,
            title: Mutex::new(title),
            host,
            state: Mutex::new(ConnectionState::Idle),
            channel: Mutex::new(None),
            geometry: Mutex::new(geometry),
            exit_info: Mutex::new(None),
            observer: Mutex::new(None),
        }
    }

    /// Get the session ID.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Get the display title.
    pub fn title(&self) -> String {
        self.title.lock().unwrap().clone()
    }

    /// Set the display title.
    pub fn set_title(&self, title: impl Into<String>) {
        *self.title.lock().unwrap() = title.into();
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap()
    }

    /// Last-known geometry, whether or not it has reached the remote side.
    pub fn geometry(&self) -> Geometry {
        *self.geometry.lock().unwrap()
    }

    /// Outcome of the last finished connection, if any.
    pub fn exit_info(&self) -> Option<ExitInfo> {
        *self.exit_info.lock().unwrap()
    }

    /// Attach the single observer, replacing any previous one.
    pub fn subscribe(&self, observer: Box<dyn SessionObserver>) {
        *self.observer.lock().unwrap() = Some(observer);
    }

    /// Detach the observer, if any.
    pub fn unsubscribe(&self) {
        *self.observer.lock().unwrap() = None;
    }

    /// Open a connection, tearing down any prior one first.
    ///
    /// Suspends only until the transport handshake completes or fails; output
    /// and exit arrive later through [`Session::pump`]. On success the
    /// current geometry is replayed immediately so a reconnect cannot leave
    /// the remote PTY with stale dimensions, and the observer's scrollback is
    /// reset. On failure the session is left `Idle` (if it was never
    /// connected) or `Closed`, no exit is ever synthesized, and any exit
    /// record from the previous connection remains visible.
    pub async fn open(&self, path: &str, command: &str) -> Result<()> {
        let prior = self.state();

        // One live channel per session: invalidate the old one before dialing.
        if let Some(channel) = self.channel.lock().unwrap().take() {
            debug!("Discarding previous channel on reconnect: id={}", self.id);
            channel.close();
        }
        *self.state.lock().unwrap() = ConnectionState::Connecting;
        info!(
            "Session connecting: id={}, path='{}', command='{}'",
            self.id, path, command
        );

        match Channel::open(self.host.as_ref(), StartRequest::new(path, command)).await {
            Ok(mut channel) => {
                // Re-established: only now does the previous exit record stop
                // applying. A failed reconnect keeps it, so a crashed tab
                // still shows its crash until a connection actually replaces it.
                *self.exit_info.lock().unwrap() = None;
                let geometry = self.geometry();
                if let Err(e) = channel.resize(geometry) {
                    warn!("Geometry replay failed: id={}, {}", self.id, e);
                }
                *self.channel.lock().unwrap() = Some(channel);
                *self.state.lock().unwrap() = ConnectionState::Connected;
                info!("Session connected: id={}, geometry={}", self.id, geometry);

                // Reconnect always resets the presentation.
                if let Some(observer) = self.observer.lock().unwrap().as_mut() {
                    observer.cleared();
                }
                Ok(())
            }
            Err(e) => {
                let fallback = if prior == ConnectionState::Idle {
                    ConnectionState::Idle
                } else {
                    ConnectionState::Closed
                };
                *self.state.lock().unwrap() = fallback;
                warn!("Session connect failed: id={}, {}", self.id, e);
                Err(e)
            }
        }
    }

    /// Forward raw input bytes to the remote process.
    ///
    /// A strict no-op while disconnected: sessions do not queue input, and
    /// the bytes are not looped back locally.
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        if !self.state().is_connected() {
            debug!(
                "Dropping {} input bytes while disconnected: id={}",
                data.len(),
                self.id
            );
            return Ok(0);
        }

        let mut guard = self.channel.lock().unwrap();
        match guard.as_mut() {
            Some(channel) => channel.send_input(data),
            None => Ok(0),
        }
    }

    /// Record new terminal geometry and forward it if connected.
    ///
    /// Ill-formed geometry is rejected without being recorded or forwarded.
    /// While disconnected the value is only recorded; the next successful
    /// `open` replays it as the just-connected geometry.
    pub fn resize(&self, geometry: Geometry) -> Result<()> {
        if !geometry.is_valid() {
            warn!("Rejecting invalid geometry {}: id={}", geometry, self.id);
            return Err(Error::InvalidGeometry {
                cols: geometry.cols,
                rows: geometry.rows,
            });
        }

        *self.geometry.lock().unwrap() = geometry;

        if self.state().is_connected() {
            let mut guard = self.channel.lock().unwrap();
            if let Some(channel) = guard.as_mut() {
                channel.resize(geometry)?;
            }
        }
        Ok(())
    }

    /// Dispatch all currently queued host events to the observer.
    ///
    /// Returns the number of events handled. Output events are dispatched in
    /// the order the remote process produced them; an exit event records the
    /// classification once, closes the channel, and transitions to `Closed`.
    pub fn pump(&self) -> usize {
        let drained = {
            let mut guard = self.channel.lock().unwrap();
            let Some(channel) = guard.as_mut() else {
                return 0;
            };
            let mut drained = Vec::new();
            while let Some(event) = channel.poll_event() {
                drained.push(event);
            }
            drained
        };

        let mut handled = 0;
        for event in drained {
            handled += 1;
            match event {
                HostEvent::Output { data } => {
                    if let Some(observer) = self.observer.lock().unwrap().as_mut() {
                        observer.output(&data);
                    }
                }
                HostEvent::ErrorOutput { data } => {
                    if let Some(observer) = self.observer.lock().unwrap().as_mut() {
                        observer.error_output(&data);
                    }
                }
                HostEvent::Exit { code } => {
                    self.handle_exit(code);
                    break;
                }
            }
        }
        handled
    }

    fn handle_exit(&self, code: i32) {
        let info = ExitInfo::from_code(code);
        {
            let mut slot = self.exit_info.lock().unwrap();
            if slot.is_none() {
                *slot = Some(info);
            }
        }
        if let Some(channel) = self.channel.lock().unwrap().take() {
            channel.close();
        }
        *self.state.lock().unwrap() = ConnectionState::Closed;
        info!(
            "Session exited: id={}, code={}, class={:?}",
            self.id, code, info.class
        );
        if let Some(observer) = self.observer.lock().unwrap().as_mut() {
            observer.exited(info);
        }
    }

    /// Stop the session. Always succeeds, from any state.
    ///
    /// Tears down the channel and detaches the observer, so a subsequent
    /// `open` on the same session starts from a clean slate.
    pub fn close(&self) {
        *self.state.lock().unwrap() = ConnectionState::Closing;
        if let Some(channel) = self.channel.lock().unwrap().take() {
            channel.close();
        }
        *self.observer.lock().unwrap() = None;
        *self.state.lock().unwrap() = ConnectionState::Closed;
        info!("Session closed: id={}", self.id);
    }

    /// Cooperatively pump events until the session reaches a terminal state.
    ///
    /// A convenience loop for owners without their own scheduler; polls in
    /// the same pump-then-sleep cadence the transport uses for async reads.
    pub async fn drive(&self) {
        loop {
            self.pump();
            if self.state().is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EventLog, Observed};
    use termbridge_core::{ClientEvent, ExitClass};
    use termbridge_transport::ScriptedHost;

    fn session(host: &ScriptedHost) -> Session {
        Session::new(
            Arc::new(host.clone()),
            "Terminal 1".to_string(),
            Geometry::default(),
        )
    }

    #[test]
    fn test_session_starts_idle() {
        let host = ScriptedHost::new();
        let session = session(&host);
        assert_eq!(session.state(), ConnectionState::Idle);
        assert_eq!(session.exit_info(), None);
        assert_eq!(session.title(), "Terminal 1");
    }

    #[tokio::test]
    async fn test_open_transitions_to_connected() {
        let host = ScriptedHost::new();
        let session = session(&host);

        session.open("/work", "bash").await.unwrap();
        assert_eq!(session.state(), ConnectionState::Connected);
        assert_eq!(host.connect_count(), 1);
        assert_eq!(host.live_links(), 1);
    }

    #[tokio::test]
    async fn test_open_failure_leaves_idle_without_exit() {
        let host = ScriptedHost::new();
        let session = session(&host);
        host.fail_next_connect();

        let log = EventLog::default();
        session.subscribe(log.observer());

        let result = session.open("/work", "bash").await;
        assert!(matches!(result, Err(Error::ConnectionFailed(_))));
        assert_eq!(session.state(), ConnectionState::Idle);
        assert_eq!(session.exit_info(), None);
        // Connection failure is not a process exit.
        assert!(log.events().is_empty());
    }

    #[tokio::test]
    async fn test_open_failure_after_connect_leaves_closed() {
        let host = ScriptedHost::new();
        let session = session(&host);

        session.open("/work", "bash").await.unwrap();
        host.fail_next_connect();
        let result = session.open("/work", "bash").await;

        assert!(result.is_err());
        assert_eq!(session.state(), ConnectionState::Closed);
        assert_eq!(host.live_links(), 0);
    }

    #[tokio::test]
    async fn test_reconnect_keeps_single_live_channel() {
        let host = ScriptedHost::new();
        let session = session(&host);

        for _ in 0..5 {
            session.open("/work", "bash").await.unwrap();
            assert_eq!(host.live_links(), 1);
        }
        assert_eq!(host.connect_count(), 5);
    }

    #[tokio::test]
    async fn test_reconnect_does_not_cross_wire_old_events() {
        let host = ScriptedHost::new();
        let session = session(&host);
        let log = EventLog::default();

        session.open("/work", "bash").await.unwrap();
        host.emit(HostEvent::output(b"old".to_vec()));

        // Reconnect before pumping; the old channel's queue must be dead.
        session.open("/work", "bash").await.unwrap();
        session.subscribe(log.observer());
        host.emit(HostEvent::output(b"new".to_vec()));
        session.pump();

        assert_eq!(log.output_string(), "new");
    }

    #[tokio::test]
    async fn test_geometry_replay_on_open() {
        let host = ScriptedHost::new();
        let session = session(&host);

        session.resize(Geometry::new(100, 40)).unwrap();
        session.open("/work", "bash").await.unwrap();

        let events = host.latest_events();
        let first_resize = events
            .iter()
            .find(|e| matches!(e, ClientEvent::Resize { .. }))
            .unwrap();
        assert_eq!(*first_resize, ClientEvent::resize(Geometry::new(100, 40)));
    }

    #[tokio::test]
    async fn test_exit_info_cleared_on_reconnect() {
        let host = ScriptedHost::new();
        let session = session(&host);

        session.open("/work", "bash").await.unwrap();
        host.emit(HostEvent::exit(1));
        session.pump();
        assert_eq!(session.exit_info().unwrap().class, ExitClass::Crash);

        session.open("/work", "bash").await.unwrap();
        assert_eq!(session.exit_info(), None);
        assert_eq!(session.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_failed_reconnect_keeps_crash_record() {
        let host = ScriptedHost::new();
        let session = session(&host);

        session.open("/work", "bash").await.unwrap();
        host.emit(HostEvent::exit(137));
        session.pump();
        assert!(session.exit_info().unwrap().is_crash());

        // The restart attempt fails at the transport layer; the crash the
        // restart affordance was offered for must still be on record.
        host.fail_next_connect();
        assert!(session.open("/work", "bash").await.is_err());
        assert_eq!(session.exit_info(), Some(ExitInfo::from_code(137)));

        // A restart that actually connects clears it.
        session.open("/work", "bash").await.unwrap();
        assert_eq!(session.exit_info(), None);
    }

    #[tokio::test]
    async fn test_write_while_disconnected_is_noop() {
        let host = ScriptedHost::new();
        let session = session(&host);
        let log = EventLog::default();
        session.subscribe(log.observer());

        let written = session.write(b"typed too early").unwrap();
        assert_eq!(written, 0);
        // No local echo either: the typed bytes vanish.
        session.pump();
        assert!(log.events().is_empty());
        assert!(host.latest_events().is_empty());
    }

    #[tokio::test]
    async fn test_write_forwards_when_connected() {
        let host = ScriptedHost::new();
        let session = session(&host);

        session.open("/work", "bash").await.unwrap();
        let written = session.write(b"ls\n").unwrap();
        assert_eq!(written, 3);

        let events = host.latest_events();
        assert!(events.contains(&ClientEvent::input(b"ls\n".to_vec())));
    }

    #[tokio::test]
    async fn test_invalid_resize_rejected_and_not_recorded() {
        let host = ScriptedHost::new();
        let session = session(&host);
        session.open("/work", "bash").await.unwrap();

        let before = session.geometry();
        assert!(matches!(
            session.resize(Geometry::new(0, 0)),
            Err(Error::InvalidGeometry { .. })
        ));
        assert_eq!(session.geometry(), before);

        // The only resize the host ever saw is the geometry replay.
        let resizes: Vec<_> = host
            .latest_events()
            .into_iter()
            .filter(|e| matches!(e, ClientEvent::Resize { .. }))
            .collect();
        assert_eq!(resizes, vec![ClientEvent::resize(before)]);
    }

    #[tokio::test]
    async fn test_output_order_and_normal_exit() {
        let host = ScriptedHost::new();
        let session = session(&host);
        let log = EventLog::default();

        session.open("/work", "bash").await.unwrap();
        session.subscribe(log.observer());

        host.emit(HostEvent::output(b"foo".to_vec()));
        host.emit(HostEvent::output(b"bar".to_vec()));
        host.emit(HostEvent::exit(0));
        session.pump();

        assert_eq!(
            log.events(),
            vec![
                Observed::Output(b"foo".to_vec()),
                Observed::Output(b"bar".to_vec()),
                Observed::Exited(ExitInfo::from_code(0)),
            ]
        );
        assert_eq!(session.state(), ConnectionState::Closed);
        let info = session.exit_info().unwrap();
        assert_eq!(info.code, 0);
        assert_eq!(info.class, ExitClass::Normal);
    }

    #[tokio::test]
    async fn test_crash_exit_classification() {
        let host = ScriptedHost::new();
        let session = session(&host);

        session.open("/work", "bash").await.unwrap();
        host.emit(HostEvent::exit(127));
        session.pump();

        let info = session.exit_info().unwrap();
        assert_eq!(info.code, 127);
        assert!(info.is_crash());
        assert_eq!(host.live_links(), 0);
    }

    #[tokio::test]
    async fn test_stderr_dispatched_separately() {
        let host = ScriptedHost::new();
        let session = session(&host);
        let log = EventLog::default();

        session.open("/work", "bash").await.unwrap();
        session.subscribe(log.observer());

        host.emit(HostEvent::error_output(b"oops".to_vec()));
        session.pump();

        assert_eq!(log.events(), vec![Observed::ErrorOutput(b"oops".to_vec())]);
    }

    #[tokio::test]
    async fn test_subscribe_replaces_previous_observer() {
        let host = ScriptedHost::new();
        let session = session(&host);
        let first = EventLog::default();
        let second = EventLog::default();

        session.open("/work", "bash").await.unwrap();
        session.subscribe(first.observer());
        session.subscribe(second.observer());

        host.emit(HostEvent::output(b"hello".to_vec()));
        session.pump();

        // Replaced, not stacked: only the latest observer fires.
        assert!(first.events().is_empty());
        assert_eq!(second.output_string(), "hello");
    }

    #[tokio::test]
    async fn test_cleared_fires_on_every_connect() {
        let host = ScriptedHost::new();
        let session = session(&host);
        let log = EventLog::default();
        session.subscribe(log.observer());

        session.open("/work", "bash").await.unwrap();
        session.open("/work", "bash").await.unwrap();

        assert_eq!(log.events(), vec![Observed::Cleared, Observed::Cleared]);
    }

    #[tokio::test]
    async fn test_close_detaches_observer_and_channel() {
        let host = ScriptedHost::new();
        let session = session(&host);
        let log = EventLog::default();

        session.open("/work", "bash").await.unwrap();
        session.subscribe(log.observer());
        session.close();

        assert_eq!(session.state(), ConnectionState::Closed);
        assert_eq!(host.live_links(), 0);

        // Reopen starts from a clean slate: the old observer stays detached.
        session.open("/work", "bash").await.unwrap();
        host.emit(HostEvent::output(b"fresh".to_vec()));
        session.pump();
        assert!(log.events().is_empty());
    }

    #[tokio::test]
    async fn test_close_is_safe_when_idle() {
        let host = ScriptedHost::new();
        let session = session(&host);
        session.close();
        assert_eq!(session.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_drive_returns_on_exit() {
        let host = ScriptedHost::new();
        let session = session(&host);

        session.open("/work", "bash").await.unwrap();
        host.emit(HostEvent::output(b"done\n".to_vec()));
        host.emit(HostEvent::exit(0));

        tokio::time::timeout(Duration::from_secs(2), session.drive())
            .await
            .unwrap();
        assert_eq!(session.state(), ConnectionState::Closed);
    }
}
