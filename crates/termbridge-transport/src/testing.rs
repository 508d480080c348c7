//! Test doubles for exercising the bridge without a real process host.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::UnboundedSender;

use termbridge_core::{ClientEvent, Error, HostEvent, Result, StartRequest};

use crate::host::{ConnectFuture, HostLink, ProcessHost};

/// An in-memory process host driven entirely by the test.
///
/// Records every client event it receives per connection, counts live links,
/// and lets tests inject host events or fail the next connect. Shared by the
/// transport and session test suites.
#[derive(Clone, Default)]
pub struct ScriptedHost {
    state: Arc<Mutex<HostState>>,
}

#[derive(Default)]
struct HostState {
    fail_next: bool,
    connects: usize,
    live_links: usize,
    connections: Vec<Connection>,
}

struct Connection {
    recorded: Arc<Mutex<Vec<ClientEvent>>>,
    sender: UnboundedSender<HostEvent>,
}

impl ScriptedHost {
    /// Create a new scripted host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next connect fail with a connection error (one-shot).
    pub fn fail_next_connect(&self) {
        self.state.lock().unwrap().fail_next = true;
    }

    /// Number of connect attempts seen, including failed ones.
    pub fn connect_count(&self) -> usize {
        self.state.lock().unwrap().connects
    }

    /// Number of links that have not been closed or dropped.
    pub fn live_links(&self) -> usize {
        self.state.lock().unwrap().live_links
    }

    /// Inject a host event into the most recent connection.
    ///
    /// Returns whether the event was delivered (false once the client side
    /// has torn the channel down).
    pub fn emit(&self, event: HostEvent) -> bool {
        let state = self.state.lock().unwrap();
        match state.connections.last() {
            Some(connection) => connection.sender.send(event).is_ok(),
            None => false,
        }
    }

    /// Client events recorded for connection `index` (in wire order,
    /// starting with the `start` event).
    pub fn sent_events(&self, index: usize) -> Vec<ClientEvent> {
        let state = self.state.lock().unwrap();
        state
            .connections
            .get(index)
            .map(|c| c.recorded.lock().unwrap().clone())
            .unwrap_or_default()
    }

    /// Client events recorded for the most recent connection.
    pub fn latest_events(&self) -> Vec<ClientEvent> {
        let state = self.state.lock().unwrap();
        state
            .connections
            .last()
            .map(|c| c.recorded.lock().unwrap().clone())
            .unwrap_or_default()
    }
}

impl ProcessHost for ScriptedHost {
    fn connect(
        &self,
        request: StartRequest,
        events: UnboundedSender<HostEvent>,
    ) -> ConnectFuture<'_> {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let mut locked = state.lock().unwrap();
            locked.connects += 1;

            if locked.fail_next {
                locked.fail_next = false;
                return Err(Error::ConnectionFailed(
                    "scripted connect failure".to_string(),
                ));
            }

            let recorded = Arc::new(Mutex::new(vec![ClientEvent::start(&request)]));
            locked.connections.push(Connection {
                recorded: Arc::clone(&recorded),
                sender: events,
            });
            locked.live_links += 1;
            drop(locked);

            Ok(Box::new(ScriptedLink {
                recorded,
                state,
                closed: false,
            }) as Box<dyn HostLink>)
        })
    }
}

struct ScriptedLink {
    recorded: Arc<Mutex<Vec<ClientEvent>>>,
    state: Arc<Mutex<HostState>>,
    closed: bool,
}

impl HostLink for ScriptedLink {
    fn send(&mut self, event: ClientEvent) -> Result<()> {
        if self.closed {
            return Err(Error::ChannelClosed);
        }
        self.recorded.lock().unwrap().push(event);
        Ok(())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.state.lock().unwrap().live_links -= 1;
    }
}

impl Drop for ScriptedLink {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_scripted_host_records_events() {
        let host = ScriptedHost::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let request = StartRequest::new("/tmp", "sh");
        let mut link = host.connect(request.clone(), tx).await.unwrap();
        link.send(ClientEvent::input(b"pwd\n".to_vec())).unwrap();

        assert_eq!(host.connect_count(), 1);
        assert_eq!(
            host.latest_events(),
            vec![
                ClientEvent::start(&request),
                ClientEvent::input(b"pwd\n".to_vec()),
            ]
        );

        assert!(host.emit(HostEvent::output(b"/tmp\n".to_vec())));
        assert_eq!(rx.recv().await, Some(HostEvent::output(b"/tmp\n".to_vec())));
    }

    #[tokio::test]
    async fn test_scripted_host_fail_next_is_one_shot() {
        let host = ScriptedHost::new();
        host.fail_next_connect();

        let (tx, _rx) = mpsc::unbounded_channel();
        let result = host.connect(StartRequest::new("/tmp", "sh"), tx).await;
        assert!(matches!(result, Err(Error::ConnectionFailed(_))));

        let (tx, _rx) = mpsc::unbounded_channel();
        let result = host.connect(StartRequest::new("/tmp", "sh"), tx).await;
        assert!(result.is_ok());
        assert_eq!(host.connect_count(), 2);
    }

    #[tokio::test]
    async fn test_scripted_link_close_is_idempotent() {
        let host = ScriptedHost::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        let mut link = host.connect(StartRequest::new("/tmp", "sh"), tx).await.unwrap();
        assert_eq!(host.live_links(), 1);

        link.close();
        link.close();
        assert_eq!(host.live_links(), 0);

        drop(link); // drop after close must not double-count
        assert_eq!(host.live_links(), 0);
    }

    #[tokio::test]
    async fn test_emit_without_connection() {
        let host = ScriptedHost::new();
        assert!(!host.emit(HostEvent::exit(0)));
    }
}
