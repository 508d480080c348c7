//! The tab manager: ordered session collection and active-tab tracking.

use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use termbridge_core::{ConnectionState, Error, ExitInfo, Geometry, Result, SessionId};
use termbridge_transport::ProcessHost;

use crate::session::Session;

/// Configuration for the session registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum number of concurrent sessions
    pub max_sessions: usize,

    /// Geometry assigned to newly created sessions
    pub default_geometry: Geometry,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_sessions: 10,
            default_geometry: Geometry::default(),
        }
    }
}

/// Tab-strip view of one session.
#[derive(Debug, Clone)]
pub struct TabInfo {
    /// Session identifier
    pub id: SessionId,
    /// Display title
    pub title: String,
    /// Current connection state
    pub state: ConnectionState,
    /// Exit outcome, if the last connection has finished
    pub exit_info: Option<ExitInfo>,
}

/// The single writer of the session list and active-tab pointer.
///
/// Sessions stay in creation order; nothing reorders them on activity. The
/// registry never drops to zero sessions while its owning surface is open:
/// closing the last tab is a no-op. Activation and connection are
/// orthogonal, so switching tabs never connects or disconnects anything.
pub struct SessionRegistry {
    host: Arc<dyn ProcessHost>,
    config: RegistryConfig,
    inner: Mutex<RegistryState>,
}

struct RegistryState {
    sessions: Vec<Arc<Session>>,
    active: Option<SessionId>,
    /// Creation counter feeding default titles; never reused after closes.
    next_tab: u64,
}

impl SessionRegistry {
    /// Create a registry with default configuration.
    pub fn new(host: Arc<dyn ProcessHost>) -> Self {
        Self::with_config(host, RegistryConfig::default())
    }

    /// Create a registry with custom configuration.
    pub fn with_config(host: Arc<dyn ProcessHost>, config: RegistryConfig) -> Self {
        Self {
            host,
            config,
            inner: Mutex::new(RegistryState {
                sessions: Vec::new(),
                active: None,
                next_tab: 1,
            }),
        }
    }

    /// Append a new idle session and make it active.
    pub fn add_session(&self) -> Result<Arc<Session>> {
        let mut inner = self.inner.lock().unwrap();
        if inner.sessions.len() >= self.config.max_sessions {
            return Err(Error::SessionLimitReached(self.config.max_sessions));
        }

        let title = format!("Terminal {}", inner.next_tab);
        inner.next_tab += 1;

        let session = Arc::new(Session::new(
            Arc::clone(&self.host),
            title,
            self.config.default_geometry,
        ));
        inner.active = Some(session.id());
        inner.sessions.push(Arc::clone(&session));
        info!(
            "Tab added: id={}, title='{}', count={}",
            session.id(),
            session.title(),
            inner.sessions.len()
        );
        Ok(session)
    }

    /// Close a session and remove it from the registry.
    ///
    /// Returns `Ok(false)` without touching anything when `id` names the
    /// only remaining session: at least one tab always exists. When the
    /// active session is closed, the most recently created survivor becomes
    /// active.
    pub fn close_session(&self, id: SessionId) -> Result<bool> {
        let (session, new_active) = {
            let mut inner = self.inner.lock().unwrap();
            let index = inner
                .sessions
                .iter()
                .position(|s| s.id() == id)
                .ok_or(Error::SessionNotFound(id))?;

            if inner.sessions.len() == 1 {
                debug!("Refusing to close the last tab: id={}", id);
                return Ok(false);
            }

            let session = inner.sessions.remove(index);
            if inner.active == Some(id) {
                // Tie-break: focus moves to the newest surviving tab.
                inner.active = inner.sessions.last().map(|s| s.id());
            }
            (session, inner.active)
        };

        // Disconnect outside the registry lock.
        session.close();
        info!("Tab closed: id={}, active={:?}", id, new_active);
        Ok(true)
    }

    /// Move the active-tab pointer. Never connects or disconnects anything.
    pub fn set_active(&self, id: SessionId) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.sessions.iter().any(|s| s.id() == id) {
            return Err(Error::SessionNotFound(id));
        }
        inner.active = Some(id);
        Ok(())
    }

    /// Id of the currently focused session, if any exist.
    pub fn active_id(&self) -> Option<SessionId> {
        self.inner.lock().unwrap().active
    }

    /// The currently focused session, if any exist.
    pub fn active_session(&self) -> Option<Arc<Session>> {
        let inner = self.inner.lock().unwrap();
        let id = inner.active?;
        inner.sessions.iter().find(|s| s.id() == id).cloned()
    }

    /// Get a session by id.
    pub fn get(&self, id: SessionId) -> Result<Arc<Session>> {
        self.inner
            .lock()
            .unwrap()
            .sessions
            .iter()
            .find(|s| s.id() == id)
            .cloned()
            .ok_or(Error::SessionNotFound(id))
    }

    /// Snapshot of all sessions in creation order.
    pub fn sessions(&self) -> Vec<Arc<Session>> {
        self.inner.lock().unwrap().sessions.clone()
    }

    /// Tab-strip snapshot in creation order.
    pub fn tabs(&self) -> Vec<TabInfo> {
        self.inner
            .lock()
            .unwrap()
            .sessions
            .iter()
            .map(|s| TabInfo {
                id: s.id(),
                title: s.title(),
                state: s.state(),
                exit_info: s.exit_info(),
            })
            .collect()
    }

    /// Number of sessions currently open.
    pub fn session_count(&self) -> usize {
        self.inner.lock().unwrap().sessions.len()
    }

    /// Close every session, bypassing the last-tab rule.
    ///
    /// Only for application shutdown, when the owning surface itself goes
    /// away.
    pub fn close_all(&self) {
        let sessions = {
            let mut inner = self.inner.lock().unwrap();
            inner.active = None;
            std::mem::take(&mut inner.sessions)
        };
        for session in sessions {
            session.close();
        }
        info!("All tabs closed");
    }
}
