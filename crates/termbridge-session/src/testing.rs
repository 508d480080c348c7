//! Test doubles for the observer seam.

use std::sync::{Arc, Mutex};

use termbridge_core::ExitInfo;

use crate::session::SessionObserver;

/// One observed callback, in dispatch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    /// Stdout bytes
    Output(Vec<u8>),
    /// Stderr bytes
    ErrorOutput(Vec<u8>),
    /// Process exit
    Exited(ExitInfo),
    /// Scrollback reset
    Cleared,
}

/// Shared log of everything a recording observer saw.
///
/// Clone the log, hand [`EventLog::observer`] to the session, and inspect
/// the log from the test afterwards.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<Observed>>>,
}

impl EventLog {
    /// Build an observer that records into this log.
    pub fn observer(&self) -> Box<dyn SessionObserver> {
        Box::new(RecordingObserver { log: self.clone() })
    }

    /// Everything observed so far, in order.
    pub fn events(&self) -> Vec<Observed> {
        self.events.lock().unwrap().clone()
    }

    /// All stdout bytes concatenated, lossily decoded.
    pub fn output_string(&self) -> String {
        let bytes: Vec<u8> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                Observed::Output(data) => Some(data.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

struct RecordingObserver {
    log: EventLog,
}

impl SessionObserver for RecordingObserver {
    fn output(&mut self, data: &[u8]) {
        self.log.events.lock().unwrap().push(Observed::Output(data.to_vec()));
    }

    fn error_output(&mut self, data: &[u8]) {
        self.log
            .events
            .lock()
            .unwrap()
            .push(Observed::ErrorOutput(data.to_vec()));
    }

    fn exited(&mut self, info: ExitInfo) {
        self.log.events.lock().unwrap().push(Observed::Exited(info));
    }

    fn cleared(&mut self) {
        self.log.events.lock().unwrap().push(Observed::Cleared);
    }
}
