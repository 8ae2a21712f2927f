//! Explicit session registry owned by the control surface.
//!
//! Maps account → live session handle. Passed by reference wherever
//! session state is needed, never reached as ambient global state.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Result};
use tracing::info;

use crate::session::SessionHandle;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a started session. Refuses a second live session for the same
    /// account; a finished entry is replaced.
    pub fn register(&self, handle: SessionHandle) -> Result<()> {
        let mut sessions = self.sessions.lock().expect("registry lock");
        if let Some(existing) = sessions.get(handle.account()) {
            if existing.is_running() {
                bail!("session already running for {}", handle.account());
            }
        }
        sessions.insert(handle.account().to_string(), handle);
        Ok(())
    }

    pub fn is_running(&self, account: &str) -> bool {
        let sessions = self.sessions.lock().expect("registry lock");
        sessions.get(account).is_some_and(SessionHandle::is_running)
    }

    /// Whether the account's annotation worker has fully drained.
    /// `None` if the account has no tracked session.
    pub fn is_drained(&self, account: &str) -> Option<bool> {
        let sessions = self.sessions.lock().expect("registry lock");
        sessions.get(account).map(SessionHandle::is_drained)
    }

    /// Request shutdown of one session. Returns false if untracked.
    pub fn request_stop(&self, account: &str) -> bool {
        let sessions = self.sessions.lock().expect("registry lock");
        match sessions.get(account) {
            Some(handle) => {
                handle.request_stop();
                true
            }
            None => false,
        }
    }

    /// Request shutdown of every tracked session. Each collector closes
    /// its live source handle on the way out.
    pub fn stop_all(&self) {
        let sessions = self.sessions.lock().expect("registry lock");
        for (account, handle) in sessions.iter() {
            info!(account, "Requesting session stop");
            handle.request_stop();
        }
    }

    /// Remove and return a session handle, e.g. to `wait()` on it.
    pub fn take(&self, account: &str) -> Option<SessionHandle> {
        let mut sessions = self.sessions.lock().expect("registry lock");
        sessions.remove(account)
    }
}
