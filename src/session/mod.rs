//! In-memory chat sessions: transcript, version history and the
//! one-generation-at-a-time guard. Idle sessions expire.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::errors::GenError;
use crate::wire::{AgentResult, Message, Role, Version};

pub const DEFAULT_IDLE_TTL_SECS: u64 = 60 * 60;

#[derive(Debug)]
struct Session {
    messages: Vec<Message>,
    versions: Vec<Version>,
    busy: bool,
    last_active: DateTime<Utc>,
}

impl Default for Session {
    fn default() -> Self {
        Self { messages: Vec::new(), versions: Vec::new(), busy: false, last_active: Utc::now() }
    }
}

impl Session {
    fn expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        !self.busy && now - self.last_active >= ttl
    }
}

#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    idle_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_ttl(std::time::Duration::from_secs(DEFAULT_IDLE_TTL_SECS))
    }
}

/// Marks a session as generating until dropped.
pub struct SessionGuard<'a> {
    store: &'a SessionStore,
    id: String,
}

impl SessionGuard<'_> {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Appends the assistant reply and a new version.
    pub fn record_success(&self, user_intent: &str, result: &AgentResult) -> Version {
        let explanation = result.explanation.to_message();
        let version = Version {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            code: result.code.code.clone(),
            user_intent: user_intent.to_string(),
            explanation: explanation.clone(),
        };
        let mut sessions = self.store.sessions.write();
        let session = sessions.entry(self.id.clone()).or_default();
        session.last_active = Utc::now();
        session.messages.push(Message::assistant(explanation));
        session.versions.push(version.clone());
        version
    }

    pub fn record_failure(&self, err: &GenError) {
        let mut sessions = self.store.sessions.write();
        let session = sessions.entry(self.id.clone()).or_default();
        session.last_active = Utc::now();
        session.messages.push(Message::assistant(format!("Error: {err}")));
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        if let Some(s) = self.store.sessions.write().get_mut(&self.id) {
            s.busy = false;
        }
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions untouched for `ttl` are dropped. A busy session never expires.
    pub fn with_idle_ttl(ttl: std::time::Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::days(365 * 100)),
        }
    }

    /// Creates the session if needed, records the user's message and marks it
    /// busy. Fails with `Busy` while another generation holds the session.
    /// Expired sessions are swept first.
    pub fn begin(&self, id: &str, user_intent: &str) -> Result<SessionGuard<'_>, GenError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, s| !s.expired(now, self.idle_ttl));
        if sessions.len() < before {
            log::debug!("expired {} idle session(s)", before - sessions.len());
        }
        let session = sessions.entry(id.to_string()).or_default();
        if session.busy {
            return Err(GenError::Busy(id.to_string()));
        }
        session.busy = true;
        session.last_active = now;
        session.messages.push(Message::user(user_intent));
        Ok(SessionGuard { store: self, id: id.to_string() })
    }

    /// Deletes a session and its history. A session mid-generation is `Busy`.
    pub fn remove(&self, id: &str) -> Result<(), GenError> {
        let mut sessions = self.sessions.write();
        match sessions.get(id) {
            Some(s) if s.busy => Err(GenError::Busy(id.to_string())),
            Some(_) => {
                sessions.remove(id);
                Ok(())
            }
            None => Err(GenError::NotFound(format!("session {id}"))),
        }
    }

    /// Sessions currently held, expired ones included until the next sweep.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn messages(&self, id: &str) -> Result<Vec<Message>, GenError> {
        self.with(id, |s| s.messages.clone())
    }

    pub fn versions(&self, id: &str) -> Result<Vec<Version>, GenError> {
        self.with(id, |s| s.versions.clone())
    }

    pub fn version(&self, id: &str, version_id: &str) -> Result<Version, GenError> {
        self.with(id, |s| s.versions.iter().find(|v| v.id.to_string() == version_id).cloned())?
            .ok_or_else(|| GenError::NotFound(format!("version {version_id}")))
    }

    /// Last user intent and the latest version's code (empty before the first
    /// successful generation).
    pub fn regenerate_input(&self, id: &str) -> Result<(String, String), GenError> {
        self.with(id, |s| {
            let intent = s.messages.iter().rev().find(|m| m.role == Role::User).map(|m| m.content.clone());
            let code = s.versions.last().map(|v| v.code.clone()).unwrap_or_default();
            intent.map(|i| (i, code))
        })?
        .ok_or_else(|| GenError::NotFound(format!("user message in session {id}")))
    }

    fn with<T>(&self, id: &str, f: impl FnOnce(&Session) -> T) -> Result<T, GenError> {
        let now = Utc::now();
        self.sessions
            .read()
            .get(id)
            .filter(|s| !s.expired(now, self.idle_ttl))
            .map(f)
            .ok_or_else(|| GenError::NotFound(format!("session {id}")))
    }
}
