//! Session registry: at most one live session per principal.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub principal: String,
    pub created_utc: DateTime<Utc>,
    pub last_accessed_utc: DateTime<Utc>,
}

impl Session {
    fn new(principal: String) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            principal,
            created_utc: now,
            last_accessed_utc: now,
        }
    }

    fn is_expired(&self, now: DateTime<Utc>, idle_timeout: Duration) -> bool {
        (now - self.last_accessed_utc)
            .to_std()
            .is_ok_and(|idle| idle > idle_timeout)
    }
}

pub struct SessionRegistry {
    sessions: DashMap<SessionId, Session>,
    by_principal: DashMap<String, SessionId>,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            by_principal: DashMap::new(),
            idle_timeout,
        }
    }

    /// Start a session for `principal`, invalidating any previous one.
    ///
    /// The principal's index entry stays locked until the new session is
    /// stored, so concurrent logins for one principal are serialized.
    pub fn establish(&self, principal: &str) -> Session {
        let session = Session::new(principal.to_string());

        match self.by_principal.entry(principal.to_string()) {
            Entry::Occupied(mut entry) => {
                let previous = entry.insert(session.id);
                self.sessions.remove(&previous);
                self.sessions.insert(session.id, session.clone());
                tracing::info!(
                    principal = %principal,
                    expired_session = %previous,
                    "Previous session invalidated by new login"
                );
            }
            Entry::Vacant(entry) => {
                self.sessions.insert(session.id, session.clone());
                entry.insert(session.id);
            }
        }

        session
    }

    /// Look up a live session and refresh its idle clock.
    pub fn touch(&self, id: &SessionId) -> Option<Session> {
        let now = Utc::now();
        {
            let mut session = self.sessions.get_mut(id)?;
            if !session.is_expired(now, self.idle_timeout) {
                session.last_accessed_utc = now;
                return Some(session.clone());
            }
        }

        self.invalidate(id);
        None
    }

    pub fn invalidate(&self, id: &SessionId) -> Option<Session> {
        let (_, session) = self.sessions.remove(id)?;
        self.by_principal
            .remove_if(&session.principal, |_, current| current == id);
        Some(session)
    }

    /// Drop idle sessions. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let expired: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|entry| entry.is_expired(now, self.idle_timeout))
            .map(|entry| *entry.key())
            .collect();

        expired
            .iter()
            .filter(|id| self.invalidate(id).is_some())
            .count()
    }

    pub fn current_for(&self, principal: &str) -> Option<SessionId> {
        self.by_principal.get(principal).map(|id| *id)
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }
}
