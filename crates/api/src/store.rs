//! Server-side session store: one [`SessionManager`] per session cookie.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use chrono::{DateTime, Utc};

use propdesk_auth::{AccessEvaluator, SessionConfig, SessionManager, SessionState};

use crate::context::SessionKey;

#[derive(Clone)]
pub struct SessionStore {
    access: Arc<AccessEvaluator>,
    config: SessionConfig,
    inner: Arc<Mutex<HashMap<SessionKey, Arc<SessionManager>>>>,
}

impl SessionStore {
    pub fn new(access: Arc<AccessEvaluator>, config: SessionConfig) -> Self {
        Self {
            access,
            config,
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register a fresh, unauthenticated manager under a new key.
    pub fn create(&self) -> (SessionKey, Arc<SessionManager>) {
        let key = SessionKey::generate();
        let manager = Arc::new(SessionManager::new(self.access.clone(), self.config));
        self.lock().insert(key.clone(), manager.clone());
        (key, manager)
    }

    pub fn get(&self, key: &SessionKey) -> Option<Arc<SessionManager>> {
        self.lock().get(key).cloned()
    }

    /// Remove a session, signing it out so in-flight responses are dropped.
    pub fn remove(&self, key: &SessionKey) -> Option<Arc<SessionManager>> {
        let removed = self.lock().remove(key);
        if let Some(manager) = &removed {
            manager.sign_out();
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop sessions that can never be used again: signed out, rejected,
    /// or past their ceiling. Returns how many were dropped.
    pub fn purge(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, manager| match manager.state() {
            SessionState::Authenticated(session) | SessionState::Expired(session) => {
                session.can_refresh(now)
            }
            SessionState::Authenticating { .. } => true,
            SessionState::Unauthenticated | SessionState::SignedOut => false,
        });
        let purged = before - sessions.len();
        if purged > 0 {
            tracing::debug!(purged, remaining = sessions.len(), "purged sessions");
        }
        purged
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SessionKey, Arc<SessionManager>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
