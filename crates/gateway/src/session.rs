//! Per-client sessions. Each session remembers the document it last
//! uploaded; questions are answered against that document.

use std::{
    convert::Infallible,
    sync::atomic::{AtomicU64, Ordering},
};

use {
    axum::{
        extract::FromRequestParts,
        http::{HeaderMap, request::Parts},
    },
    dashmap::DashMap,
    tracing::debug,
};

/// Header naming the caller's session.
pub const SESSION_HEADER: &str = "x-docchat-session";

/// Session used when the header is absent or blank.
pub const DEFAULT_SESSION: &str = "main";

/// Sessions remembered before the least recently used one is forgotten.
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

#[derive(Debug)]
struct ActiveDocument {
    path: String,
    touched: u64,
}

/// Active document per session. Session keys come from clients, so the
/// store is bounded: past `max_sessions` the least recently used session
/// is dropped.
#[derive(Debug)]
pub struct SessionStore {
    active: DashMap<String, ActiveDocument>,
    clock: AtomicU64,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_sessions: usize) -> Self {
        Self {
            active: DashMap::new(),
            clock: AtomicU64::new(0),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Make `path` the session's active document, replacing any earlier one.
    pub fn set_active(&self, session: &str, path: String) {
        while !self.active.contains_key(session) && self.active.len() >= self.max_sessions {
            if !self.evict_oldest() {
                break;
            }
        }
        self.active.insert(session.to_string(), ActiveDocument {
            path,
            touched: self.tick(),
        });
    }

    pub fn active(&self, session: &str) -> Option<String> {
        self.active.get_mut(session).map(|mut entry| {
            entry.touched = self.tick();
            entry.path.clone()
        })
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn evict_oldest(&self) -> bool {
        let oldest = self
            .active
            .iter()
            .min_by_key(|entry| entry.value().touched)
            .map(|entry| entry.key().clone());
        let Some(session) = oldest else {
            return false;
        };
        self.active.remove(&session);
        debug!(%session, "forgot least recently used session");
        true
    }
}

/// Session key taken from [`SESSION_HEADER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKey(pub String);

impl SessionKey {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let key = headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_SESSION);
        Self(key.to_string())
    }
}

impl<S: Send + Sync> FromRequestParts<S> for SessionKey {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
