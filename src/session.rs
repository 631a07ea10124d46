use super::filter::FilterSpec;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

// Opaque session handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

// Keeps the last applied filter per session
pub trait SessionStore: Send + Sync {
    fn save(&self, id: SessionId, spec: FilterSpec);
    fn load(&self, id: &SessionId) -> Option<FilterSpec>;
    fn remove(&self, id: &SessionId) -> Option<FilterSpec>;
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<SessionId, FilterSpec>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn save(&self, id: SessionId, spec: FilterSpec) {
        self.sessions.insert(id, spec);
    }

    fn load(&self, id: &SessionId) -> Option<FilterSpec> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    fn remove(&self, id: &SessionId) -> Option<FilterSpec> {
        self.sessions.remove(id).map(|(_, spec)| spec)
    }
}
