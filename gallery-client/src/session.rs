use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ClientError;
use crate::models::User;

/// Persisted authentication state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub token: Option<String>,
    pub user: Option<User>,
}

/// Durable storage behind a [`Session`].
pub trait SessionStore: Send + Sync {
    fn load(&self) -> io::Result<SessionState>;
    fn save(&self, state: &SessionState) -> io::Result<()>;
    fn clear(&self) -> io::Result<()>;
}

/// JSON file store, the CLI's equivalent of browser local storage.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> io::Result<SessionState> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(SessionState::default()),
            Err(e) => return Err(e),
        };
        serde_json::from_str(&raw).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn save(&self, state: &SessionState) -> io::Result<()> {
        let raw = serde_json::to_string_pretty(state)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.path, raw)
    }

    fn clear(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    inner: Arc<Mutex<SessionState>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: SessionState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.inner
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> io::Result<SessionState> {
        Ok(self.snapshot())
    }

    fn save(&self, state: &SessionState) -> io::Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("session store poisoned"))?;
        *guard = state.clone();
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        self.save(&SessionState::default())
    }
}

/// Token and profile of the signed-in user, written through to a store.
#[derive(Clone)]
pub struct Session {
    state: SessionState,
    store: Arc<dyn SessionStore>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.token().is_some())
            .field("user", &self.state.user)
            .finish()
    }
}

impl Session {
    /// Restores the persisted state. A store that cannot be read yields an
    /// empty session.
    pub fn load(store: impl SessionStore + 'static) -> Self {
        let state = store.load().unwrap_or_else(|e| {
            warn!(error = %e, "failed to read stored session");
            SessionState::default()
        });
        Self {
            state,
            store: Arc::new(store),
        }
    }

    pub fn in_memory() -> Self {
        Self::load(MemorySessionStore::new())
    }

    pub fn token(&self) -> Option<&str> {
        self.state.token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn require_token(&self) -> Result<&str, ClientError> {
        self.token().ok_or_else(|| ClientError::Auth {
            status: None,
            message: "not logged in".into(),
        })
    }

    pub fn set(&mut self, token: String, user: User) {
        self.state = SessionState {
            token: Some(token),
            user: Some(user),
        };
        self.persist();
    }

    pub fn set_user(&mut self, user: User) {
        self.state.user = Some(user);
        self.persist();
    }

    pub fn clear(&mut self) {
        self.state = SessionState::default();
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear stored session");
        }
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.state) {
            warn!(error = %e, "failed to persist session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "u1".into(),
            name: Some("Ada".into()),
            email: Some("ada@example.com".into()),
            image: None,
            role: Some("admin".into()),
        }
    }

    #[test]
    fn file_store_round_trips_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut session = Session::load(FileSessionStore::new(&path));
        assert!(session.token().is_none());
        session.set("tok".into(), user());

        let restored = Session::load(FileSessionStore::new(&path));
        assert_eq!(restored.token(), Some("tok"));
        assert_eq!(restored.user().and_then(|u| u.name.as_deref()), Some("Ada"));

        session.clear();
        assert!(!path.exists());
        assert!(Session::load(FileSessionStore::new(&path)).token().is_none());
    }

    #[test]
    fn corrupt_file_yields_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        let session = Session::load(FileSessionStore::new(&path));
        assert!(session.require_token().is_err());
    }

    #[test]
    fn empty_token_counts_as_logged_out() {
        let store = MemorySessionStore::with_state(SessionState {
            token: Some(String::new()),
            user: None,
        });
        let session = Session::load(store);
        assert!(session.token().is_none());
        assert!(session.require_token().unwrap_err().is_session_expired());
    }

    #[test]
    fn set_user_keeps_token_and_writes_through() {
        let store = MemorySessionStore::new();
        let mut session = Session::load(store.clone());
        session.set("tok".into(), user());
        let mut renamed = user();
        renamed.name = Some("Grace".into());
        session.set_user(renamed.clone());

        let stored = store.snapshot();
        assert_eq!(stored.token.as_deref(), Some("tok"));
        assert_eq!(stored.user, Some(renamed));
    }
}
