use crate::error::{ApiError, ApiResult};
use crate::storage::{KeyValueStore, USERNAME_KEY, VISITED_NOTES_KEY};
use std::rc::Rc;

/// Who is signed in, backed by a persisted login marker.
///
/// The marker is the only authorization signal the client has; nothing
/// here validates it against the server.
#[derive(Clone)]
pub struct SessionContext {
    storage: Rc<dyn KeyValueStore>,
    username: Option<String>,
}

impl SessionContext {
    /// Pick up whatever login marker survived from a previous visit.
    pub fn restore(storage: Rc<dyn KeyValueStore>) -> Self {
        let username = storage
            .get(USERNAME_KEY)
            .filter(|u| !u.trim().is_empty());
        Self { storage, username }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn from_local_storage() -> Self {
        Self::restore(Rc::new(crate::storage::LocalStorage))
    }

    /// Called after a successful login or signup.
    pub fn begin(&mut self, username: &str) {
        tracing::info!(username, "session started");
        self.storage.set(USERNAME_KEY, username);
        self.username = Some(username.to_string());
    }

    /// Logout. `visitedNotes` is left in place.
    pub fn end(&mut self) {
        if let Some(username) = self.username.take() {
            tracing::info!(%username, "session ended");
        }
        self.storage.remove(USERNAME_KEY);
    }

    pub fn owner(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn require_owner(&self) -> ApiResult<&str> {
        self.owner().ok_or(ApiError::Unauthorized)
    }

    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }

    pub fn mark_notes_visited(&self) {
        self.storage.set(VISITED_NOTES_KEY, "true");
    }

    /// Whether the login screen should forward straight to the notes view.
    pub fn can_resume(&self) -> bool {
        self.is_authenticated() && self.storage.get(VISITED_NOTES_KEY).is_some()
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
