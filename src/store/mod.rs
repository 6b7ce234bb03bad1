//! Authoritative in-memory copy of the signed-in user's notes.
//!
//! Every local change to the list happens only after the matching remote call
//! has succeeded. Failures are recorded in the store's error slot and handed
//! back to the caller; nothing is retried.

use crate::api::{CreateNoteRequest, NoteService, UpdateNoteRequest};
use crate::error::{ApiError, ApiResult};
use crate::models::{clean_tags, Note, NoteDraft, NotePatch};
use crate::session::SessionContext;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

pub type SubscriptionId = u64;

type Listener = Rc<dyn Fn(&StoreState)>;

/// Snapshot handed to subscribers after each change.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreState {
    pub notes: Vec<Note>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct NoteStore<R> {
    remote: R,
    owner: String,
    notes: RefCell<Vec<Note>>,
    error: RefCell<Option<String>>,

    /// Calls currently awaiting the remote service.
    in_flight: Cell<usize>,

    /// Bumped by every `load_all`; a response whose generation is no longer
    /// current is dropped.
    load_generation: Cell<u64>,

    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
    next_listener_id: Cell<SubscriptionId>,
}

impl<R: NoteService> NoteStore<R> {
    /// Bind a store to the signed-in user of `session`.
    pub fn new(remote: R, session: &SessionContext) -> ApiResult<Self> {
        let owner = session.require_owner()?.to_string();
        Ok(Self {
            remote,
            owner,
            notes: RefCell::new(Vec::new()),
            error: RefCell::new(None),
            in_flight: Cell::new(0),
            load_generation: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
            next_listener_id: Cell::new(0),
        })
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn notes(&self) -> Vec<Note> {
        self.notes.borrow().clone()
    }

    pub fn with_notes<T>(&self, f: impl FnOnce(&[Note]) -> T) -> T {
        f(&self.notes.borrow())
    }

    pub fn get(&self, id: &str) -> Option<Note> {
        self.notes.borrow().iter().find(|n| n.id == id).cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.get() > 0
    }

    pub fn error(&self) -> Option<String> {
        self.error.borrow().clone()
    }

    pub fn snapshot(&self) -> StoreState {
        StoreState {
            notes: self.notes(),
            loading: self.is_loading(),
            error: self.error(),
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&StoreState) + 'static) -> SubscriptionId {
        let id = self.next_listener_id.get();
        self.next_listener_id.set(id + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Replace the raw list with the server's copy.
    ///
    /// Calls are not queued: when several overlap, only the most recently
    /// started one is applied.
    pub async fn load_all(&self) -> ApiResult<Vec<Note>> {
        let generation = self.load_generation.get().wrapping_add(1);
        self.load_generation.set(generation);
        tracing::debug!(owner = %self.owner, generation, "loading notes");

        let flight = self.begin();
        let result = self.remote.list_notes(&self.owner).await;

        if self.load_generation.get() != generation {
            tracing::debug!(generation, "dropping superseded note list");
            drop(flight);
            return result;
        }

        match result {
            Ok(notes) => {
                let notes = dedupe(notes);
                tracing::info!(count = notes.len(), "notes loaded");
                *self.notes.borrow_mut() = notes.clone();
                self.settle(flight, None);
                Ok(notes)
            }
            Err(e) => {
                self.settle(flight, Some(&e));
                Err(e)
            }
        }
    }

    /// Create a note for the bound owner and append the server's copy.
    ///
    /// The list is not reloaded; callers wanting server-side defaults reflected
    /// everywhere follow up with [`NoteStore::load_all`].
    pub async fn create(&self, draft: NoteDraft) -> ApiResult<Note> {
        let req = CreateNoteRequest {
            title: draft.title,
            content: draft.content,
            user: self.owner.clone(),
            tags: clean_tags(&draft.tags),
            is_archived: draft.is_archived,
        };

        let flight = self.begin();
        let result = self.remote.create_note(&req).await.map(Note::normalized);
        if let Ok(note) = &result {
            tracing::info!(id = %note.id, "note created");
            self.upsert(note.clone());
        }
        self.settle(flight, result.as_ref().err());
        result
    }

    /// Send a full replace of the note's mutable fields, filling anything the
    /// patch leaves out from the local copy.
    pub async fn update(&self, id: &str, patch: NotePatch) -> ApiResult<Note> {
        let Some(base) = self.get(id) else {
            let err = ApiError::NotFound("Note not found".to_string());
            self.record_failure(&err);
            return Err(err);
        };

        let draft = patch.apply_to(&base);
        let req = UpdateNoteRequest {
            title: draft.title,
            content: draft.content,
            tags: clean_tags(&draft.tags),
            is_archived: draft.is_archived,
        };

        let flight = self.begin();
        let result = self
            .remote
            .update_note(id, &req)
            .await
            .and_then(|note| {
                if note.id == id {
                    Ok(note)
                } else {
                    Err(ApiError::parse(format!(
                        "update of {id} answered with note {}",
                        note.id
                    )))
                }
            });
        let result = match result {
            Ok(note) => {
                tracing::info!(id, "note updated");
                Ok(self.upsert(note))
            }
            Err(e) => Err(e),
        };
        self.settle(flight, result.as_ref().err());
        result
    }

    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        let flight = self.begin();
        let result = self.remote.delete_note(id).await;
        if result.is_ok() {
            tracing::info!(id, "note deleted");
            self.notes.borrow_mut().retain(|n| n.id != id);
        }
        self.settle(flight, result.as_ref().err());
        result
    }

    /// Re-fetch a single note and replace (or insert) it by id. Notes of
    /// another owner are never taken in.
    pub async fn refresh(&self, id: &str) -> ApiResult<Note> {
        let flight = self.begin();
        let result = match self.remote.get_note(id).await {
            Ok(note) if note.owner != self.owner => {
                tracing::warn!(id, owner = %note.owner, "refused note of another owner");
                Err(ApiError::NotFound("Note not found".to_string()))
            }
            Ok(note) => Ok(self.upsert(note)),
            Err(e) => Err(e),
        };
        self.settle(flight, result.as_ref().err());
        result
    }

    /// Delete every note of the owner on the server, then locally.
    pub async fn clear_all(&self) -> ApiResult<()> {
        let flight = self.begin();
        let result = self.remote.delete_all_notes(&self.owner).await;
        if result.is_ok() {
            tracing::info!(owner = %self.owner, "all notes deleted");
            self.notes.borrow_mut().clear();
        }
        self.settle(flight, result.as_ref().err());
        result
    }

    /// Forget everything local (logout). In-flight loads will be dropped.
    pub fn reset(&self) {
        self.load_generation
            .set(self.load_generation.get().wrapping_add(1));
        self.notes.borrow_mut().clear();
        *self.error.borrow_mut() = None;
        self.notify();
    }

    /// Insert or replace by id. `id`, `owner` and `created_at` of an existing
    /// entry are kept.
    fn upsert(&self, note: Note) -> Note {
        let mut notes = self.notes.borrow_mut();
        match notes.iter_mut().find(|n| n.id == note.id) {
            Some(existing) => {
                let mut note = note;
                note.owner = existing.owner.clone();
                note.created_at = existing.created_at;
                let note = note.normalized();
                *existing = note.clone();
                note
            }
            None => {
                let note = note.normalized();
                notes.push(note.clone());
                note
            }
        }
    }

    fn begin(&self) -> InFlight<'_, R> {
        self.in_flight.set(self.in_flight.get() + 1);
        self.notify();
        InFlight { store: self }
    }

    /// Record the outcome of a call and release its in-flight slot.
    fn settle(&self, flight: InFlight<'_, R>, error: Option<&ApiError>) {
        *self.error.borrow_mut() = error.map(ToString::to_string);
        drop(flight);
    }

    fn record_failure(&self, error: &ApiError) {
        tracing::warn!(%error, "note operation rejected");
        *self.error.borrow_mut() = Some(error.to_string());
        self.notify();
    }

    fn notify(&self) {
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        if listeners.is_empty() {
            return;
        }
        let state = self.snapshot();
        for listener in listeners {
            listener(&state);
        }
    }
}

/// One call awaiting the remote service. Dropping it, including when the
/// caller drops the call's future, releases the loading state.
struct InFlight<'a, R: NoteService> {
    store: &'a NoteStore<R>,
}

impl<R: NoteService> Drop for InFlight<'_, R> {
    fn drop(&mut self) {
        let in_flight = &self.store.in_flight;
        in_flight.set(in_flight.get().saturating_sub(1));
        self.store.notify();
    }
}

/// Keep the first note per id, normalized.
fn dedupe(notes: Vec<Note>) -> Vec<Note> {
    let mut seen = HashSet::new();
    notes
        .into_iter()
        .filter(|n| seen.insert(n.id.clone()))
        .map(Note::normalized)
        .collect()
}
