//! Lifecycle of the one note currently opened in the detail view.
//!
//! ```text
//! Closed -> Viewing -> Editing -> Committing -> Viewing
//!           Viewing -> Committing(archive only) -> Viewing
//! any    -> Closed            (close / remove)
//! ```
//!
//! Staged edits live only here until a commit round-trips through the
//! [`NoteStore`].

use crate::api::NoteService;
use crate::error::{ApiError, ApiResult};
use crate::models::{Note, NoteDraft, NotePatch};
use crate::store::NoteStore;
use crate::util::parse_tag_input;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditMode {
    Closed,
    Viewing,
    Editing,
    Committing { archive_only: bool },
}

impl EditMode {
    fn label(self) -> &'static str {
        match self {
            EditMode::Closed => "closed",
            EditMode::Viewing => "viewing",
            EditMode::Editing => "editing",
            EditMode::Committing { .. } => "committing",
        }
    }
}

/// One staged change to the working copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Field {
    Title(String),
    Content(String),
    Tags(Vec<String>),
    /// The tag box as typed, `"; "`-separated.
    TagInput(String),
    Archived(bool),
}

pub struct NoteEditingSession<R> {
    store: Rc<NoteStore<R>>,
    mode: EditMode,
    /// Last server copy; `None` while composing a new note.
    canonical: Option<Note>,
    working: NoteDraft,
    error: Option<String>,
}

impl<R: NoteService> NoteEditingSession<R> {
    pub fn new(store: Rc<NoteStore<R>>) -> Self {
        Self {
            store,
            mode: EditMode::Closed,
            canonical: None,
            working: NoteDraft::default(),
            error: None,
        }
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn working_copy(&self) -> &NoteDraft {
        &self.working
    }

    pub fn canonical(&self) -> Option<&Note> {
        self.canonical.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_new(&self) -> bool {
        self.mode != EditMode::Closed && self.canonical.is_none()
    }

    fn require(&self, mode: EditMode, action: &'static str) -> ApiResult<()> {
        if self.mode == mode {
            Ok(())
        } else {
            Err(ApiError::InvalidTransition {
                from: self.mode.label(),
                action,
            })
        }
    }

    /// View an existing note.
    pub fn open(&mut self, note: &Note) -> ApiResult<()> {
        self.require(EditMode::Closed, "open a note")?;
        tracing::debug!(id = %note.id, "editing session opened");
        self.canonical = Some(note.clone());
        self.working = NoteDraft::from(note);
        self.error = None;
        self.mode = EditMode::Viewing;
        Ok(())
    }

    /// View an empty, not yet saved note.
    pub fn open_new(&mut self) -> ApiResult<()> {
        self.require(EditMode::Closed, "open a note")?;
        tracing::debug!("editing session opened for a new note");
        self.canonical = None;
        self.working = NoteDraft::default();
        self.error = None;
        self.mode = EditMode::Viewing;
        Ok(())
    }

    /// The "add note" flow: a new note, straight into editing.
    pub fn compose(&mut self) -> ApiResult<()> {
        self.open_new()?;
        self.begin_edit()
    }

    pub fn begin_edit(&mut self) -> ApiResult<()> {
        self.require(EditMode::Viewing, "edit")?;
        self.mode = EditMode::Editing;
        Ok(())
    }

    pub fn stage_field(&mut self, field: Field) -> ApiResult<()> {
        self.require(EditMode::Editing, "change a field")?;
        match field {
            Field::Title(v) => self.working.title = v,
            Field::Content(v) => self.working.content = v,
            Field::Tags(v) => self.working.tags = v,
            Field::TagInput(v) => self.working.tags = parse_tag_input(&v),
            Field::Archived(v) => self.working.is_archived = v,
        }
        Ok(())
    }

    /// Save the staged fields. On failure the session stays in editing with
    /// the edits intact, so the user can retry.
    pub async fn commit(&mut self) -> ApiResult<Note> {
        self.require(EditMode::Editing, "save")?;
        let pending = Pending::enter(
            &mut self.mode,
            EditMode::Committing {
                archive_only: false,
            },
            EditMode::Editing,
        );

        let staged = self.working.clone();
        let result = match self.canonical.as_ref().map(|n| n.id.clone()) {
            Some(id) => self.store.update(&id, NotePatch::from(staged)).await,
            None => match self.store.create(staged).await {
                // Pick up whatever the server defaulted; a failed reload is
                // reported by the store and does not undo the save.
                Ok(created) => {
                    if let Err(e) = self.store.load_all().await {
                        tracing::warn!(error = %e, "reload after create failed");
                    }
                    Ok(self.store.get(&created.id).unwrap_or(created))
                }
                Err(e) => Err(e),
            },
        };
        drop(pending);

        match result {
            Ok(note) => {
                tracing::debug!(id = %note.id, "editing session committed");
                self.accept(note.clone());
                Ok(note)
            }
            Err(e) => {
                tracing::warn!(error = %e, "commit failed; edits kept");
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Mark the note archived, leaving every other field at its last server
    /// value. Archiving an archived note succeeds without a request.
    pub async fn archive(&mut self) -> ApiResult<Note> {
        self.require(EditMode::Viewing, "archive")?;
        let Some(current) = self.canonical.clone() else {
            return Err(ApiError::InvalidTransition {
                from: "composing",
                action: "archive",
            });
        };
        if current.is_archived {
            return Ok(current);
        }

        let pending = Pending::enter(
            &mut self.mode,
            EditMode::Committing { archive_only: true },
            EditMode::Viewing,
        );
        let patch = NotePatch {
            is_archived: Some(true),
            ..NotePatch::from(NoteDraft::from(&current))
        };
        let result = self.store.update(&current.id, patch).await;
        drop(pending);

        match result {
            Ok(note) => {
                tracing::debug!(id = %note.id, "note archived");
                self.accept(note.clone());
                Ok(note)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Delete the note and close. The session closes whatever the outcome;
    /// the store only drops the note if the server confirmed.
    pub async fn remove(&mut self) -> ApiResult<()> {
        let target = self.canonical.as_ref().map(|n| n.id.clone());
        self.close();
        match target {
            Some(id) => self.store.delete(&id).await,
            None => Ok(()),
        }
    }

    /// Drop staged edits without talking to the server.
    pub fn close(&mut self) {
        if self.mode != EditMode::Closed {
            tracing::debug!("editing session closed");
        }
        self.mode = EditMode::Closed;
        self.canonical = None;
        self.working = NoteDraft::default();
        self.error = None;
    }

    fn accept(&mut self, note: Note) {
        self.working = NoteDraft::from(&note);
        self.canonical = Some(note);
        self.error = None;
        self.mode = EditMode::Viewing;
    }
}

/// Holds the session in `Committing` while a save is awaited and puts it
/// back to `fallback` when dropped, including when the save's future is.
struct Pending<'a> {
    mode: &'a mut EditMode,
    fallback: EditMode,
}

impl<'a> Pending<'a> {
    fn enter(mode: &'a mut EditMode, during: EditMode, fallback: EditMode) -> Self {
        *mode = during;
        Self { mode, fallback }
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        *self.mode = self.fallback;
    }
}
