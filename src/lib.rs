//! Client core of a personal notes app.
//!
//! [`store::NoteStore`] holds the signed-in user's notes and keeps them in
//! step with the notes API, [`filter`] derives the list the user sees, and
//! [`editing::NoteEditingSession`] drives the note open in the detail view.
//! [`state::NotesState`] exposes the same data as leptos signals.

pub mod api;
pub mod auth;
pub mod editing;
pub mod error;
pub mod filter;
pub mod models;
pub mod session;
pub mod state;
pub mod storage;
pub mod store;
pub mod util;

pub use api::{ApiClient, AuthService, EnvConfig, NoteService};
pub use editing::{EditMode, Field, NoteEditingSession};
pub use error::{ApiError, ApiErrorKind, ApiResult};
pub use filter::{derive, DateRange, FilterSortConfig, SortKey};
pub use models::{Note, NoteDraft, NotePatch};
pub use session::SessionContext;
pub use state::NotesState;
pub use store::{NoteStore, StoreState};
