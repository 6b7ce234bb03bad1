use crate::api::NoteService;
use crate::filter::{self, DateRange, FilterSortConfig, SortKey};
use crate::models::Note;
use crate::store::{NoteStore, StoreState, SubscriptionId};
use leptos::prelude::*;

/// Reactive mirror of a [`NoteStore`] plus the list controls of the notes view.
#[derive(Clone, Copy)]
pub struct NotesState {
    /// Raw list, archived notes included.
    pub notes: RwSignal<Vec<Note>>,
    pub notes_loading: RwSignal<bool>,
    pub notes_error: RwSignal<Option<String>>,

    pub filter: RwSignal<FilterSortConfig>,

    /// Archived panel; collapsed until the user opens it.
    pub show_archived: RwSignal<bool>,
}

impl NotesState {
    pub fn new() -> Self {
        Self {
            notes: RwSignal::new(vec![]),
            notes_loading: RwSignal::new(false),
            notes_error: RwSignal::new(None),
            filter: RwSignal::new(FilterSortConfig::default()),
            show_archived: RwSignal::new(false),
        }
    }

    /// Copy the store's current state in and follow every later change.
    pub fn bind<R: NoteService>(&self, store: &NoteStore<R>) -> SubscriptionId {
        self.apply(&store.snapshot());
        let this = *self;
        store.subscribe(move |state| this.apply(state))
    }

    fn apply(&self, state: &StoreState) {
        self.notes.set(state.notes.clone());
        self.notes_loading.set(state.loading);
        self.notes_error.set(state.error.clone());
    }

    pub fn visible_notes(&self) -> Vec<Note> {
        self.notes
            .with(|raw| self.filter.with(|config| filter::derive(raw, config)))
    }

    pub fn archived_notes(&self) -> Vec<Note> {
        self.notes.with(|raw| filter::archived(raw))
    }

    pub fn available_tags(&self) -> Vec<String> {
        self.notes.with(|raw| filter::available_tags(raw))
    }

    pub fn set_search(&self, search: impl Into<String>) {
        let search = search.into();
        self.filter.update(|f| f.search = search);
    }

    /// An empty selection clears the tag filter.
    pub fn set_tag(&self, tag: impl Into<String>) {
        let tag = tag.into();
        self.filter
            .update(|f| f.tag = Some(tag).filter(|t| !t.is_empty()));
    }

    pub fn set_date_range(&self, range: DateRange) {
        self.filter.update(|f| f.date_range = range);
    }

    pub fn set_sort(&self, sort: SortKey) {
        self.filter.update(|f| f.sort = sort);
    }

    pub fn clear_filters(&self) {
        self.filter.set(FilterSortConfig::default());
    }

    pub fn toggle_archived(&self) {
        self.show_archived.update(|open| *open = !*open);
    }
}

impl Default for NotesState {
    fn default() -> Self {
        Self::new()
    }
}
