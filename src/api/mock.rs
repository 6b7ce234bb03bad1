//! In-memory stand-in for the notes backend, for tests.

use super::{
    AuthService, CreateNoteRequest, LoginRequest, LoginResponse, NoteService, SignupRequest,
    SignupResponse, UpdateNoteRequest,
};
use crate::error::{ApiError, ApiResult};
use crate::models::Note;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use tokio::sync::oneshot;

#[derive(Default)]
pub(crate) struct MockNoteService {
    notes: RefCell<Vec<Note>>,
    users: RefCell<Vec<(String, String, String)>>,
    next_id: Cell<u64>,
    ticks: Cell<i64>,
    failures: RefCell<VecDeque<ApiError>>,
    gates: RefCell<VecDeque<oneshot::Receiver<()>>>,
    calls: RefCell<Vec<String>>,
}

impl MockNoteService {
    pub fn new() -> Self {
        Self::default()
    }

    fn now(&self) -> DateTime<Utc> {
        let t = self.ticks.get() + 1;
        self.ticks.set(t);
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(t)
    }

    /// Seed a note directly on the "server".
    pub fn insert(&self, note: Note) {
        self.notes.borrow_mut().push(note);
    }

    pub fn server_notes(&self) -> Vec<Note> {
        self.notes.borrow().clone()
    }

    pub fn add_user(&self, username: &str, email: &str, password: &str) {
        self.users
            .borrow_mut()
            .push((username.into(), email.into(), password.into()));
    }

    /// The next call fails with `err` instead of touching the server state.
    pub fn fail_next(&self, err: ApiError) {
        self.failures.borrow_mut().push_back(err);
    }

    /// The next call waits for `gate` before it returns its (already computed) answer.
    pub fn gate_next(&self, gate: oneshot::Receiver<()>) {
        self.gates.borrow_mut().push_back(gate);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn begin(&self, call: String) -> (Option<ApiError>, Option<oneshot::Receiver<()>>) {
        self.calls.borrow_mut().push(call);
        let failure = self.failures.borrow_mut().pop_front();
        let gate = self.gates.borrow_mut().pop_front();
        (failure, gate)
    }

    async fn settle<T>(gate: Option<oneshot::Receiver<()>>, result: ApiResult<T>) -> ApiResult<T> {
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        result
    }

    fn not_found() -> ApiError {
        ApiError::NotFound("Note not found".to_string())
    }
}

impl NoteService for MockNoteService {
    async fn list_notes(&self, owner: &str) -> ApiResult<Vec<Note>> {
        let (failure, gate) = self.begin(format!("GET /notes/user/{owner}"));
        let result = match failure {
            Some(e) => Err(e),
            None => Ok(self
                .notes
                .borrow()
                .iter()
                .filter(|n| n.owner == owner)
                .cloned()
                .collect()),
        };
        Self::settle(gate, result).await
    }

    async fn get_note(&self, id: &str) -> ApiResult<Note> {
        let (failure, gate) = self.begin(format!("GET /notes/{id}"));
        let result = match failure {
            Some(e) => Err(e),
            None => self
                .notes
                .borrow()
                .iter()
                .find(|n| n.id == id)
                .cloned()
                .ok_or_else(Self::not_found),
        };
        Self::settle(gate, result).await
    }

    async fn create_note(&self, req: &CreateNoteRequest) -> ApiResult<Note> {
        let (failure, gate) = self.begin("POST /notes/".to_string());
        let result = match failure {
            Some(e) => Err(e),
            None => {
                let id = self.next_id.get() + 1;
                self.next_id.set(id);
                let now = self.now();
                let note = Note {
                    id: format!("srv-{id}"),
                    owner: req.user.clone(),
                    title: req.title.clone(),
                    content: req.content.clone(),
                    tags: req.tags.clone(),
                    created_at: now,
                    updated_at: now,
                    is_archived: req.is_archived,
                };
                self.notes.borrow_mut().push(note.clone());
                Ok(note)
            }
        };
        Self::settle(gate, result).await
    }

    async fn update_note(&self, id: &str, req: &UpdateNoteRequest) -> ApiResult<Note> {
        let (failure, gate) = self.begin(format!("PUT /notes/{id}"));
        let result = match failure {
            Some(e) => Err(e),
            None => {
                let now = self.now();
                let mut notes = self.notes.borrow_mut();
                match notes.iter_mut().find(|n| n.id == id) {
                    Some(note) => {
                        note.title = req.title.clone();
                        note.content = req.content.clone();
                        note.tags = req.tags.clone();
                        note.is_archived = req.is_archived;
                        note.updated_at = now;
                        Ok(note.clone())
                    }
                    None => Err(Self::not_found()),
                }
            }
        };
        Self::settle(gate, result).await
    }

    async fn delete_note(&self, id: &str) -> ApiResult<()> {
        let (failure, gate) = self.begin(format!("DELETE /notes/{id}"));
        let result = match failure {
            Some(e) => Err(e),
            None => {
                let mut notes = self.notes.borrow_mut();
                let before = notes.len();
                notes.retain(|n| n.id != id);
                if notes.len() == before {
                    Err(ApiError::NotFound("No note found with this ID".to_string()))
                } else {
                    Ok(())
                }
            }
        };
        Self::settle(gate, result).await
    }

    async fn delete_all_notes(&self, owner: &str) -> ApiResult<()> {
        let (failure, gate) = self.begin(format!("DELETE /notes/user/{owner}"));
        let result = match failure {
            Some(e) => Err(e),
            None => {
                let mut notes = self.notes.borrow_mut();
                let before = notes.len();
                notes.retain(|n| n.owner != owner);
                if notes.len() == before {
                    Err(ApiError::NotFound("User doesn't exist".to_string()))
                } else {
                    Ok(())
                }
            }
        };
        Self::settle(gate, result).await
    }
}

impl AuthService for MockNoteService {
    async fn signup(&self, req: &SignupRequest) -> ApiResult<SignupResponse> {
        let (failure, gate) = self.begin("POST /signup".to_string());
        let result = match failure {
            Some(e) => Err(e),
            None => {
                let existing = self
                    .users
                    .borrow()
                    .iter()
                    .find(|(u, _, _)| *u == req.username)
                    .map(|(_, email, _)| *email == req.email);
                match existing {
                    Some(same_email) => Ok(SignupResponse {
                        exists: true,
                        same_email,
                        message: None,
                    }),
                    None => {
                        self.add_user(&req.username, &req.email, &req.password);
                        Ok(SignupResponse {
                            exists: false,
                            same_email: false,
                            message: Some("Signup successful".to_string()),
                        })
                    }
                }
            }
        };
        Self::settle(gate, result).await
    }

    async fn login(&self, req: &LoginRequest) -> ApiResult<LoginResponse> {
        let (failure, gate) = self.begin("POST /login".to_string());
        let result = match failure {
            Some(e) => Err(e),
            None => {
                let users = self.users.borrow();
                match users.iter().find(|(u, _, _)| *u == req.username) {
                    None => Err(ApiError::Remote {
                        status: 400,
                        message: "Invalid username".to_string(),
                    }),
                    Some((_, _, password)) if *password != req.password => Err(ApiError::Remote {
                        status: 400,
                        message: "Invalid password".to_string(),
                    }),
                    Some(_) => Ok(LoginResponse {
                        message: "Login successful".to_string(),
                        username: Some(req.username.clone()),
                    }),
                }
            }
        };
        Self::settle(gate, result).await
    }
}
