use crate::error::{ApiError, ApiResult};
use crate::models::Note;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

#[cfg(all(test, not(target_arch = "wasm32")))]
pub(crate) mod mock;

const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EnvConfig {
    pub api_url: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        let api_url = Self::lookup().unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    // We support BOTH `window.ENV.API_URL` and `window.ENV.api_url`.
    #[cfg(target_arch = "wasm32")]
    fn lookup() -> Option<String> {
        let env = web_sys::window()?.get("ENV")?;
        if env.is_undefined() || !env.is_object() {
            return None;
        }
        ["API_URL", "api_url"].iter().find_map(|key| {
            js_sys::Reflect::get(&env, &(*key).into())
                .ok()
                .and_then(|v| v.as_string())
        })
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn lookup() -> Option<String> {
        std::env::var("NOTES_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Body of `POST /notes/`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,
    pub user: String,
    pub tags: Vec<String>,
    pub is_archived: bool,
}

/// Body of `PUT /notes/{id}`. Always a full replace of the mutable fields.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UpdateNoteRequest {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_archived: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SignupResponse {
    pub exists: bool,
    #[serde(rename = "sameEmail", default)]
    pub same_email: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LoginResponse {
    pub message: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// The remote note store, keyed by note id and owner.
#[allow(async_fn_in_trait)]
pub trait NoteService {
    async fn list_notes(&self, owner: &str) -> ApiResult<Vec<Note>>;
    async fn get_note(&self, id: &str) -> ApiResult<Note>;
    async fn create_note(&self, req: &CreateNoteRequest) -> ApiResult<Note>;
    async fn update_note(&self, id: &str, req: &UpdateNoteRequest) -> ApiResult<Note>;
    async fn delete_note(&self, id: &str) -> ApiResult<()>;
    async fn delete_all_notes(&self, owner: &str) -> ApiResult<()>;
}

#[allow(async_fn_in_trait)]
pub trait AuthService {
    async fn signup(&self, req: &SignupRequest) -> ApiResult<SignupResponse>;
    async fn login(&self, req: &LoginRequest) -> ApiResult<LoginResponse>;
}

impl<T: NoteService> NoteService for Rc<T> {
    async fn list_notes(&self, owner: &str) -> ApiResult<Vec<Note>> {
        (**self).list_notes(owner).await
    }

    async fn get_note(&self, id: &str) -> ApiResult<Note> {
        (**self).get_note(id).await
    }

    async fn create_note(&self, req: &CreateNoteRequest) -> ApiResult<Note> {
        (**self).create_note(req).await
    }

    async fn update_note(&self, id: &str, req: &UpdateNoteRequest) -> ApiResult<Note> {
        (**self).update_note(id, req).await
    }

    async fn delete_note(&self, id: &str) -> ApiResult<()> {
        (**self).delete_note(id).await
    }

    async fn delete_all_notes(&self, owner: &str) -> ApiResult<()> {
        (**self).delete_all_notes(owner).await
    }
}

impl<T: AuthService> AuthService for Rc<T> {
    async fn signup(&self, req: &SignupRequest) -> ApiResult<SignupResponse> {
        (**self).signup(req).await
    }

    async fn login(&self, req: &LoginRequest) -> ApiResult<LoginResponse> {
        (**self).login(req).await
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    pub(crate) base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(EnvConfig::new().api_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        context: &'static str,
    ) -> ApiResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "sending request");

        let mut req = self.http.request(method, url);
        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req.send().await.map_err(|e| {
            tracing::warn!(error = %e, context, "request did not complete");
            ApiError::network(context, e)
        })?;

        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let body = res.text().await.unwrap_or_default();
        let err = ApiError::from_response(status.as_u16(), &body);
        tracing::warn!(status = status.as_u16(), error = %err, context, "request rejected");
        Err(err)
    }

    async fn request<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        context: &'static str,
    ) -> ApiResult<T> {
        self.send(method, path, body, context)
            .await?
            .json::<T>()
            .await
            .map_err(ApiError::parse)
    }

    fn note_path(id: &str) -> String {
        format!("/notes/{}", urlencoding::encode(id))
    }

    fn owner_path(owner: &str) -> String {
        format!("/notes/user/{}", urlencoding::encode(owner))
    }
}

impl NoteService for ApiClient {
    async fn list_notes(&self, owner: &str) -> ApiResult<Vec<Note>> {
        self.request::<_, ()>(Method::GET, &Self::owner_path(owner), None, "fetching notes")
            .await
    }

    async fn get_note(&self, id: &str) -> ApiResult<Note> {
        self.request::<_, ()>(Method::GET, &Self::note_path(id), None, "fetching note")
            .await
    }

    async fn create_note(&self, req: &CreateNoteRequest) -> ApiResult<Note> {
        self.request(Method::POST, "/notes/", Some(req), "creating note")
            .await
    }

    async fn update_note(&self, id: &str, req: &UpdateNoteRequest) -> ApiResult<Note> {
        self.request(Method::PUT, &Self::note_path(id), Some(req), "updating note")
            .await
    }

    async fn delete_note(&self, id: &str) -> ApiResult<()> {
        self.send::<()>(Method::DELETE, &Self::note_path(id), None, "deleting note")
            .await
            .map(|_| ())
    }

    async fn delete_all_notes(&self, owner: &str) -> ApiResult<()> {
        self.send::<()>(Method::DELETE, &Self::owner_path(owner), None, "deleting notes")
            .await
            .map(|_| ())
    }
}

impl AuthService for ApiClient {
    async fn signup(&self, req: &SignupRequest) -> ApiResult<SignupResponse> {
        self.request(Method::POST, "/signup", Some(req), "checking the username")
            .await
    }

    async fn login(&self, req: &LoginRequest) -> ApiResult<LoginResponse> {
        self.request(Method::POST, "/login", Some(req), "checking the credentials")
            .await
    }
}
