use crate::api::{AuthService, LoginRequest, NoteService, SignupRequest};
use crate::error::{ApiError, ApiResult};
use crate::session::SessionContext;
use crate::store::NoteStore;
use serde::{Deserialize, Serialize};

const LOGIN_OK: &str = "Login successful";

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    /// Checks that need no server round-trip.
    pub fn validate(&self) -> ApiResult<()> {
        require("Username", &self.username)?;
        require("Email", &self.email)?;
        require("Password", &self.password)?;
        require("Confirm Password", &self.confirm_password)?;
        if self.password != self.confirm_password {
            return Err(ApiError::Validation(
                "Password and Confirm Password do not match, please check that".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> ApiResult<()> {
        require("Username", &self.username)?;
        require("Password", &self.password)
    }
}

fn require(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        Err(ApiError::Validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

/// Register a new account and sign it in.
pub async fn signup<A: AuthService>(
    api: &A,
    session: &mut SessionContext,
    form: &SignupForm,
) -> ApiResult<()> {
    form.validate()?;

    let username = form.username.trim();
    let res = api
        .signup(&SignupRequest {
            username: username.to_string(),
            email: form.email.trim().to_string(),
            password: form.password.clone(),
        })
        .await?;

    if res.exists {
        tracing::debug!(username, same_email = res.same_email, "signup rejected");
        return Err(ApiError::AccountExists {
            same_email: res.same_email,
        });
    }

    session.begin(username);
    Ok(())
}

/// Check credentials and sign the user in. Returns the username the server
/// confirmed.
pub async fn login<A: AuthService>(
    api: &A,
    session: &mut SessionContext,
    form: &LoginForm,
) -> ApiResult<String> {
    form.validate()?;

    let res = api
        .login(&LoginRequest {
            username: form.username.trim().to_string(),
            password: form.password.clone(),
        })
        .await?;

    if res.message != LOGIN_OK {
        return Err(ApiError::Validation(res.message));
    }

    let username = res
        .username
        .unwrap_or_else(|| form.username.trim().to_string());
    session.begin(&username);
    Ok(username)
}

/// Tear the session down and forget the loaded notes.
pub fn logout<R: NoteService>(session: &mut SessionContext, store: &NoteStore<R>) {
    session.end();
    store.reset();
}
