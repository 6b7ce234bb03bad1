use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiErrorKind {
    Validation,
    Unauthorized,
    NotFound,
    Remote,
    Network,
    Parse,
    InvalidState,
}

/// Every failure the note client can surface.
///
/// `Display` is the message shown to the user.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Rejected before any request was sent.
    #[error("{0}")]
    Validation(String),

    #[error("not signed in")]
    Unauthorized,

    #[error("{}", if *same_email {
        "Username and Email pair already exists, try logging in or try with other username and email"
    } else {
        "Username is already taken, please choose a different username"
    })]
    AccountExists { same_email: bool },

    /// The server answered 404; carries its `detail` verbatim.
    #[error("{0}")]
    NotFound(String),

    /// Any other non-2xx answer.
    #[error("{message}")]
    Remote { status: u16, message: String },

    /// The request never completed.
    #[error("Error {context}: {reason}")]
    Network { context: &'static str, reason: String },

    #[error("Invalid response: {0}")]
    Parse(String),

    #[error("cannot {action} while {from}")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },
}

impl ApiError {
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            ApiError::Validation(_) | ApiError::AccountExists { .. } => ApiErrorKind::Validation,
            ApiError::Unauthorized => ApiErrorKind::Unauthorized,
            ApiError::NotFound(_) => ApiErrorKind::NotFound,
            ApiError::Remote { .. } => ApiErrorKind::Remote,
            ApiError::Network { .. } => ApiErrorKind::Network,
            ApiError::Parse(_) => ApiErrorKind::Parse,
            ApiError::InvalidTransition { .. } => ApiErrorKind::InvalidState,
        }
    }

    pub(crate) fn network(context: &'static str, e: impl std::fmt::Display) -> Self {
        ApiError::Network {
            context,
            reason: e.to_string(),
        }
    }

    pub(crate) fn parse(e: impl std::fmt::Display) -> Self {
        ApiError::Parse(e.to_string())
    }

    /// Build the error for a non-2xx response from its status and raw body.
    ///
    /// The backend puts a human-readable message in `detail`; validation
    /// failures put a list there instead, which falls back to the generic text.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
            .filter(|d| !d.trim().is_empty());

        let message = detail.unwrap_or_else(|| format!("Request failed ({status})"));
        if status == 404 {
            ApiError::NotFound(message)
        } else {
            ApiError::Remote { status, message }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
