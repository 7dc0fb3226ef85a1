//! Error taxonomy shared by the sessions, the account flow and the API client.
//!
//! Every operation error can be classified with [`ErrorKind`] so a screen can decide how to
//! present it: validation and conflict errors never touched the server, auth errors send the
//! user back to login, network and server errors are shown as a message.

use thiserror::Error;

/// Broad category of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input rejected before any network call.
    Validation,
    /// Missing or rejected credentials; the caller should route to login.
    Auth,
    /// The request failed or timed out.
    Network,
    /// Non-2xx status or a payload we could not understand.
    Server,
    /// Another operation of the same kind is already in flight.
    Conflict,
}

/// Failure of a single remote call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned HTTP {status}{}", status_suffix(.message))]
    Status { status: u16, message: Option<String> },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

fn status_suffix(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

impl ApiError {
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::Malformed(detail.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Network,
            Self::Status { status: 401 | 403, .. } => ErrorKind::Auth,
            Self::Status { .. } | Self::Malformed(_) | Self::Endpoint(_) => ErrorKind::Server,
        }
    }

    /// Server-provided explanation, if the error body carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Outcome of [`ConversationSession::submit`](crate::session::ConversationSession::submit).
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("message is empty")]
    EmptyInput,

    #[error("you need to log in first")]
    MissingCredentials,

    #[error("still waiting for the previous reply")]
    AlreadyPending,

    #[error("no reply from your friend: {0}")]
    ReplyFailed(#[source] ApiError),

    #[error("the reply took too long")]
    Timeout,
}

impl SubmitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyInput => ErrorKind::Validation,
            Self::MissingCredentials => ErrorKind::Auth,
            Self::AlreadyPending => ErrorKind::Conflict,
            Self::ReplyFailed(e) => e.kind(),
            Self::Timeout => ErrorKind::Network,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("you need to log in first")]
    MissingCredentials,

    #[error("failed to fetch goals: {0}")]
    LoadFailed(#[source] ApiError),

    #[error("fetching goals took too long")]
    Timeout,
}

impl LoadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredentials => ErrorKind::Auth,
            Self::LoadFailed(e) => e.kind(),
            Self::Timeout => ErrorKind::Network,
        }
    }
}

#[derive(Debug, Error)]
pub enum AddError {
    #[error("goal title cannot be empty")]
    EmptyTitle,

    #[error("you need to log in first")]
    MissingCredentials,

    #[error("failed to add goal: {0}")]
    AddFailed(#[source] ApiError),

    #[error("adding the goal took too long")]
    Timeout,
}

impl AddError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyTitle => ErrorKind::Validation,
            Self::MissingCredentials => ErrorKind::Auth,
            Self::AddFailed(e) => e.kind(),
            Self::Timeout => ErrorKind::Network,
        }
    }
}

#[derive(Debug, Error)]
pub enum CompleteError {
    #[error("another goal is being completed")]
    AlreadyCompleting,

    #[error("no goal with id {0}")]
    NotFound(String),

    #[error("you need to log in first")]
    MissingCredentials,

    #[error("failed to mark goal as complete: {0}")]
    CompleteFailed(#[source] ApiError),

    #[error("completing the goal took too long")]
    Timeout,
}

impl CompleteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyCompleting => ErrorKind::Conflict,
            Self::NotFound(_) => ErrorKind::Validation,
            Self::MissingCredentials => ErrorKind::Auth,
            Self::CompleteFailed(e) => e.kind(),
            Self::Timeout => ErrorKind::Network,
        }
    }
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0} cannot be empty")]
    MissingField(&'static str),

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("{}", rejection_text(.0))]
    Rejected(#[source] ApiError),

    #[error("could not save credentials: {0}")]
    Store(#[from] StoreError),

    #[error("the server took too long to answer")]
    Timeout,
}

fn rejection_text(err: &ApiError) -> String {
    err.server_message()
        .map(str::to_owned)
        .unwrap_or_else(|| err.to_string())
}

impl AccountError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField(_) | Self::PasswordMismatch => ErrorKind::Validation,
            Self::Rejected(e) => e.kind(),
            Self::Store(_) => ErrorKind::Server,
            Self::Timeout => ErrorKind::Network,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no config directory available")]
    NoConfigDir,

    #[error("preferences I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("preferences file is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("could not serialize preferences: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("config file is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid backend url {url:?}: {source}")]
    BackendUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid request timeout: {0}")]
    Timeout(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ForumError {
    #[error("a post needs both a title and some content")]
    IncompletePost,

    #[error("comment is empty")]
    EmptyComment,

    #[error("no post with id {0}")]
    PostNotFound(u64),
}
