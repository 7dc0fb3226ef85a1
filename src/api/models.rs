use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Goal {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub username: &'a str,
    pub message: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatReply {
    #[serde(default)]
    pub response: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewGoal<'a> {
    pub title: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GoalsEnvelope {
    pub goals: Vec<Goal>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// What the auth endpoint hands back after a successful login.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LoginReply {
    #[serde(alias = "accessToken")]
    pub token: String,
    #[serde(rename = "userId", alias = "user_id", alias = "id")]
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Body shape used by the backend for errors and confirmations.
#[derive(Debug, Deserialize, Default)]
pub(crate) struct ServerNotice {
    #[serde(default)]
    pub message: Option<String>,
}
