//! Scripted [`CompanionApi`] used by the unit tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::api::client::CompanionApi;
use crate::api::models::{Goal, LoginReply, SignupRequest};
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Chat { token: Option<String>, username: String, message: String },
    GetGoals { token: String },
    PostGoal { token: String, title: String },
    Complete { token: String, id: String },
    Signup(SignupRequest),
    Login { username: String, password: String },
}

/// Replays queued results in order. An empty queue answers with HTTP 500.
#[derive(Default)]
pub struct FakeApi {
    calls: Mutex<Vec<Call>>,
    chat: Mutex<VecDeque<Result<String, ApiError>>>,
    goals: Mutex<VecDeque<Result<Vec<Goal>, ApiError>>>,
    completions: Mutex<VecDeque<Result<(), ApiError>>>,
    signups: Mutex<VecDeque<Result<Option<String>, ApiError>>>,
    logins: Mutex<VecDeque<Result<LoginReply, ApiError>>>,
}

fn unscripted() -> ApiError {
    ApiError::Status { status: 500, message: Some("unscripted".into()) }
}

pub fn goal(id: &str, title: &str, completed: bool) -> Goal {
    Goal {
        id: id.into(),
        title: title.into(),
        completed,
        created_at: None,
    }
}

impl FakeApi {
    pub fn reply_chat(&self, result: Result<String, ApiError>) {
        self.chat.lock().push_back(result);
    }

    /// Queues an answer for the next `get_goals` or `post_goal`.
    pub fn reply_goals(&self, result: Result<Vec<Goal>, ApiError>) {
        self.goals.lock().push_back(result);
    }

    pub fn reply_complete(&self, result: Result<(), ApiError>) {
        self.completions.lock().push_back(result);
    }

    pub fn reply_signup(&self, result: Result<Option<String>, ApiError>) {
        self.signups.lock().push_back(result);
    }

    pub fn reply_login(&self, result: Result<LoginReply, ApiError>) {
        self.logins.lock().push_back(result);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CompanionApi for FakeApi {
    async fn post_chat(
        &self,
        token: Option<&str>,
        username: &str,
        message: &str,
    ) -> Result<String, ApiError> {
        self.calls.lock().push(Call::Chat {
            token: token.map(str::to_owned),
            username: username.into(),
            message: message.into(),
        });
        self.chat.lock().pop_front().unwrap_or_else(|| Err(unscripted()))
    }

    async fn get_goals(&self, token: &str) -> Result<Vec<Goal>, ApiError> {
        self.calls.lock().push(Call::GetGoals { token: token.into() });
        self.goals.lock().pop_front().unwrap_or_else(|| Err(unscripted()))
    }

    async fn post_goal(&self, token: &str, title: &str) -> Result<Vec<Goal>, ApiError> {
        self.calls.lock().push(Call::PostGoal {
            token: token.into(),
            title: title.into(),
        });
        self.goals.lock().pop_front().unwrap_or_else(|| Err(unscripted()))
    }

    async fn put_goal_complete(&self, token: &str, id: &str) -> Result<(), ApiError> {
        self.calls.lock().push(Call::Complete {
            token: token.into(),
            id: id.into(),
        });
        self.completions.lock().pop_front().unwrap_or_else(|| Err(unscripted()))
    }

    async fn signup(&self, request: &SignupRequest) -> Result<Option<String>, ApiError> {
        self.calls.lock().push(Call::Signup(request.clone()));
        self.signups.lock().pop_front().unwrap_or_else(|| Err(unscripted()))
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginReply, ApiError> {
        self.calls.lock().push(Call::Login {
            username: username.into(),
            password: password.into(),
        });
        self.logins.lock().pop_front().unwrap_or_else(|| Err(unscripted()))
    }
}
