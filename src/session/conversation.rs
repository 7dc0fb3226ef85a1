//! Chat-style screens: an append-only message log plus the submit/reply lifecycle.
//!
//! A submit appends the user's message right away, then waits for exactly one reply. A
//! successful reply is appended after it; a failed one leaves the log as it was with the user
//! message in place. Only one submit may be in flight: a second one is rejected with
//! [`SubmitError::AlreadyPending`] rather than queued.

use std::sync::Arc;
use std::time::Duration;

use crate::api::CompanionApi;
use crate::error::{ErrorKind, SubmitError};
use crate::session::context::SessionContext;
use crate::utils::is_blank;

/// Name sent for open chats when nobody is signed in.
pub const GUEST_NAME: &str = "guest";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    User,
    Agent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    sender: Origin,
    text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Origin::User,
            text: text.into(),
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            sender: Origin::Agent,
            text: text.into(),
        }
    }

    pub fn sender(&self) -> Origin {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    #[default]
    Idle,
    AwaitingReply,
}

/// Who may use a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAccess {
    /// Needs a stored token and username; otherwise the user is sent to login.
    RequiresLogin,
    /// Falls back to [`GUEST_NAME`] and sends a token only when one is stored.
    Open,
}

/// The request for one submitted message, handed out by [`ConversationSession::begin`]
/// and given back to [`ConversationSession::settle`].
#[derive(Debug)]
pub struct ChatTurn {
    token: Option<String>,
    username: String,
    text: String,
}

impl ChatTurn {
    pub async fn send(&self, api: &dyn CompanionApi, timeout: Duration) -> Result<String, SubmitError> {
        let call = api.post_chat(self.token.as_deref(), &self.username, &self.text);
        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(e)) => Err(SubmitError::ReplyFailed(e)),
            Err(_) => Err(SubmitError::Timeout),
        }
    }
}

pub struct ConversationSession {
    api: Arc<dyn CompanionApi>,
    ctx: SessionContext,
    access: ChatAccess,
    log: Vec<Message>,
    pending_input: String,
    state: TurnState,
}

impl ConversationSession {
    /// Starts with an empty log; nothing from earlier sessions is restored.
    pub fn new(api: Arc<dyn CompanionApi>, ctx: SessionContext, access: ChatAccess) -> Self {
        Self {
            api,
            ctx,
            access,
            log: Vec::new(),
            pending_input: String::new(),
            state: TurnState::Idle,
        }
    }

    pub fn personal_friend(api: Arc<dyn CompanionApi>, ctx: SessionContext) -> Self {
        Self::new(api, ctx, ChatAccess::RequiresLogin)
    }

    pub fn current_log(&self) -> &[Message] {
        &self.log
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.state == TurnState::AwaitingReply
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    pub fn set_pending_input(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
    }

    pub fn api(&self) -> Arc<dyn CompanionApi> {
        Arc::clone(&self.api)
    }

    pub fn request_timeout(&self) -> Duration {
        self.ctx.request_timeout()
    }

    /// Sends `text` and waits for the reply.
    pub async fn submit(&mut self, text: &str) -> Result<(), SubmitError> {
        let turn = self.begin(text)?;
        let api = self.api();
        let outcome = turn.send(api.as_ref(), self.ctx.request_timeout()).await;
        self.settle(turn, outcome)
    }

    /// Submits whatever is in the input box.
    pub async fn submit_pending(&mut self) -> Result<(), SubmitError> {
        let text = self.pending_input.clone();
        self.submit(&text).await
    }

    /// First half of a submit: validates, appends the user message and moves to
    /// [`TurnState::AwaitingReply`]. The returned turn must be passed to [`settle`](Self::settle).
    pub fn begin(&mut self, text: &str) -> Result<ChatTurn, SubmitError> {
        if is_blank(text) {
            return Err(SubmitError::EmptyInput);
        }
        if self.is_awaiting_reply() {
            return Err(SubmitError::AlreadyPending);
        }
        let (token, username) = self.identity()?;

        self.log.push(Message::user(text));
        self.pending_input.clear();
        self.state = TurnState::AwaitingReply;
        Ok(ChatTurn {
            token,
            username,
            text: text.to_owned(),
        })
    }

    /// Second half of a submit: records the reply, or reports why there is none.
    pub fn settle(
        &mut self,
        _turn: ChatTurn,
        outcome: Result<String, SubmitError>,
    ) -> Result<(), SubmitError> {
        self.state = TurnState::Idle;
        match outcome {
            Ok(reply) => {
                self.log.push(Message::agent(reply));
                Ok(())
            }
            Err(e) => {
                log::warn!("chat reply failed: {e}");
                if e.kind() == ErrorKind::Auth {
                    self.ctx.redirect_to_login();
                }
                Err(e)
            }
        }
    }

    fn identity(&self) -> Result<(Option<String>, String), SubmitError> {
        let token = self.ctx.token().filter(|t| !t.is_empty());
        let username = self.ctx.username().filter(|u| !u.is_empty());
        match self.access {
            ChatAccess::RequiresLogin => match (token, username) {
                (Some(token), Some(username)) => Ok((Some(token), username)),
                _ => {
                    self.ctx.redirect_to_login();
                    Err(SubmitError::MissingCredentials)
                }
            },
            ChatAccess::Open => Ok((token, username.unwrap_or_else(|| GUEST_NAME.to_owned()))),
        }
    }
}
