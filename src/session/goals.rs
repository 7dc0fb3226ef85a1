//! The goal tracker: a server-ordered goal list with add and complete mutations.
//!
//! The server is authoritative. Loads and adds replace the local list wholesale with what the
//! server returned; completion flips a single goal in place once the server has accepted it.
//! Nothing is changed optimistically, so a failed call never needs to be rolled back.

use std::sync::Arc;

use crate::api::{CompanionApi, Goal};
use crate::error::{AddError, ApiError, CompleteError, ErrorKind, LoadError};
use crate::session::context::SessionContext;
use crate::utils::is_blank;

/// Proof that a completion was started; pass it back to
/// [`GoalListSession::finish_completion`].
#[derive(Debug)]
pub struct CompletionTicket {
    token: String,
    id: String,
}

impl CompletionTicket {
    pub async fn send(
        &self,
        api: &dyn CompanionApi,
        timeout: std::time::Duration,
    ) -> Result<(), CompleteError> {
        let call = api.put_goal_complete(&self.token, &self.id);
        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(CompleteError::CompleteFailed(e)),
            Err(_) => Err(CompleteError::Timeout),
        }
    }
}

pub struct GoalListSession {
    api: Arc<dyn CompanionApi>,
    ctx: SessionContext,
    goals: Vec<Goal>,
    draft_title: String,
    completing_id: Option<String>,
    loading: bool,
}

impl GoalListSession {
    pub fn new(api: Arc<dyn CompanionApi>, ctx: SessionContext) -> Self {
        Self {
            api,
            ctx,
            goals: Vec::new(),
            draft_title: String::new(),
            completing_id: None,
            loading: false,
        }
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn goal(&self, id: &str) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == id)
    }

    pub fn draft_title(&self) -> &str {
        &self.draft_title
    }

    pub fn set_draft_title(&mut self, title: impl Into<String>) {
        self.draft_title = title.into();
    }

    pub fn completing_id(&self) -> Option<&str> {
        self.completing_id.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn api(&self) -> Arc<dyn CompanionApi> {
        Arc::clone(&self.api)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        self.ctx.request_timeout()
    }

    fn token(&self) -> Option<String> {
        let token = self.ctx.token().filter(|t| !t.is_empty());
        if token.is_none() {
            self.ctx.redirect_to_login();
        }
        token
    }

    /// A token the server refused is as good as none.
    fn check_rejection(&self, kind: ErrorKind) {
        if kind == ErrorKind::Auth {
            self.ctx.redirect_to_login();
        }
    }

    async fn within_timeout<T>(
        &self,
        call: impl Future<Output = Result<T, ApiError>>,
    ) -> Option<Result<T, ApiError>> {
        tokio::time::timeout(self.ctx.request_timeout(), call).await.ok()
    }

    /// Fetches the whole list. On failure the current list is kept.
    pub async fn load(&mut self) -> Result<&[Goal], LoadError> {
        let token = self.token().ok_or(LoadError::MissingCredentials)?;
        self.loading = true;
        let api = self.api();
        let outcome = self.within_timeout(api.get_goals(&token)).await;
        self.loading = false;

        match outcome {
            Some(Ok(goals)) => {
                log::debug!("loaded {} goals", goals.len());
                self.replace(goals);
                Ok(&self.goals)
            }
            Some(Err(e)) => {
                log::warn!("error fetching goals: {e}");
                self.check_rejection(e.kind());
                Err(LoadError::LoadFailed(e))
            }
            None => {
                log::warn!("fetching goals timed out");
                Err(LoadError::Timeout)
            }
        }
    }

    pub async fn add_goal(&mut self, title: &str) -> Result<(), AddError> {
        if is_blank(title) {
            return Err(AddError::EmptyTitle);
        }
        let token = self.token().ok_or(AddError::MissingCredentials)?;
        let api = self.api();

        match self.within_timeout(api.post_goal(&token, title)).await {
            Some(Ok(goals)) => {
                self.replace(goals);
                self.draft_title.clear();
                Ok(())
            }
            Some(Err(e)) => {
                log::warn!("error adding goal: {e}");
                self.check_rejection(e.kind());
                Err(AddError::AddFailed(e))
            }
            None => {
                log::warn!("adding goal timed out");
                Err(AddError::Timeout)
            }
        }
    }

    /// Adds the goal typed into the draft field.
    pub async fn add_draft(&mut self) -> Result<(), AddError> {
        let title = self.draft_title.clone();
        self.add_goal(&title).await
    }

    pub async fn complete_goal(&mut self, id: &str) -> Result<(), CompleteError> {
        let Some(ticket) = self.begin_completion(id)? else {
            return Ok(());
        };
        let api = self.api();
        let outcome = ticket.send(api.as_ref(), self.ctx.request_timeout()).await;
        self.finish_completion(ticket, outcome)
    }

    /// Marks `id` as in flight. Yields `None` for a goal that is already completed, in which
    /// case there is nothing to send.
    pub fn begin_completion(&mut self, id: &str) -> Result<Option<CompletionTicket>, CompleteError> {
        if self.completing_id.is_some() {
            return Err(CompleteError::AlreadyCompleting);
        }
        let goal = self
            .goal(id)
            .ok_or_else(|| CompleteError::NotFound(id.to_owned()))?;
        if goal.completed {
            log::debug!("goal {id} is already complete");
            return Ok(None);
        }
        let token = self.token().ok_or(CompleteError::MissingCredentials)?;

        self.completing_id = Some(id.to_owned());
        Ok(Some(CompletionTicket {
            token,
            id: id.to_owned(),
        }))
    }

    pub fn finish_completion(
        &mut self,
        ticket: CompletionTicket,
        outcome: Result<(), CompleteError>,
    ) -> Result<(), CompleteError> {
        if self.completing_id.as_deref() == Some(ticket.id.as_str()) {
            self.completing_id = None;
        }
        match outcome {
            Ok(()) => {
                match self.goals.iter_mut().find(|g| g.id == ticket.id) {
                    Some(goal) => goal.completed = true,
                    None => log::debug!("goal {} left the list before completion", ticket.id),
                }
                Ok(())
            }
            Err(e) => {
                log::warn!("error marking goal as complete: {e}");
                self.check_rejection(e.kind());
                Err(e)
            }
        }
    }

    fn replace(&mut self, goals: Vec<Goal>) {
        if let Some(id) = &self.completing_id {
            if !goals.iter().any(|g| &g.id == id && !g.completed) {
                self.completing_id = None;
            }
        }
        self.goals = goals;
    }
}
