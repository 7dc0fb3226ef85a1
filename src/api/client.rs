use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::models::{
    ChatReply, ChatRequest, Goal, GoalsEnvelope, LoginReply, LoginRequest, NewGoal, ServerNotice,
    SignupRequest,
};
use crate::config::Config;
use crate::error::ApiError;

/// Remote operations the sessions depend on.
///
/// Every call resolves to parsed data or an [`ApiError`]; a non-2xx status and an unparsable
/// body are both errors.
#[async_trait]
pub trait CompanionApi: Send + Sync {
    /// Sends one chat message and returns the companion's reply text.
    async fn post_chat(
        &self,
        token: Option<&str>,
        username: &str,
        message: &str,
    ) -> Result<String, ApiError>;

    async fn get_goals(&self, token: &str) -> Result<Vec<Goal>, ApiError>;

    /// Creates a goal and returns the full list as the server now sees it.
    async fn post_goal(&self, token: &str, title: &str) -> Result<Vec<Goal>, ApiError>;

    async fn put_goal_complete(&self, token: &str, id: &str) -> Result<(), ApiError>;

    /// Registers an account; yields the server's confirmation text when it sends one.
    async fn signup(&self, request: &SignupRequest) -> Result<Option<String>, ApiError>;

    async fn login(&self, username: &str, password: &str) -> Result<LoginReply, ApiError>;
}

pub struct HttpApiClient {
    http: HttpClient,
    base_url: Url,
}

impl HttpApiClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(config.backend_url.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        Ok(base.join(path.trim_start_matches('/'))?)
    }

    fn with_auth(mut req: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        if let Some(t) = token {
            req = req.header("Authorization", format!("Bearer {}", t));
        }
        req
    }

    async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            let notice = serde_json::from_slice::<ServerNotice>(&body).unwrap_or_default();
            log::warn!("backend answered HTTP {status}");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: notice.message,
            });
        }
        serde_json::from_slice(&body).map_err(|e| ApiError::malformed(e.to_string()))
    }
}

/// Rejects goal lists that would break id uniqueness on the client.
fn unique_goals(goals: Vec<Goal>) -> Result<Vec<Goal>, ApiError> {
    let duplicate = {
        let mut seen = HashSet::with_capacity(goals.len());
        goals
            .iter()
            .find(|goal| !seen.insert(goal.id.as_str()))
            .map(|goal| goal.id.clone())
    };
    match duplicate {
        Some(id) => Err(ApiError::malformed(format!("duplicate goal id {id}"))),
        None => Ok(goals),
    }
}

#[async_trait]
impl CompanionApi for HttpApiClient {
    async fn post_chat(
        &self,
        token: Option<&str>,
        username: &str,
        message: &str,
    ) -> Result<String, ApiError> {
        let url = self.endpoint("api/chatbot")?;
        log::debug!("POST {url}");
        let req = self.http.post(url).json(&ChatRequest { username, message });
        let resp = Self::with_auth(req, token).send().await?;
        let reply: ChatReply = Self::read_json(resp).await?;
        match reply.response {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(ApiError::malformed("chat reply has no response text")),
        }
    }

    async fn get_goals(&self, token: &str) -> Result<Vec<Goal>, ApiError> {
        let url = self.endpoint("api/goals")?;
        log::debug!("GET {url}");
        let resp = Self::with_auth(self.http.get(url), Some(token)).send().await?;
        unique_goals(Self::read_json(resp).await?)
    }

    async fn post_goal(&self, token: &str, title: &str) -> Result<Vec<Goal>, ApiError> {
        let url = self.endpoint("api/goals/add")?;
        log::debug!("POST {url}");
        let req = self.http.post(url).json(&NewGoal { title });
        let resp = Self::with_auth(req, Some(token)).send().await?;
        let envelope: GoalsEnvelope = Self::read_json(resp).await?;
        unique_goals(envelope.goals)
    }

    async fn put_goal_complete(&self, token: &str, id: &str) -> Result<(), ApiError> {
        let mut url = self.endpoint("api/goals/complete")?;
        url.path_segments_mut()
            .map_err(|_| ApiError::malformed("backend url cannot carry a path"))?
            .pop_if_empty()
            .push(id);
        log::debug!("PUT {url}");
        let resp = Self::with_auth(self.http.put(url), Some(token)).send().await?;
        let _: serde_json::Value = Self::read_json(resp).await?;
        Ok(())
    }

    async fn signup(&self, request: &SignupRequest) -> Result<Option<String>, ApiError> {
        let url = self.endpoint("auth/signup")?;
        log::debug!("POST {url}");
        let resp = self.http.post(url).json(request).send().await?;
        let notice: ServerNotice = Self::read_json(resp).await?;
        Ok(notice.message)
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginReply, ApiError> {
        let url = self.endpoint("auth/login")?;
        log::debug!("POST {url}");
        let resp = self
            .http
            .post(url)
            .json(&LoginRequest { username, password })
            .send()
            .await?;
        let reply: LoginReply = Self::read_json(resp).await?;
        if reply.token.is_empty() {
            return Err(ApiError::malformed("token not found in response"));
        }
        Ok(reply)
    }
}
