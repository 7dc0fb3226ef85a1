//! Sign-up, login and logout. Login is the only writer of the stored credentials.

use std::sync::Arc;

use crate::api::{CompanionApi, SignupRequest};
use crate::error::{AccountError, ApiError};
use crate::preferences::Credentials;
use crate::session::SessionContext;
use crate::ui::shell::Route;
use crate::utils::is_blank;

pub const SIGNUP_CONFIRMATION: &str = "Account created successfully. Please log in.";

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    fn validate(&self) -> Result<(), AccountError> {
        for (name, value) in [
            ("username", &self.username),
            ("email", &self.email),
            ("password", &self.password),
        ] {
            if is_blank(value) {
                return Err(AccountError::MissingField(name));
            }
        }
        if self.password != self.confirm_password {
            return Err(AccountError::PasswordMismatch);
        }
        Ok(())
    }
}

pub struct AccountService {
    api: Arc<dyn CompanionApi>,
    ctx: SessionContext,
}

impl AccountService {
    pub fn new(api: Arc<dyn CompanionApi>, ctx: SessionContext) -> Self {
        Self { api, ctx }
    }

    async fn call<T>(
        &self,
        call: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<T, AccountError> {
        match tokio::time::timeout(self.ctx.request_timeout(), call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(AccountError::Rejected(e)),
            Err(_) => Err(AccountError::Timeout),
        }
    }

    /// Registers the account and returns the text to show the user.
    pub async fn signup(&self, form: &SignupForm) -> Result<String, AccountError> {
        form.validate()?;
        let request = SignupRequest {
            username: form.username.trim().to_owned(),
            email: form.email.trim().to_owned(),
            password: form.password.clone(),
        };
        let message = self.call(self.api.signup(&request)).await.inspect_err(|e| {
            log::warn!("error creating account: {e}");
        })?;
        log::info!("account created for {}", request.username);
        Ok(message.unwrap_or_else(|| SIGNUP_CONFIRMATION.to_owned()))
    }

    /// Authenticates, stores the credentials and moves on to the home hub.
    pub async fn login(&self, username: &str, password: &str) -> Result<Credentials, AccountError> {
        if is_blank(username) {
            return Err(AccountError::MissingField("username"));
        }
        if password.is_empty() {
            return Err(AccountError::MissingField("password"));
        }
        let username = username.trim();
        let reply = self.call(self.api.login(username, password)).await.inspect_err(|e| {
            log::warn!("login failed for {username}: {e}");
        })?;

        let credentials = Credentials {
            token: reply.token,
            user_id: Some(reply.user_id),
            username: reply
                .username
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| username.to_owned()),
        };
        credentials.write(self.ctx.store().as_ref())?;
        log::info!("signed in as {}", credentials.username);
        self.ctx.navigate(Route::Main);
        Ok(credentials)
    }

    pub fn logout(&self) -> Result<(), AccountError> {
        Credentials::clear(self.ctx.store().as_ref())?;
        log::info!("signed out");
        self.ctx.navigate(Route::Login);
        Ok(())
    }
}
