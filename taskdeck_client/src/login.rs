use log::{error, warn};
use taskdeck::{LoginRequest, UserSummary};

use crate::{
    api::AuthApi,
    error::{ClientError, UNEXPECTED_ERROR},
    pending::InFlight,
    session::{Session, SessionHandle},
};

pub const LOGIN_FAILED: &str = "Invalid credentials";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    Idle,
    Submitting,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    SignedIn(UserSummary),
    /// The server rejected the credentials (401).
    Denied(String),
    /// Anything else: a server fault or no answer at all.
    Failed(String),
    Busy,
}

#[derive(Debug, Clone)]
pub struct LoginForm {
    pub fields: LoginRequest,
    state: LoginState,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginForm {
    pub fn new() -> Self {
        Self {
            fields: LoginRequest::default(),
            state: LoginState::Idle,
        }
    }

    pub fn state(&self) -> &LoginState {
        &self.state
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            LoginState::Error(message) => Some(message),
            _ => None,
        }
    }

    /// On success the token and user are handed to `session`; the password
    /// field is cleared either way.
    pub async fn submit<A>(&mut self, api: &A, session: &SessionHandle) -> LoginOutcome
    where
        A: AuthApi + ?Sized,
    {
        if self.state == LoginState::Submitting {
            return LoginOutcome::Busy;
        }

        let pending = InFlight::start(&mut self.state, LoginState::Submitting);
        let result = api.login(&self.fields).await;
        pending.complete();
        self.fields.password.clear();

        match result {
            Ok(response) => {
                let user = response.user.clone();
                session.begin(Session {
                    token: response.token,
                    user: response.user,
                });
                self.state = LoginState::Idle;
                LoginOutcome::SignedIn(user)
            }
            Err(ClientError::Network(cause)) => {
                error!("login request failed: {cause}");
                self.state = LoginState::Error(UNEXPECTED_ERROR.to_string());
                LoginOutcome::Failed(UNEXPECTED_ERROR.to_string())
            }
            Err(err) => {
                warn!("login failed: {err}");
                let message = err.server_message().unwrap_or(LOGIN_FAILED).to_string();
                self.state = LoginState::Error(message.clone());
                if err.is_unauthorized() {
                    LoginOutcome::Denied(message)
                } else {
                    LoginOutcome::Failed(message)
                }
            }
        }
    }
}
