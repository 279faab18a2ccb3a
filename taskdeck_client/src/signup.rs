//! Account creation form.

use std::{sync::Arc, time::Duration};

use log::{error, info, warn};
use taskdeck::{RegisterRequest, UserSummary};
use tokio::{task::JoinHandle, time::sleep};

use crate::{api::AuthApi, error::ClientError, pending::InFlight};

pub const REGISTERED: &str = "Registration successful! Redirecting to login...";
pub const REGISTRATION_FAILED: &str = "An error occurred. Please try again.";
/// Pause between the success message and the switch to the login view.
pub const REDIRECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationState {
    Idle,
    Submitting,
    /// Registered; the switch to login is scheduled.
    Success(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered(UserSummary),
    Failed(String),
    Busy,
}

type SwitchMode = Arc<dyn Fn() + Send + Sync>;

pub struct RegistrationForm {
    pub fields: RegisterRequest,
    state: RegistrationState,
    on_switch_mode: SwitchMode,
    redirect: Option<JoinHandle<()>>,
}

impl RegistrationForm {
    /// `on_switch_mode` runs once, [`REDIRECT_DELAY`] after a successful
    /// registration.
    pub fn new(on_switch_mode: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            fields: RegisterRequest::default(),
            state: RegistrationState::Idle,
            on_switch_mode: Arc::new(on_switch_mode),
            redirect: None,
        }
    }

    pub fn state(&self) -> &RegistrationState {
        &self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == RegistrationState::Submitting
    }

    /// Text shown above the form, success or error.
    pub fn message(&self) -> Option<&str> {
        match &self.state {
            RegistrationState::Success(message) | RegistrationState::Error(message) => Some(message),
            RegistrationState::Idle | RegistrationState::Submitting => None,
        }
    }

    pub fn redirect_pending(&self) -> bool {
        self.redirect
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub async fn submit<A>(&mut self, api: &A) -> RegistrationOutcome
    where
        A: AuthApi + ?Sized,
    {
        if self.is_submitting() {
            return RegistrationOutcome::Busy;
        }
        self.cancel_redirect();

        let pending = InFlight::start(&mut self.state, RegistrationState::Submitting);
        let result = api.register(&self.fields).await;
        pending.complete();

        match result {
            Ok(user) => {
                info!("registered account {}", user.id);
                self.fields = RegisterRequest::default();
                self.state = RegistrationState::Success(REGISTERED.to_string());
                let switch = Arc::clone(&self.on_switch_mode);
                self.redirect = Some(tokio::spawn(async move {
                    sleep(REDIRECT_DELAY).await;
                    switch();
                }));
                RegistrationOutcome::Registered(user)
            }
            Err(err) => {
                if let ClientError::Network(cause) = &err {
                    error!("registration request failed: {cause}");
                } else {
                    warn!("registration failed: {err}");
                }
                let message = err.server_message().unwrap_or(REGISTRATION_FAILED).to_string();
                self.state = RegistrationState::Error(message.clone());
                RegistrationOutcome::Failed(message)
            }
        }
    }

    /// Return to a blank form and drop any scheduled redirect.
    pub fn reset(&mut self) {
        self.cancel_redirect();
        self.fields = RegisterRequest::default();
        self.state = RegistrationState::Idle;
    }

    fn cancel_redirect(&mut self) {
        if let Some(handle) = self.redirect.take() {
            handle.abort();
        }
    }
}

impl Drop for RegistrationForm {
    fn drop(&mut self) {
        self.cancel_redirect();
    }
}
