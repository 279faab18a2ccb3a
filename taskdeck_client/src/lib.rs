//! # TaskDeck client
//!
//! The logic behind the TaskDeck web UI, independent of any rendering layer.
//!
//! - [`session`]: the explicit session context, shared by clone
//! - [`api`]: [`ApiClient`] over reqwest, plus the traits the components use
//! - [`modal`], [`signup`], [`login`], [`chrome`]: form and navbar state machines
//! - [`shell`]: [`AppShell`], which wires them together and owns navigation
//!
//! ```ignore
//! let session = SessionHandle::new();
//! let api = Arc::new(ApiClient::new("http://localhost:4000", session.clone()));
//! let mut app = AppShell::new(api, session);
//!
//! app.login_form_mut().fields = LoginRequest { email, password };
//! app.log_in().await;
//! app.open_new_task();
//! app.modal_mut().form_mut().title = "Buy milk".into();
//! app.save_task().await;
//! ```

pub mod api;
pub mod chrome;
pub mod error;
pub mod login;
pub mod modal;
mod pending;
pub mod session;
pub mod shell;
pub mod signup;

pub use api::{ApiClient, AuthApi, ProfileApi, TaskApi};
pub use chrome::{Avatar, MenuAction, SessionChrome};
pub use error::{ClientError, UNEXPECTED_ERROR};
pub use login::{LoginForm, LoginOutcome, LoginState};
pub use modal::{ModalState, SubmitOutcome, TaskForm, TaskModal};
pub use session::{Session, SessionEvent, SessionHandle, SignOutReason};
pub use shell::{AppShell, View};
pub use signup::{RegistrationForm, RegistrationOutcome, RegistrationState};
