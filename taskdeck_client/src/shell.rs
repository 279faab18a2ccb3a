//! Top-level controller of the web UI.
//!
//! [`AppShell`] owns the forms, the task list and the navigation bar, and
//! decides which [`View`] is on screen. Whenever the session ends, whether
//! through the menu, a failed login or a 401 from any call, the shell clears
//! the task list, dismisses the modal and falls back to [`View::Login`].

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use log::info;
use taskdeck::{Completion, Task, TaskPayload};
use tokio::sync::{
    broadcast::{self, error::TryRecvError},
    mpsc,
};

use crate::{
    api::{AuthApi, TaskApi},
    chrome::{MenuAction, SessionChrome},
    error::ClientError,
    login::{LoginForm, LoginOutcome},
    modal::{SubmitOutcome, TaskModal},
    session::{SessionEvent, SessionHandle, SignOutReason},
    signup::{RegistrationForm, RegistrationOutcome},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    SignUp,
    Dashboard,
    Profile,
}

pub struct AppShell<A> {
    api: Arc<A>,
    session: SessionHandle,
    events: broadcast::Receiver<SessionEvent>,
    navigation: mpsc::UnboundedReceiver<View>,
    view: View,
    tasks: Vec<Task>,
    modal: TaskModal,
    chrome: SessionChrome,
    login: LoginForm,
    signup: RegistrationForm,
}

impl<A> AppShell<A>
where
    A: AuthApi + TaskApi + 'static,
{
    pub fn new(api: Arc<A>, session: SessionHandle) -> Self {
        let (to_login, navigation) = mpsc::unbounded_channel();
        let signup = RegistrationForm::new(move || {
            let _ = to_login.send(View::Login);
        });
        let view = if session.is_active() {
            View::Dashboard
        } else {
            View::Login
        };

        Self {
            api,
            events: session.subscribe(),
            navigation,
            view,
            tasks: Vec::new(),
            modal: TaskModal::new(),
            chrome: SessionChrome::new(session.clone()),
            login: LoginForm::new(),
            signup,
            session,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn modal(&self) -> &TaskModal {
        &self.modal
    }

    pub fn modal_mut(&mut self) -> &mut TaskModal {
        &mut self.modal
    }

    pub fn chrome(&self) -> &SessionChrome {
        &self.chrome
    }

    pub fn chrome_mut(&mut self) -> &mut SessionChrome {
        &mut self.chrome
    }

    pub fn login_form(&self) -> &LoginForm {
        &self.login
    }

    pub fn login_form_mut(&mut self) -> &mut LoginForm {
        &mut self.login
    }

    pub fn signup_form(&self) -> &RegistrationForm {
        &self.signup
    }

    pub fn signup_form_mut(&mut self) -> &mut RegistrationForm {
        &mut self.signup
    }

    pub fn show_sign_up(&mut self) {
        self.signup.reset();
        self.view = View::SignUp;
    }

    pub fn show_login(&mut self) {
        self.view = View::Login;
    }

    pub async fn log_in(&mut self) -> LoginOutcome {
        let outcome = self.login.submit(self.api.as_ref(), &self.session).await;
        match &outcome {
            LoginOutcome::SignedIn(_) => {
                self.drain_events();
                self.view = View::Dashboard;
                // A failed refresh has already been handled.
                let _ = self.refresh_tasks().await;
            }
            LoginOutcome::Denied(_) => self.clear_session(SignOutReason::Unauthorized),
            LoginOutcome::Failed(_) | LoginOutcome::Busy => {}
        }
        outcome
    }

    pub async fn sign_up(&mut self) -> RegistrationOutcome {
        self.signup.submit(self.api.as_ref()).await
    }

    pub async fn refresh_tasks(&mut self) -> Result<(), ClientError> {
        match self.api.list_tasks().await {
            Ok(tasks) => {
                self.tasks = tasks;
                Ok(())
            }
            Err(err) => Err(self.handle(err)),
        }
    }

    pub fn open_new_task(&mut self) {
        if self.view == View::Dashboard {
            self.modal.open_new();
        }
    }

    /// Open the modal on a task from the list. `false` when no such task.
    pub fn edit_task(&mut self, id: &str) -> bool {
        match self.tasks.iter().find(|task| task.id == id) {
            Some(task) if self.view == View::Dashboard => {
                self.modal.open_existing(task);
                true
            }
            _ => false,
        }
    }

    pub async fn save_task(&mut self) -> SubmitOutcome {
        self.save_task_on(Local::now().date_naive()).await
    }

    /// [`save_task`](Self::save_task) with an explicit "today".
    pub async fn save_task_on(&mut self, today: NaiveDate) -> SubmitOutcome {
        let outcome = self.modal.submit(self.api.as_ref(), today).await;
        match &outcome {
            SubmitOutcome::Saved(task) => self.upsert(task.clone()),
            SubmitOutcome::LoggedOut => self.clear_session(SignOutReason::Unauthorized),
            _ => {}
        }
        outcome
    }

    pub async fn set_completed(&mut self, id: &str, done: bool) -> Result<(), ClientError> {
        let payload = TaskPayload {
            completed: Some(Completion::from_flag(done)),
            ..TaskPayload::default()
        };
        match self.api.update_task(id, &payload).await {
            Ok(task) => {
                self.upsert(task);
                Ok(())
            }
            Err(err) => Err(self.handle(err)),
        }
    }

    pub async fn delete_task(&mut self, id: &str) -> Result<(), ClientError> {
        match self.api.delete_task(id).await {
            Ok(()) => {
                self.tasks.retain(|task| task.id != id);
                Ok(())
            }
            Err(err) => Err(self.handle(err)),
        }
    }

    pub fn menu(&mut self, action: MenuAction) {
        match self.chrome.select(action) {
            MenuAction::ProfileSettings if self.session.is_active() => {
                self.modal.close();
                self.view = View::Profile;
            }
            MenuAction::ProfileSettings => {}
            MenuAction::LogOut => self.clear_session(SignOutReason::UserRequested),
        }
    }

    pub fn close_profile(&mut self) {
        if self.view == View::Profile {
            self.view = View::Dashboard;
        }
    }

    /// Apply session changes made elsewhere and any due redirect.
    pub fn sync(&mut self) {
        if self.drain_events() {
            self.clear_local();
        }
        while let Ok(view) = self.navigation.try_recv() {
            if view == View::Login && self.view == View::SignUp {
                self.signup.reset();
                self.view = View::Login;
            }
        }
    }

    /// Returns whether a sign-out was seen.
    fn drain_events(&mut self) -> bool {
        let mut signed_out = false;
        loop {
            match self.events.try_recv() {
                Ok(SessionEvent::SignedOut(_)) => signed_out = true,
                Ok(SessionEvent::SignedIn(_)) => signed_out = false,
                Err(TryRecvError::Lagged(_)) => signed_out = !self.session.is_active(),
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        signed_out
    }

    fn handle(&mut self, err: ClientError) -> ClientError {
        if err.is_unauthorized() {
            self.clear_session(SignOutReason::Unauthorized);
        }
        err
    }

    fn clear_session(&mut self, reason: SignOutReason) {
        self.session.end(reason);
        self.drain_events();
        self.clear_local();
    }

    fn clear_local(&mut self) {
        info!("signed out, returning to login");
        self.tasks.clear();
        self.modal.close();
        if self.view != View::SignUp {
            self.view = View::Login;
        }
    }

    fn upsert(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|existing| existing.id == task.id) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
    }
}
