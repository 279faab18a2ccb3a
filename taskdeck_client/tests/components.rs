use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use taskdeck::{
    Completion, LoginRequest, LoginResponse, Priority, RegisterRequest, Task, TaskPayload,
    UserSummary,
};
use taskdeck_client::{
    ApiClient, AppShell, AuthApi, ClientError, LoginForm, LoginOutcome, LoginState, MenuAction,
    ModalState, RegistrationForm, RegistrationOutcome, RegistrationState, Session, SessionHandle,
    SignOutReason, SubmitOutcome, TaskApi, TaskModal, UNEXPECTED_ERROR, View,
    modal::PAST_DUE_DATE,
    signup::{REDIRECT_DELAY, REGISTERED, REGISTRATION_FAILED},
};
use tokio::time::timeout;

#[derive(Clone, Copy)]
enum Failure {
    Unauthorized,
    Rejected(u16, Option<&'static str>),
}

impl Failure {
    fn into_error(self) -> ClientError {
        match self {
            Failure::Unauthorized => ClientError::Unauthorized(None),
            Failure::Rejected(status, message) => ClientError::Rejected {
                status,
                message: message.map(str::to_string),
            },
        }
    }
}

/// In-memory stand-in for the server that follows the same session rules as
/// `ApiClient`: no token fails before counting a request, and a 401 ends
/// the session.
struct FakeApi {
    session: SessionHandle,
    tasks: Mutex<Vec<Task>>,
    requests: AtomicUsize,
    fail_next: Mutex<Option<Failure>>,
}

impl FakeApi {
    fn new(session: SessionHandle) -> Arc<Self> {
        Arc::new(Self {
            session,
            tasks: Mutex::new(Vec::new()),
            requests: AtomicUsize::new(0),
            fail_next: Mutex::new(None),
        })
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn fail_next(&self, failure: Failure) {
        *self.fail_next.lock().unwrap() = Some(failure);
    }

    fn seed(&self, task: Task) {
        self.tasks.lock().unwrap().push(task);
    }

    fn authorized(&self) -> Result<(), ClientError> {
        if self.session.token().is_none() {
            return Err(ClientError::NoCredentials);
        }
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.fail_next.lock().unwrap().take() {
            if matches!(failure, Failure::Unauthorized) {
                self.session.end(SignOutReason::Unauthorized);
            }
            return Err(failure.into_error());
        }
        Ok(())
    }
}

#[async_trait]
impl AuthApi for FakeApi {
    async fn register(&self, request: &RegisterRequest) -> Result<UserSummary, ClientError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.fail_next.lock().unwrap().take() {
            return Err(failure.into_error());
        }
        Ok(UserSummary {
            id: "u-new".into(),
            name: request.name.clone(),
            email: request.email.clone(),
            avatar: None,
        })
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.fail_next.lock().unwrap().take() {
            return Err(failure.into_error());
        }
        if request.password != "pw123456" {
            self.session.end(SignOutReason::Unauthorized);
            return Err(ClientError::Unauthorized(Some("Invalid credentials".into())));
        }
        Ok(LoginResponse {
            token: "token-1".into(),
            user: ann(),
        })
    }
}

#[async_trait]
impl TaskApi for FakeApi {
    async fn list_tasks(&self) -> Result<Vec<Task>, ClientError> {
        self.authorized()?;
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn create_task(&self, payload: &TaskPayload) -> Result<Task, ClientError> {
        self.authorized()?;
        let draft = payload.clone().into_draft().map_err(|err| ClientError::Rejected {
            status: 400,
            message: Some(err.to_string()),
        })?;
        let mut tasks = self.tasks.lock().unwrap();
        let task = Task {
            id: format!("t{}", tasks.len() + 1),
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            due_date: draft.due_date,
            completed: draft.completed,
            owner: "u1".into(),
            created_at: Utc::now(),
        };
        tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: &str, payload: &TaskPayload) -> Result<Task, ClientError> {
        self.authorized()?;
        let patch = payload.clone().into_patch().map_err(|err| ClientError::Rejected {
            status: 400,
            message: Some(err.to_string()),
        })?;
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(ClientError::NotFound(None))?;
        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }
        Ok(task.clone())
    }

    async fn delete_task(&self, id: &str) -> Result<(), ClientError> {
        self.authorized()?;
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|task| task.id != id);
        if tasks.len() == before {
            return Err(ClientError::NotFound(None));
        }
        Ok(())
    }
}

/// A server that accepts the connection and never answers.
struct Hanging;

#[async_trait]
impl AuthApi for Hanging {
    async fn register(&self, _: &RegisterRequest) -> Result<UserSummary, ClientError> {
        std::future::pending().await
    }

    async fn login(&self, _: &LoginRequest) -> Result<LoginResponse, ClientError> {
        std::future::pending().await
    }
}

#[async_trait]
impl TaskApi for Hanging {
    async fn list_tasks(&self) -> Result<Vec<Task>, ClientError> {
        std::future::pending().await
    }

    async fn create_task(&self, _: &TaskPayload) -> Result<Task, ClientError> {
        std::future::pending().await
    }

    async fn update_task(&self, _: &str, _: &TaskPayload) -> Result<Task, ClientError> {
        std::future::pending().await
    }

    async fn delete_task(&self, _: &str) -> Result<(), ClientError> {
        std::future::pending().await
    }
}

const GIVE_UP: Duration = Duration::from_secs(30);

fn ann() -> UserSummary {
    UserSummary {
        id: "u1".into(),
        name: "Ann".into(),
        email: "ann@x.io".into(),
        avatar: None,
    }
}

fn day(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

fn signed_in_shell() -> (AppShell<FakeApi>, Arc<FakeApi>, SessionHandle) {
    let session = SessionHandle::new();
    session.begin(Session {
        token: "token-1".into(),
        user: ann(),
    });
    let api = FakeApi::new(session.clone());
    (AppShell::new(Arc::clone(&api), session.clone()), api, session)
}

fn stored_task(id: &str, completed: Completion) -> Task {
    Task {
        id: id.into(),
        title: "Write report".into(),
        description: Some("Q3 numbers".into()),
        priority: Priority::High,
        due_date: day("2031-03-01"),
        completed,
        owner: "u1".into(),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_past_due_date_never_reaches_the_api() {
    let (mut app, api, _) = signed_in_shell();
    app.open_new_task();
    let form = app.modal_mut().form_mut();
    form.title = "Buy milk".into();
    form.due_date = "2030-06-14".into();

    let outcome = app.save_task_on(day("2030-06-15")).await;

    assert_eq!(outcome, SubmitOutcome::Invalid(PAST_DUE_DATE.to_string()));
    assert_eq!(app.modal().state(), &ModalState::Error(PAST_DUE_DATE.to_string()));
    assert_eq!(app.modal().error(), Some("Due date cannot be in the past."));
    assert_eq!(api.requests(), 0);
}

#[tokio::test]
async fn test_create_closes_modal_and_lists_task() {
    let (mut app, api, _) = signed_in_shell();
    app.open_new_task();
    let form = app.modal_mut().form_mut();
    form.title = "Buy milk".into();
    form.priority = Priority::Medium;
    form.due_date = "2099-01-01".into();

    let SubmitOutcome::Saved(task) = app.save_task_on(day("2030-06-15")).await else {
        panic!("task should have been saved");
    };

    assert_eq!(task.title, "Buy milk");
    assert_eq!(task.priority, Priority::Medium);
    assert_eq!(task.due_date, day("2099-01-01"));
    assert_eq!(task.completed, Completion::No);
    assert!(!app.modal().is_open());
    assert_eq!(app.tasks(), [task]);
    assert_eq!(api.requests(), 1);
}

#[tokio::test]
async fn test_editing_shows_stored_values_and_updates_in_place() {
    let (mut app, api, _) = signed_in_shell();
    api.seed(stored_task("t1", Completion::Yes));
    app.refresh_tasks().await.unwrap();

    assert!(app.edit_task("t1"));
    let form = app.modal().form();
    assert_eq!(app.modal().state(), &ModalState::EditingExisting);
    assert_eq!(form.title, "Write report");
    assert_eq!(form.description, "Q3 numbers");
    assert_eq!(form.due_date, "2031-03-01");
    assert_eq!(form.completed_label(), "Yes");

    app.modal_mut().form_mut().title = "Write final report".into();
    let outcome = app.save_task_on(day("2030-06-15")).await;
    assert!(matches!(outcome, SubmitOutcome::Saved(ref task) if task.id == "t1"));
    assert_eq!(app.tasks().len(), 1);
    assert_eq!(app.tasks()[0].title, "Write final report");
}

#[tokio::test]
async fn test_missing_token_fails_fast() {
    let session = SessionHandle::new();
    let api = FakeApi::new(session.clone());
    let mut modal = TaskModal::new();
    modal.open_new();
    modal.form_mut().title = "Buy milk".into();
    modal.form_mut().due_date = "2099-01-01".into();

    let outcome = modal.submit(api.as_ref(), day("2030-06-15")).await;

    assert_eq!(outcome, SubmitOutcome::NoCredentials);
    assert_eq!(modal.error(), Some("No auth token found"));
    assert_eq!(api.requests(), 0);
}

#[tokio::test]
async fn test_unauthorized_save_logs_out() {
    let (mut app, api, session) = signed_in_shell();
    api.seed(stored_task("t1", Completion::No));
    app.refresh_tasks().await.unwrap();
    app.open_new_task();
    app.modal_mut().form_mut().title = "Buy milk".into();
    app.modal_mut().form_mut().due_date = "2099-01-01".into();
    api.fail_next(Failure::Unauthorized);

    let outcome = app.save_task_on(day("2030-06-15")).await;

    assert_eq!(outcome, SubmitOutcome::LoggedOut);
    assert!(!session.is_active());
    assert!(!app.modal().is_open());
    assert!(app.tasks().is_empty());
    assert_eq!(app.view(), View::Login);
}

#[tokio::test]
async fn test_server_rejection_stays_in_form() {
    let (mut app, api, _) = signed_in_shell();
    app.open_new_task();
    app.modal_mut().form_mut().title = "Buy milk".into();
    app.modal_mut().form_mut().due_date = "2099-01-01".into();

    api.fail_next(Failure::Rejected(400, Some("Title is required")));
    let outcome = app.save_task_on(day("2030-06-15")).await;
    assert_eq!(outcome, SubmitOutcome::Failed("Title is required".into()));
    assert!(app.modal().is_open());

    api.fail_next(Failure::Rejected(500, None));
    let outcome = app.save_task_on(day("2030-06-15")).await;
    assert_eq!(outcome, SubmitOutcome::Failed("Failed to save task".into()));
    assert_eq!(app.view(), View::Dashboard);
}

#[tokio::test]
async fn test_wrong_password_clears_session_and_dismisses_modal() {
    let (mut app, api, session) = signed_in_shell();
    api.seed(stored_task("t1", Completion::No));
    app.refresh_tasks().await.unwrap();
    assert!(app.edit_task("t1"));

    app.login_form_mut().fields = LoginRequest {
        email: "ann@x.io".into(),
        password: "wrong".into(),
    };
    let outcome = app.log_in().await;

    assert_eq!(outcome, LoginOutcome::Denied("Invalid credentials".into()));
    assert!(!session.is_active());
    assert!(!app.modal().is_open());
    assert!(app.tasks().is_empty());
    assert_eq!(app.view(), View::Login);
    assert_eq!(app.login_form().error(), Some("Invalid credentials"));
    assert!(app.login_form().fields.password.is_empty());
}

#[tokio::test]
async fn test_login_server_fault_keeps_session() {
    let (mut app, api, session) = signed_in_shell();
    api.seed(stored_task("t1", Completion::No));
    app.refresh_tasks().await.unwrap();
    assert!(app.edit_task("t1"));

    app.login_form_mut().fields = LoginRequest {
        email: "ann@x.io".into(),
        password: "pw123456".into(),
    };
    api.fail_next(Failure::Rejected(500, Some("Database unavailable")));
    let outcome = app.log_in().await;

    assert_eq!(outcome, LoginOutcome::Failed("Database unavailable".into()));
    assert!(session.is_active());
    assert!(app.modal().is_open());
    assert_eq!(app.tasks().len(), 1);
    assert_eq!(app.login_form().error(), Some("Database unavailable"));
}

#[tokio::test]
async fn test_unreachable_server_is_an_unexpected_error() {
    let session = SessionHandle::new();
    let api = ApiClient::new("http://127.0.0.1:9", session.clone());
    let mut form = LoginForm::new();
    form.fields = LoginRequest {
        email: "ann@x.io".into(),
        password: "pw123456".into(),
    };

    let outcome = form.submit(&api, &session).await;

    assert_eq!(outcome, LoginOutcome::Failed(UNEXPECTED_ERROR.into()));
    assert_eq!(form.error(), Some("An unexpected error occurred"));
    assert!(!session.is_active());
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_login_can_be_retried() {
    let session = SessionHandle::new();
    let mut form = LoginForm::new();
    form.fields = LoginRequest {
        email: "ann@x.io".into(),
        password: "pw123456".into(),
    };

    let abandoned = timeout(GIVE_UP, form.submit(&Hanging, &session)).await;
    assert!(abandoned.is_err());
    assert_eq!(form.state(), &LoginState::Idle);

    let api = FakeApi::new(session.clone());
    let outcome = form.submit(api.as_ref(), &session).await;
    assert!(matches!(outcome, LoginOutcome::SignedIn(_)));
    assert!(session.is_active());
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_registration_can_be_retried() {
    let api = FakeApi::new(SessionHandle::new());
    let mut form = RegistrationForm::new(|| {});
    form.fields = RegisterRequest {
        name: "Ann".into(),
        email: "ann@x.io".into(),
        password: "pw123456".into(),
    };
    api.fail_next(Failure::Rejected(500, None));
    form.submit(api.as_ref()).await;

    let abandoned = timeout(GIVE_UP, form.submit(&Hanging)).await;
    assert!(abandoned.is_err());
    assert!(!form.is_submitting());
    assert_eq!(form.state(), &RegistrationState::Error(REGISTRATION_FAILED.into()));

    let outcome = form.submit(api.as_ref()).await;
    assert!(matches!(outcome, RegistrationOutcome::Registered(_)));
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_save_can_be_retried() {
    let session = SessionHandle::new();
    session.begin(Session {
        token: "token-1".into(),
        user: ann(),
    });
    let mut modal = TaskModal::new();
    modal.open_new();
    modal.form_mut().title = "Buy milk".into();
    modal.form_mut().due_date = "2099-01-01".into();

    let abandoned = timeout(GIVE_UP, modal.submit(&Hanging, day("2030-06-15"))).await;
    assert!(abandoned.is_err());
    assert_eq!(modal.state(), &ModalState::EditingNew);
    assert!(!modal.is_submitting());

    let api = FakeApi::new(session);
    let outcome = modal.submit(api.as_ref(), day("2030-06-15")).await;
    assert!(matches!(outcome, SubmitOutcome::Saved(ref task) if task.title == "Buy milk"));
    assert!(!modal.is_open());
}

#[tokio::test]
async fn test_login_link_leaves_sign_up() {
    let session = SessionHandle::new();
    let mut app = AppShell::new(FakeApi::new(session.clone()), session);

    app.show_sign_up();
    assert_eq!(app.view(), View::SignUp);
    app.show_login();
    assert_eq!(app.view(), View::Login);
}

#[tokio::test]
async fn test_login_loads_dashboard() {
    let session = SessionHandle::new();
    let api = FakeApi::new(session.clone());
    api.seed(stored_task("t1", Completion::No));
    let mut app = AppShell::new(Arc::clone(&api), session.clone());
    assert_eq!(app.view(), View::Login);
    assert_eq!(app.chrome().display_name(), "Guest User");

    app.login_form_mut().fields = LoginRequest {
        email: "ann@x.io".into(),
        password: "pw123456".into(),
    };
    let outcome = app.log_in().await;

    assert!(matches!(outcome, LoginOutcome::SignedIn(_)));
    assert_eq!(app.view(), View::Dashboard);
    assert_eq!(app.tasks().len(), 1);
    assert_eq!(app.chrome().display_name(), "Ann");
}

#[tokio::test]
async fn test_menu_actions() {
    let (mut app, _, session) = signed_in_shell();

    app.chrome_mut().toggle_menu();
    app.menu(MenuAction::ProfileSettings);
    assert_eq!(app.view(), View::Profile);
    assert!(!app.chrome().is_menu_open());
    app.close_profile();
    assert_eq!(app.view(), View::Dashboard);

    app.chrome_mut().toggle_menu();
    app.menu(MenuAction::LogOut);
    assert!(!session.is_active());
    assert_eq!(app.view(), View::Login);
}

#[tokio::test]
async fn test_session_ended_elsewhere_is_picked_up_by_sync() {
    let (mut app, api, session) = signed_in_shell();
    api.seed(stored_task("t1", Completion::No));
    app.refresh_tasks().await.unwrap();
    app.open_new_task();

    session.end(SignOutReason::UserRequested);
    app.sync();

    assert!(app.tasks().is_empty());
    assert!(!app.modal().is_open());
    assert_eq!(app.view(), View::Login);
}

#[tokio::test]
async fn test_toggle_and_delete() {
    let (mut app, api, _) = signed_in_shell();
    api.seed(stored_task("t1", Completion::No));
    app.refresh_tasks().await.unwrap();

    app.set_completed("t1", true).await.unwrap();
    assert_eq!(app.tasks()[0].completed, Completion::Yes);

    app.delete_task("t1").await.unwrap();
    assert!(app.tasks().is_empty());
    assert!(matches!(app.delete_task("t1").await, Err(ClientError::NotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn test_registration_redirects_after_delay() {
    let session = SessionHandle::new();
    let api = FakeApi::new(session);
    let switched = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&switched);
    let mut form = RegistrationForm::new(move || flag.store(true, Ordering::SeqCst));
    form.fields = RegisterRequest {
        name: "Ann".into(),
        email: "ann@x.io".into(),
        password: "pw123456".into(),
    };

    let outcome = form.submit(api.as_ref()).await;

    assert!(matches!(outcome, RegistrationOutcome::Registered(ref user) if user.name == "Ann"));
    assert_eq!(form.message(), Some(REGISTERED));
    assert_eq!(form.fields, RegisterRequest::default());
    assert!(form.redirect_pending());

    tokio::time::sleep(REDIRECT_DELAY - Duration::from_millis(1)).await;
    assert!(!switched.load(Ordering::SeqCst));

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert!(switched.load(Ordering::SeqCst));
    assert!(!form.redirect_pending());
}

#[tokio::test]
async fn test_registration_failure_messages() {
    let api = FakeApi::new(SessionHandle::new());
    let mut form = RegistrationForm::new(|| {});
    form.fields.email = "ann@x.io".into();

    api.fail_next(Failure::Rejected(409, Some("An account with email ann@x.io already exists")));
    let outcome = form.submit(api.as_ref()).await;
    assert_eq!(
        outcome,
        RegistrationOutcome::Failed("An account with email ann@x.io already exists".into())
    );
    assert_eq!(form.fields.email, "ann@x.io");

    api.fail_next(Failure::Rejected(500, None));
    form.submit(api.as_ref()).await;
    assert_eq!(form.message(), Some(REGISTRATION_FAILED));
    assert!(!form.redirect_pending());
}

#[tokio::test(start_paused = true)]
async fn test_shell_returns_to_login_after_sign_up() {
    let session = SessionHandle::new();
    let api = FakeApi::new(session.clone());
    let mut app = AppShell::new(api, session);

    app.show_sign_up();
    app.signup_form_mut().fields = RegisterRequest {
        name: "Ann".into(),
        email: "ann@x.io".into(),
        password: "pw123456".into(),
    };
    app.sign_up().await;
    app.sync();
    assert_eq!(app.view(), View::SignUp);

    tokio::time::sleep(REDIRECT_DELAY + Duration::from_millis(1)).await;
    app.sync();
    assert_eq!(app.view(), View::Login);
}
