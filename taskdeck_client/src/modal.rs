//! Create/edit dialog for a single task.
//!
//! ```text
//!            open_new            submit (valid)
//! Closed ───────────────▶ EditingNew ───────────▶ Submitting ──▶ Closed (Saved)
//!    │      open_existing          ▲                    │
//!    └───────────────▶ EditingExisting                  ├──▶ Closed (LoggedOut)
//!                                  │ submit (invalid)   │
//!                                  ▼                    ▼
//!                                Error ◀────────────────┘ (Failed / NoCredentials)
//! ```
//!
//! The form stays editable in `Error`; submitting again retries.

use chrono::NaiveDate;
use log::{error, warn};
use taskdeck::{Completion, Priority, Task, TaskDraft, TaskPayload, model::parse_calendar_date};

use crate::{
    api::TaskApi,
    error::{ClientError, UNEXPECTED_ERROR},
    pending::InFlight,
};

pub const PAST_DUE_DATE: &str = "Due date cannot be in the past.";
pub const TITLE_REQUIRED: &str = "Title is required.";
pub const DUE_DATE_REQUIRED: &str = "Due date is required.";
const SAVE_FAILED: &str = "Failed to save task";

/// Field values as the user edits them. `due_date` is the raw `YYYY-MM-DD`
/// text of a date input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: String,
    pub completed: Completion,
}

impl TaskForm {
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            priority: task.priority,
            due_date: task.due_date.format("%Y-%m-%d").to_string(),
            completed: task.completed,
        }
    }

    /// The "Yes"/"No" shown in the status selector.
    pub fn completed_label(&self) -> &'static str {
        self.completed.as_str()
    }

    /// Local checks, run before anything is sent.
    pub fn validate(&self, today: NaiveDate) -> Result<TaskPayload, String> {
        if self.title.trim().is_empty() {
            return Err(TITLE_REQUIRED.to_string());
        }
        if self.due_date.trim().is_empty() {
            return Err(DUE_DATE_REQUIRED.to_string());
        }
        let due_date = parse_calendar_date(&self.due_date).map_err(|err| err.to_string())?;
        if due_date < today {
            return Err(PAST_DUE_DATE.to_string());
        }

        let draft = TaskDraft::new(self.title.trim(), due_date)
            .with_description(self.description.clone())
            .with_priority(self.priority)
            .with_completed(self.completed);
        Ok(draft.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalState {
    Closed,
    EditingNew,
    EditingExisting,
    Submitting,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Stored by the server; the modal closed.
    Saved(Task),
    /// The server rejected the token; the session is gone and the modal closed.
    LoggedOut,
    /// No token in the session; nothing was sent.
    NoCredentials,
    Failed(String),
    /// Rejected locally; nothing was sent.
    Invalid(String),
    /// A submission is already in flight.
    Busy,
}

#[derive(Debug, Clone)]
pub struct TaskModal {
    state: ModalState,
    editing: Option<String>,
    form: TaskForm,
}

impl Default for TaskModal {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskModal {
    pub fn new() -> Self {
        Self {
            state: ModalState::Closed,
            editing: None,
            form: TaskForm::default(),
        }
    }

    pub fn open_new(&mut self) {
        self.editing = None;
        self.form = TaskForm::default();
        self.state = ModalState::EditingNew;
    }

    pub fn open_existing(&mut self, task: &Task) {
        self.editing = Some(task.id.clone());
        self.form = TaskForm::from_task(task);
        self.state = ModalState::EditingExisting;
    }

    pub fn close(&mut self) {
        self.state = ModalState::Closed;
        self.editing = None;
    }

    pub fn state(&self) -> &ModalState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != ModalState::Closed
    }

    pub fn is_submitting(&self) -> bool {
        self.state == ModalState::Submitting
    }

    /// Id of the task being edited, `None` when creating.
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            ModalState::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn form(&self) -> &TaskForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut TaskForm {
        &mut self.form
    }

    /// Validate locally, then create or update depending on whether a task is
    /// being edited.
    pub async fn submit<A>(&mut self, api: &A, today: NaiveDate) -> SubmitOutcome
    where
        A: TaskApi + ?Sized,
    {
        match self.state {
            ModalState::Closed => return SubmitOutcome::Invalid("No task is being edited.".to_string()),
            ModalState::Submitting => return SubmitOutcome::Busy,
            _ => {}
        }

        let payload = match self.form.validate(today) {
            Ok(payload) => payload,
            Err(message) => {
                self.state = ModalState::Error(message.clone());
                return SubmitOutcome::Invalid(message);
            }
        };

        let editing = self.editing.clone();
        let pending = InFlight::start(&mut self.state, ModalState::Submitting);
        let result = match editing {
            Some(id) => api.update_task(&id, &payload).await,
            None => api.create_task(&payload).await,
        };
        pending.complete();

        match result {
            Ok(task) => {
                self.close();
                SubmitOutcome::Saved(task)
            }
            Err(ClientError::Unauthorized(_)) => {
                self.close();
                SubmitOutcome::LoggedOut
            }
            Err(ClientError::NoCredentials) => {
                self.state = ModalState::Error(ClientError::NoCredentials.to_string());
                SubmitOutcome::NoCredentials
            }
            Err(err) => {
                let message = match &err {
                    ClientError::Network(cause) => {
                        error!("saving task failed: {cause}");
                        UNEXPECTED_ERROR.to_string()
                    }
                    other => {
                        warn!("server refused task: {other}");
                        other.server_message().unwrap_or(SAVE_FAILED).to_string()
                    }
                };
                self.state = ModalState::Error(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }
}
