//! Wire model shared by the server and the client.
//!
//! These types are the JSON contract of the REST API. They compile without the
//! `store` feature so the client never pulls in the database stack.
//!
//! Task status has exactly one in-memory form, [`Completion`]. Older clients send
//! a JSON boolean, newer ones the `"Yes"`/`"No"` strings; both are accepted on
//! input and only the string form is ever emitted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A field-level problem with an inbound payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{0} cannot be blank")]
    Blank(&'static str),

    #[error("Invalid priority: {0}")]
    Priority(String),

    #[error("Invalid completion status: {0}")]
    Completion(String),

    #[error("Invalid date: {0}")]
    Date(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FieldError::Priority(s.to_string()))
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

/// Whether a task is done, displayed as `"Yes"` / `"No"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Completion {
    Yes,
    #[default]
    No,
}

impl Completion {
    pub fn from_flag(done: bool) -> Self {
        if done { Completion::Yes } else { Completion::No }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Completion::Yes)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Completion::Yes => "Yes",
            Completion::No => "No",
        }
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Completion {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" => Ok(Completion::Yes),
            "no" | "false" => Ok(Completion::No),
            _ => Err(FieldError::Completion(s.to_string())),
        }
    }
}

impl Serialize for Completion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Completion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Flag(done) => Ok(Completion::from_flag(done)),
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Parse a calendar date from `YYYY-MM-DD` or from an ISO datetime, keeping only
/// its date part.
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, FieldError> {
    let trimmed = raw.trim();
    let date_part = trimmed.split_once('T').map_or(trimmed, |(date, _)| date);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| FieldError::Date(raw.to_string()))
}

pub mod calendar_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_calendar_date(&raw).map_err(serde::de::Error::custom)
    }
}

/// A stored task as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(with = "calendar_date")]
    pub due_date: NaiveDate,
    #[serde(default)]
    pub completed: Completion,
    pub owner: String,
    pub created_at: DateTime<Utc>,
}

/// Validated fields for creating a task (or fully replacing one from a form).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    #[serde(with = "calendar_date")]
    pub due_date: NaiveDate,
    pub completed: Completion,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, due_date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: Priority::default(),
            due_date,
            completed: Completion::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = non_blank(Some(description.into()));
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_completed(mut self, completed: Completion) -> Self {
        self.completed = completed;
        self
    }

    /// Checks the rules that typing alone cannot express.
    pub fn validate(&self) -> Result<(), FieldError> {
        if self.title.trim().is_empty() {
            return Err(FieldError::Missing("Title"));
        }
        Ok(())
    }
}

/// Inbound task body. Every field is optional so that missing fields surface
/// as validation errors rather than as JSON decoding failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<Completion>,
}

/// Partial update of a task. `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
    pub completed: Option<Completion>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }
}

impl TaskPayload {
    /// Apply the creation rules: `title` and `dueDate` are required, everything
    /// else falls back to its default.
    pub fn into_draft(self) -> Result<TaskDraft, FieldError> {
        let title = non_blank(self.title).ok_or(FieldError::Missing("Title"))?;
        let due_date = non_blank(self.due_date).ok_or(FieldError::Missing("Due date"))?;

        Ok(TaskDraft {
            title,
            description: non_blank(self.description),
            priority: self.priority.unwrap_or_default(),
            due_date: parse_calendar_date(&due_date)?,
            completed: self.completed.unwrap_or_default(),
        })
    }

    pub fn into_patch(self) -> Result<TaskPatch, FieldError> {
        let title = match self.title {
            Some(title) => Some(non_blank(Some(title)).ok_or(FieldError::Blank("Title"))?),
            None => None,
        };
        let due_date = match self.due_date {
            Some(raw) if raw.trim().is_empty() => return Err(FieldError::Blank("Due date")),
            Some(raw) => Some(parse_calendar_date(&raw)?),
            None => None,
        };

        Ok(TaskPatch {
            title,
            description: self.description.map(|d| non_blank(Some(d))),
            priority: self.priority,
            due_date,
            completed: self.completed,
        })
    }
}

impl From<TaskDraft> for TaskPayload {
    fn from(draft: TaskDraft) -> Self {
        Self {
            title: Some(draft.title),
            description: Some(draft.description.unwrap_or_default()),
            priority: Some(draft.priority),
            due_date: Some(draft.due_date.format("%Y-%m-%d").to_string()),
            completed: Some(draft.completed),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Public view of an account; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// Body of every non-success response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}
