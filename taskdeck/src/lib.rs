//! # TaskDeck
//!
//! Personal task tracking behind a small REST API.
//!
//! The crate has two layers:
//!
//! - [`model`] is the JSON contract shared by the server and the client. It is
//!   always compiled.
//! - With the default `store` feature: SeaORM [`entity`] definitions, the
//!   [`Store`] persistence gateway, [`AuthService`] and [`TaskService`].
//!
//! ## Quick start
//!
//! ```ignore
//! use taskdeck::{AuthService, AuthSettings, StoreBuilder, TaskService};
//!
//! let store = StoreBuilder::new("sqlite:./taskdeck.db?mode=rwc").build().await?;
//! store.migrate().await?;
//!
//! let auth = AuthService::new(store.inner().clone(), AuthSettings::new(secret));
//! let tasks = TaskService::new(store.inner().clone());
//!
//! let login = auth.login(LoginRequest { email, password }).await?;
//! let me = auth.authenticate(&login.token).await?;
//! let mine = tasks.list(&me).await?;
//! ```

pub mod model;

#[cfg(feature = "store")]
pub mod auth;
#[cfg(feature = "store")]
pub mod entity;
#[cfg(feature = "store")]
pub mod error;
#[cfg(feature = "store")]
pub mod store;
#[cfg(feature = "store")]
pub mod tasks;

pub use model::{
    Completion, ErrorBody, FieldError, LoginRequest, LoginResponse, PasswordChange, Priority,
    ProfileUpdate, RegisterRequest, Task, TaskDraft, TaskPatch, TaskPayload, UserSummary,
};

#[cfg(feature = "store")]
pub use auth::{AuthService, AuthSettings, HashCost, Identity};
#[cfg(feature = "store")]
pub use error::ServiceError;
#[cfg(feature = "store")]
pub use store::{SchemaBuilder, Store, StoreBuilder};
#[cfg(feature = "store")]
pub use tasks::TaskService;

// Re-export sea-orm for users of the library
#[cfg(feature = "store")]
pub use sea_orm;
