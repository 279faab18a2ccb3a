use std::sync::Arc;

use taskdeck::{AuthService, AuthSettings, Store, TaskService};

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub tasks: Arc<TaskService>,
}

impl AppState {
    pub fn new(store: &Store, settings: AuthSettings) -> Self {
        Self {
            auth: Arc::new(AuthService::new(store.inner().clone(), settings)),
            tasks: Arc::new(TaskService::new(store.inner().clone())),
        }
    }
}
