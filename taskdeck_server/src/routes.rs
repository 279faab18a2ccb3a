//! Route table.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | POST | /api/user/register | `user::register` |
//! | POST | /api/user/login | `user::login` |
//! | GET | /api/user/me | `user::me` |
//! | PUT | /api/user/profile | `user::update_profile` |
//! | PUT | /api/user/password | `user::change_password` |
//! | GET, POST | /api/tasks | `tasks::list`, `tasks::create` |
//! | GET, PUT, DELETE | /api/tasks/:id | `tasks::get_one`, `tasks::update`, `tasks::delete` |
//! | GET | /health | `health` |
//!
//! The browser client shipped before this server appended `/gp` to every task
//! URL; those paths stay routed to the same handlers.

use std::time::Duration;

use axum::{
    Json, Router,
    http::{
        Method, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::json;
use taskdeck::ErrorBody;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    handlers::{tasks, user},
    state::AppState,
};

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(health))
        .route("/api/user/register", post(user::register))
        .route("/api/user/login", post(user::login))
        .route("/api/user/me", get(user::me))
        .route("/api/user/profile", put(user::update_profile))
        .route("/api/user/password", put(user::change_password))
        .route("/api/tasks", get(tasks::list).post(tasks::create))
        .route("/api/tasks/gp", get(tasks::list).post(tasks::create))
        .route(
            "/api/tasks/:id",
            get(tasks::get_one).put(tasks::update).delete(tasks::delete),
        )
        .route(
            "/api/tasks/:id/gp",
            get(tasks::get_one).put(tasks::update).delete(tasks::delete),
        )
        .fallback(not_found)
        .layer(cors)
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            message: "Route not found".to_string(),
        }),
    )
}
